//! Rendering of API results for the terminal.

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use std::io::Write;

use crate::api::{Datacenter, Device, Room, User, Workspace, WorkspaceRoom};

#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned columns for people
    #[default]
    Text,
    /// Pretty-printed JSON for scripts
    Json,
}

/// A resource that can be shown as a table row.
pub trait Tabular {
    const COLUMNS: &'static [&'static str];

    fn row(&self) -> Vec<String>;
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

impl Tabular for Datacenter {
    const COLUMNS: &'static [&'static str] =
        &["id", "vendor", "vendor_name", "region", "location"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.vendor.clone(),
            opt(&self.vendor_name),
            self.region.clone(),
            self.location.clone(),
        ]
    }
}

impl Tabular for Room {
    const COLUMNS: &'static [&'static str] = &["id", "datacenter_id", "az", "alias", "vendor_name"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.datacenter_id.to_string(),
            self.az.clone(),
            opt(&self.alias),
            opt(&self.vendor_name),
        ]
    }
}

impl Tabular for Workspace {
    const COLUMNS: &'static [&'static str] = &["id", "name", "role", "description"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            opt(&self.role),
            opt(&self.description),
        ]
    }
}

impl Tabular for WorkspaceRoom {
    const COLUMNS: &'static [&'static str] = &["id", "az", "alias", "vendor_name"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.az.clone(),
            opt(&self.alias),
            opt(&self.vendor_name),
        ]
    }
}

impl Tabular for Device {
    const COLUMNS: &'static [&'static str] =
        &["id", "asset_tag", "health", "state", "graduated", "last_seen"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            opt(&self.asset_tag),
            opt(&self.health),
            opt(&self.state),
            opt(&self.graduated),
            opt(&self.last_seen),
        ]
    }
}

impl Tabular for User {
    const COLUMNS: &'static [&'static str] = &["id", "name", "email", "admin", "last_login"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.email.clone(),
            self.is_admin.unwrap_or(false).to_string(),
            opt(&self.last_login),
        ]
    }
}

/// Writes `items` as a table, or as a JSON array.
pub fn render_list<T: Tabular + Serialize>(
    out: &mut dyn Write,
    format: OutputFormat,
    items: &[T],
) -> Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(items)?)?,
        OutputFormat::Text => {
            if items.is_empty() {
                writeln!(out, "No resources found.")?;
                return Ok(());
            }
            let rows: Vec<Vec<String>> = items.iter().map(Tabular::row).collect();
            write_table(out, T::COLUMNS, &rows)?;
        }
    }
    Ok(())
}

/// Writes one resource as aligned `column  value` lines, or as a JSON object.
pub fn render_one<T: Tabular + Serialize>(
    out: &mut dyn Write,
    format: OutputFormat,
    item: &T,
) -> Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(item)?)?,
        OutputFormat::Text => {
            let width = T::COLUMNS.iter().map(|c| c.len()).max().unwrap_or(0);
            for (column, value) in T::COLUMNS.iter().zip(item.row()) {
                writeln!(out, "{:width$}  {}", column, value, width = width)?;
            }
        }
    }
    Ok(())
}

fn write_table(out: &mut dyn Write, columns: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    writeln!(out, "{}", line(columns.iter().map(|c| c.to_uppercase()).collect()))?;
    writeln!(
        out,
        "{}",
        line(widths.iter().map(|w| "-".repeat(*w)).collect())
    )?;
    for row in rows {
        writeln!(out, "{}", line(row.clone()))?;
    }
    Ok(())
}
