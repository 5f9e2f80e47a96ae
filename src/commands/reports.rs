use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::Context;
use crate::api::{ConchApi, Device, DeviceFilter};
use crate::output::Tabular;

#[derive(clap::Subcommand, Debug)]
pub enum ReportsCommand {
    /// Count the devices of a workspace by health
    #[command(visible_alias = "health")]
    DeviceHealth {
        /// The UUID of the workspace
        #[arg(long, short = 'w', value_name = "ID")]
        workspace: Uuid,
    },
}

/// One line of the device health report.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HealthCount {
    pub health: String,
    pub devices: usize,
}

impl Tabular for HealthCount {
    const COLUMNS: &'static [&'static str] = &["health", "devices"];

    fn row(&self) -> Vec<String> {
        vec![self.health.clone(), self.devices.to_string()]
    }
}

/// Devices without a reported health count as `unknown`.
fn health_counts(devices: &[Device]) -> Vec<HealthCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for device in devices {
        *counts
            .entry(device.health.as_deref().unwrap_or("unknown"))
            .or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(health, devices)| HealthCount {
            health: health.to_string(),
            devices,
        })
        .collect()
}

pub(super) async fn run<A: ConchApi>(ctx: &mut Context<'_, A>, command: ReportsCommand) -> Result<()> {
    match command {
        ReportsCommand::DeviceHealth { workspace } => {
            let devices = ctx
                .api
                .workspace_devices(workspace, &DeviceFilter::default())
                .await?;
            ctx.list(&health_counts(&devices))
        }
    }
}
