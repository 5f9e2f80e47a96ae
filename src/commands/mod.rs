//! The command tree and its handlers.
//!
//! Handlers receive the resource IDs they act on as parameters and everything
//! else through a per-invocation [`Context`].

use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use crate::api::ConchApi;
use crate::output::{OutputFormat, Tabular, render_list, render_one};

mod device;
mod global;
pub mod raw;
mod reports;
mod user;
mod workspace;

pub use device::DeviceArgs;
pub use global::GlobalCommand;
pub use reports::ReportsCommand;
pub use user::{LoginArgs, UserCommand};
pub use workspace::{WorkspaceArgs, WorkspacesCommand};

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Operate on objects in the global space. Admin access is required.
    #[command(subcommand)]
    Global(GlobalCommand),

    /// Operate on all workspaces
    #[command(subcommand, visible_alias = "wss")]
    Workspaces(WorkspacesCommand),

    /// Operate on an individual workspace
    #[command(visible_alias = "ws")]
    Workspace(WorkspaceArgs),

    /// Operate on an individual device
    #[command(visible_alias = "d")]
    Device(DeviceArgs),

    /// Summaries built from workspace data
    #[command(subcommand)]
    Reports(ReportsCommand),

    /// Commands for the logged in user
    #[command(subcommand)]
    User(UserCommand),

    /// Log in and print the credential to export
    Login(LoginArgs),

    /// End the current session
    Logout,
}

/// State shared by the handlers of one invocation.
pub struct Context<'a, A: ConchApi> {
    pub api: &'a A,
    pub format: OutputFormat,
    pub out: &'a mut dyn Write,
}

impl<'a, A: ConchApi> Context<'a, A> {
    pub fn new(api: &'a A, format: OutputFormat, out: &'a mut dyn Write) -> Self {
        Self { api, format, out }
    }

    pub(crate) fn list<T: Tabular + Serialize>(&mut self, items: &[T]) -> Result<()> {
        render_list(&mut *self.out, self.format, items)
    }

    pub(crate) fn show<T: Tabular + Serialize>(&mut self, item: &T) -> Result<()> {
        render_one(&mut *self.out, self.format, item)
    }

    /// Reports a completed action: a sentence for text output, `value` for JSON.
    pub(crate) fn done<T: Serialize>(&mut self, message: &str, value: &T) -> Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(self.out, "{}", message)?,
            OutputFormat::Json => {
                writeln!(self.out, "{}", serde_json::to_string_pretty(value)?)?
            }
        }
        Ok(())
    }
}

#[tracing::instrument(skip_all)]
pub async fn run<A: ConchApi>(ctx: &mut Context<'_, A>, command: Command) -> Result<()> {
    match command {
        Command::Global(cmd) => global::run(ctx, cmd).await,
        Command::Workspaces(cmd) => workspace::run_all(ctx, cmd).await,
        Command::Workspace(args) => workspace::run(ctx, args).await,
        Command::Device(args) => device::run(ctx, args).await,
        Command::Reports(cmd) => reports::run(ctx, cmd).await,
        Command::User(cmd) => user::run(ctx, cmd).await,
        Command::Login(args) => user::login(ctx, args).await,
        Command::Logout => user::logout(ctx).await,
    }
}
