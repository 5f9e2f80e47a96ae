use anyhow::Result;
use uuid::Uuid;

use super::Context;
use crate::api::{ConchApi, DeviceFilter};

#[derive(clap::Subcommand, Debug)]
pub enum WorkspacesCommand {
    /// Get all workspaces visible to the user
    Get,
}

#[derive(clap::Args, Debug)]
pub struct WorkspaceArgs {
    /// The UUID of the workspace
    #[arg(value_name = "ID")]
    pub id: Uuid,

    #[command(subcommand)]
    pub action: WorkspaceAction,
}

#[derive(clap::Subcommand, Debug)]
pub enum WorkspaceAction {
    /// Get a workspace
    Get,
    /// Get the rooms assigned to a workspace
    Rooms,
    /// Get the devices in a workspace
    Devices(DeviceFilterArgs),
}

#[derive(clap::Args, Debug, Default)]
pub struct DeviceFilterArgs {
    /// Only devices with this health (pass, fail, unknown)
    #[arg(long)]
    pub health: Option<String>,
    /// Only devices that reported recently
    #[arg(long)]
    pub active: bool,
    /// Only graduated devices
    #[arg(long)]
    pub graduated: bool,
}

impl From<DeviceFilterArgs> for DeviceFilter {
    fn from(args: DeviceFilterArgs) -> Self {
        DeviceFilter {
            health: args.health,
            active: args.active.then_some(true),
            graduated: args.graduated.then_some(true),
        }
    }
}

pub(super) async fn run_all<A: ConchApi>(
    ctx: &mut Context<'_, A>,
    command: WorkspacesCommand,
) -> Result<()> {
    match command {
        WorkspacesCommand::Get => {
            let workspaces = ctx.api.workspaces().await?;
            ctx.list(&workspaces)
        }
    }
}

pub(super) async fn run<A: ConchApi>(ctx: &mut Context<'_, A>, args: WorkspaceArgs) -> Result<()> {
    let id = args.id;
    match args.action {
        WorkspaceAction::Get => {
            let workspace = ctx.api.workspace(id).await?;
            ctx.show(&workspace)
        }
        WorkspaceAction::Rooms => {
            let rooms = ctx.api.workspace_rooms(id).await?;
            ctx.list(&rooms)
        }
        WorkspaceAction::Devices(filter) => {
            let devices = ctx.api.workspace_devices(id, &filter.into()).await?;
            ctx.list(&devices)
        }
    }
}
