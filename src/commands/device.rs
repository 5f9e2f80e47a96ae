use anyhow::Result;

use super::Context;
use crate::api::ConchApi;

#[derive(clap::Args, Debug)]
pub struct DeviceArgs {
    /// The serial number of the device
    #[arg(value_name = "ID")]
    pub id: String,

    #[command(subcommand)]
    pub action: DeviceAction,
}

#[derive(clap::Subcommand, Debug)]
pub enum DeviceAction {
    /// Get a device
    Get,
}

pub(super) async fn run<A: ConchApi>(ctx: &mut Context<'_, A>, args: DeviceArgs) -> Result<()> {
    match args.action {
        DeviceAction::Get => {
            let device = ctx.api.device(&args.id).await?;
            ctx.show(&device)
        }
    }
}
