use anyhow::{Result, bail};
use serde_json::json;
use uuid::Uuid;

use super::Context;
use crate::api::{ConchApi, DatacenterUpdate, NewDatacenter, NewRoom, RoomUpdate};

#[derive(clap::Subcommand, Debug)]
pub enum GlobalCommand {
    /// Operate on all datacenters
    #[command(subcommand, visible_alias = "dcs")]
    Datacenters(DatacentersCommand),

    /// Operate on an individual datacenter
    #[command(visible_alias = "dc")]
    Datacenter(DatacenterArgs),

    /// Operate on all rooms
    #[command(subcommand, visible_alias = "rs")]
    Rooms(RoomsCommand),

    /// Operate on an individual room
    #[command(visible_alias = "r")]
    Room(RoomArgs),
}

#[derive(clap::Subcommand, Debug)]
pub enum DatacentersCommand {
    /// Get all datacenters
    Get,
    /// Create a datacenter
    Create(NewDatacenterArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewDatacenterArgs {
    #[arg(long)]
    pub vendor: String,
    #[arg(long)]
    pub vendor_name: Option<String>,
    #[arg(long)]
    pub region: String,
    #[arg(long)]
    pub location: String,
}

#[derive(clap::Args, Debug)]
pub struct DatacenterArgs {
    /// The UUID of the datacenter
    #[arg(value_name = "ID")]
    pub id: Uuid,

    #[command(subcommand)]
    pub action: DatacenterAction,
}

#[derive(clap::Subcommand, Debug)]
pub enum DatacenterAction {
    /// Get a datacenter
    Get,
    /// Delete a datacenter
    #[command(visible_alias = "rm")]
    Delete,
    /// Update a datacenter
    Update(DatacenterUpdateArgs),
    /// Get all rooms assigned to a datacenter
    Rooms,
}

#[derive(clap::Args, Debug)]
pub struct DatacenterUpdateArgs {
    #[arg(long)]
    pub vendor: Option<String>,
    #[arg(long)]
    pub vendor_name: Option<String>,
    #[arg(long)]
    pub region: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
pub enum RoomsCommand {
    /// Get all rooms
    Get,
    /// Create a room
    Create(NewRoomArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewRoomArgs {
    /// UUID of the datacenter holding the room
    #[arg(long = "datacenter", value_name = "UUID")]
    pub datacenter_id: Uuid,
    /// Availability zone
    #[arg(long)]
    pub az: String,
    #[arg(long)]
    pub alias: String,
    #[arg(long)]
    pub vendor_name: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RoomArgs {
    /// The UUID of the room
    #[arg(value_name = "ID")]
    pub id: Uuid,

    #[command(subcommand)]
    pub action: RoomAction,
}

#[derive(clap::Subcommand, Debug)]
pub enum RoomAction {
    /// Get a room
    Get,
    /// Delete a room
    #[command(visible_alias = "rm")]
    Delete,
    /// Update a room
    Update(RoomUpdateArgs),
}

#[derive(clap::Args, Debug)]
pub struct RoomUpdateArgs {
    #[arg(long = "datacenter", value_name = "UUID")]
    pub datacenter_id: Option<Uuid>,
    #[arg(long)]
    pub az: Option<String>,
    #[arg(long)]
    pub alias: Option<String>,
    #[arg(long)]
    pub vendor_name: Option<String>,
}

pub(super) async fn run<A: ConchApi>(ctx: &mut Context<'_, A>, command: GlobalCommand) -> Result<()> {
    match command {
        GlobalCommand::Datacenters(DatacentersCommand::Get) => {
            let dcs = ctx.api.datacenters().await?;
            ctx.list(&dcs)
        }
        GlobalCommand::Datacenters(DatacentersCommand::Create(args)) => {
            let new = NewDatacenter {
                vendor: args.vendor,
                vendor_name: args.vendor_name,
                region: args.region,
                location: args.location,
            };
            let dc = ctx.api.create_datacenter(&new).await?;
            ctx.show(&dc)
        }
        GlobalCommand::Datacenter(args) => datacenter(ctx, args.id, args.action).await,
        GlobalCommand::Rooms(RoomsCommand::Get) => {
            let rooms = ctx.api.rooms().await?;
            ctx.list(&rooms)
        }
        GlobalCommand::Rooms(RoomsCommand::Create(args)) => {
            let new = NewRoom {
                datacenter_id: args.datacenter_id,
                az: args.az,
                alias: args.alias,
                vendor_name: args.vendor_name,
            };
            let room = ctx.api.create_room(&new).await?;
            ctx.show(&room)
        }
        GlobalCommand::Room(args) => room(ctx, args.id, args.action).await,
    }
}

async fn datacenter<A: ConchApi>(
    ctx: &mut Context<'_, A>,
    id: Uuid,
    action: DatacenterAction,
) -> Result<()> {
    match action {
        DatacenterAction::Get => {
            let dc = ctx.api.datacenter(id).await?;
            ctx.show(&dc)
        }
        DatacenterAction::Delete => {
            ctx.api.delete_datacenter(id).await?;
            ctx.done(
                &format!("Datacenter {} deleted.", id),
                &json!({"id": id, "deleted": true}),
            )
        }
        DatacenterAction::Update(args) => {
            let update = DatacenterUpdate {
                vendor: args.vendor,
                vendor_name: args.vendor_name,
                region: args.region,
                location: args.location,
            };
            if update.is_empty() {
                bail!("Nothing to update: pass at least one field to change");
            }
            ctx.api.update_datacenter(id, &update).await?;
            ctx.done(
                &format!("Datacenter {} updated.", id),
                &json!({"id": id, "updated": true}),
            )
        }
        DatacenterAction::Rooms => {
            let rooms = ctx.api.datacenter_rooms(id).await?;
            ctx.list(&rooms)
        }
    }
}

async fn room<A: ConchApi>(ctx: &mut Context<'_, A>, id: Uuid, action: RoomAction) -> Result<()> {
    match action {
        RoomAction::Get => {
            let room = ctx.api.room(id).await?;
            ctx.show(&room)
        }
        RoomAction::Delete => {
            ctx.api.delete_room(id).await?;
            ctx.done(
                &format!("Room {} deleted.", id),
                &json!({"id": id, "deleted": true}),
            )
        }
        RoomAction::Update(args) => {
            let update = RoomUpdate {
                datacenter_id: args.datacenter_id,
                az: args.az,
                alias: args.alias,
                vendor_name: args.vendor_name,
            };
            if update.is_empty() {
                bail!("Nothing to update: pass at least one field to change");
            }
            ctx.api.update_room(id, &update).await?;
            ctx.done(
                &format!("Room {} updated.", id),
                &json!({"id": id, "updated": true}),
            )
        }
    }
}
