use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A datacenter in the global (admin) namespace.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct Datacenter {
    pub id: Uuid,
    pub vendor: String,
    pub vendor_name: Option<String>,
    pub region: String,
    pub location: String,
    pub created: Option<String>,
    pub updated: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NewDatacenter {
    pub vendor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
    pub region: String,
    pub location: String,
}

/// Fields left `None` are not sent and keep their server-side value.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct DatacenterUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl DatacenterUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A datacenter room in the global namespace.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct Room {
    pub id: Uuid,
    pub datacenter_id: Uuid,
    pub az: String,
    pub alias: Option<String>,
    pub vendor_name: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NewRoom {
    pub datacenter_id: Uuid,
    pub az: String,
    pub alias: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct RoomUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datacenter_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub az: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
}

impl RoomUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct Workspace {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub role: Option<String>,
    pub parent_id: Option<Uuid>,
}

/// A room as seen through a workspace.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct WorkspaceRoom {
    pub id: Uuid,
    pub az: String,
    pub alias: Option<String>,
    pub vendor_name: Option<String>,
}

/// Devices are keyed by serial number rather than UUID.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct Device {
    pub id: String,
    pub asset_tag: Option<String>,
    pub health: Option<String>,
    pub state: Option<String>,
    pub hardware_product: Option<Uuid>,
    pub graduated: Option<String>,
    pub last_seen: Option<String>,
    pub created: Option<String>,
}

/// Query for a workspace's device list; unset fields are omitted.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct DeviceFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<String>,
    /// Only devices that have reported recently.
    #[serde(skip_serializing_if = "Option::is_none", with = "flag")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", with = "flag")]
    pub graduated: Option<bool>,
}

/// The API reads boolean query flags as `t`/`f`.
mod flag {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(true) => serializer.serialize_str("t"),
            Some(false) => serializer.serialize_str("f"),
            None => serializer.serialize_none(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: Option<bool>,
    pub created: Option<String>,
    pub last_login: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LoginRequest {
    pub user: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct LoginResponse {
    pub jwt_token: Option<String>,
}
