//! Typed operations on Conch resources, layered over [`ConchClient`].

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Url;
use reqwest::cookie::CookieStore;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use uuid::Uuid;

use crate::http::{ApiResponse, ConchClient, Credential, SESSION_COOKIE};

mod types;

pub use types::{
    Datacenter, DatacenterUpdate, Device, DeviceFilter, LoginRequest, LoginResponse, NewDatacenter,
    NewRoom, Room, RoomUpdate, User, Workspace, WorkspaceRoom,
};

/// Everything the command tree asks of the API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConchApi: Send + Sync {
    async fn datacenters(&self) -> Result<Vec<Datacenter>>;
    async fn datacenter(&self, id: Uuid) -> Result<Datacenter>;
    async fn create_datacenter(&self, new: &NewDatacenter) -> Result<Datacenter>;
    async fn update_datacenter(&self, id: Uuid, update: &DatacenterUpdate) -> Result<()>;
    async fn delete_datacenter(&self, id: Uuid) -> Result<()>;
    async fn datacenter_rooms(&self, id: Uuid) -> Result<Vec<Room>>;

    async fn rooms(&self) -> Result<Vec<Room>>;
    async fn room(&self, id: Uuid) -> Result<Room>;
    async fn create_room(&self, new: &NewRoom) -> Result<Room>;
    async fn update_room(&self, id: Uuid, update: &RoomUpdate) -> Result<()>;
    async fn delete_room(&self, id: Uuid) -> Result<()>;

    async fn workspaces(&self) -> Result<Vec<Workspace>>;
    async fn workspace(&self, id: Uuid) -> Result<Workspace>;
    async fn workspace_rooms(&self, id: Uuid) -> Result<Vec<WorkspaceRoom>>;
    async fn workspace_devices(&self, id: Uuid, filter: &DeviceFilter) -> Result<Vec<Device>>;

    async fn device(&self, id: &str) -> Result<Device>;

    async fn current_user(&self) -> Result<User>;
    /// Exchanges a username and password for a credential.
    async fn login(&self, user: &str, password: &str) -> Result<Credential>;
    async fn logout(&self) -> Result<()>;
}

/// A collection endpoint whose success body did not decode is treated as empty.
fn list<T>(decoded: Option<Vec<T>>) -> Vec<T> {
    decoded.unwrap_or_default()
}

/// A single-resource endpoint must produce the resource.
fn one<T>(decoded: Option<T>, what: &str) -> Result<T> {
    decoded.ok_or_else(|| anyhow!("the API response did not contain a {}", what))
}

/// Encodes a free-form ID as a single path segment.
fn path_segment(id: &str) -> Result<Cow<'_, str>> {
    if matches!(id, "" | "." | "..") {
        bail!("`{}` is not a usable resource ID", id);
    }
    Ok(urlencoding::encode(id))
}

/// Picks the created resource out of a create call. When the body was not the
/// resource itself, follows the `Location` header instead.
async fn created<T: DeserializeOwned>(
    client: &ConchClient,
    response: ApiResponse<T>,
    what: &str,
) -> Result<T> {
    debug!("create returned {} from {}", response.status, response.url);
    if let Some(data) = response.data {
        return Ok(data);
    }
    let location = response
        .headers
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| anyhow!("the API created a {} but did not say where", what))?;
    one(client.get(location).await?, what)
}

impl ConchClient {
    /// The session value the server left in the cookie jar, if any.
    fn session_from_jar(&self) -> Result<Option<String>> {
        let base = Url::parse(self.base_url())?;
        let Some(header) = self.cookie_jar().cookies(&base) else {
            return Ok(None);
        };
        let header = header.to_str().context("cookie header is not valid text")?;
        Ok(header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value.to_string()))
    }
}

#[async_trait]
impl ConchApi for ConchClient {
    #[tracing::instrument(skip(self))]
    async fn datacenters(&self) -> Result<Vec<Datacenter>> {
        Ok(list(self.get("/dc").await?))
    }

    #[tracing::instrument(skip(self))]
    async fn datacenter(&self, id: Uuid) -> Result<Datacenter> {
        one(self.get(&format!("/dc/{}", id)).await?, "datacenter")
    }

    #[tracing::instrument(skip(self, new))]
    async fn create_datacenter(&self, new: &NewDatacenter) -> Result<Datacenter> {
        let response: ApiResponse<Datacenter> = self.post_needs_response("/dc", new).await?;
        let dc = created(self, response, "datacenter").await?;
        info!("created datacenter {}", dc.id);
        Ok(dc)
    }

    #[tracing::instrument(skip(self, update))]
    async fn update_datacenter(&self, id: Uuid, update: &DatacenterUpdate) -> Result<()> {
        self.post_discarding_body(&format!("/dc/{}", id), update).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_datacenter(&self, id: Uuid) -> Result<()> {
        self.delete(&format!("/dc/{}", id)).await
    }

    #[tracing::instrument(skip(self))]
    async fn datacenter_rooms(&self, id: Uuid) -> Result<Vec<Room>> {
        Ok(list(self.get(&format!("/dc/{}/rooms", id)).await?))
    }

    #[tracing::instrument(skip(self))]
    async fn rooms(&self) -> Result<Vec<Room>> {
        Ok(list(self.get("/room").await?))
    }

    #[tracing::instrument(skip(self))]
    async fn room(&self, id: Uuid) -> Result<Room> {
        one(self.get(&format!("/room/{}", id)).await?, "room")
    }

    #[tracing::instrument(skip(self, new))]
    async fn create_room(&self, new: &NewRoom) -> Result<Room> {
        let response: ApiResponse<Room> = self.post_needs_response("/room", new).await?;
        let room = created(self, response, "room").await?;
        info!("created room {}", room.id);
        Ok(room)
    }

    #[tracing::instrument(skip(self, update))]
    async fn update_room(&self, id: Uuid, update: &RoomUpdate) -> Result<()> {
        self.post_discarding_body(&format!("/room/{}", id), update)
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_room(&self, id: Uuid) -> Result<()> {
        self.delete(&format!("/room/{}", id)).await
    }

    #[tracing::instrument(skip(self))]
    async fn workspaces(&self) -> Result<Vec<Workspace>> {
        Ok(list(self.get("/workspace").await?))
    }

    #[tracing::instrument(skip(self))]
    async fn workspace(&self, id: Uuid) -> Result<Workspace> {
        one(self.get(&format!("/workspace/{}", id)).await?, "workspace")
    }

    #[tracing::instrument(skip(self))]
    async fn workspace_rooms(&self, id: Uuid) -> Result<Vec<WorkspaceRoom>> {
        Ok(list(self.get(&format!("/workspace/{}/room", id)).await?))
    }

    #[tracing::instrument(skip(self, filter))]
    async fn workspace_devices(&self, id: Uuid, filter: &DeviceFilter) -> Result<Vec<Device>> {
        Ok(list(
            self.get_with_query(&format!("/workspace/{}/device", id), filter)
                .await?,
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn device(&self, id: &str) -> Result<Device> {
        let path = format!("/device/{}", path_segment(id)?);
        one(self.get(&path).await?, "device")
    }

    #[tracing::instrument(skip(self))]
    async fn current_user(&self) -> Result<User> {
        one(self.get("/user/me").await?, "user")
    }

    #[tracing::instrument(skip(self, password))]
    async fn login(&self, user: &str, password: &str) -> Result<Credential> {
        let request = LoginRequest {
            user: user.to_string(),
            password: password.to_string(),
        };
        let response: Option<LoginResponse> = self.post("/login", &request).await?;

        if let Some(token) = response.and_then(|r| r.jwt_token) {
            debug!("login returned a bearer token");
            return Ok(Credential::Bearer(token));
        }
        match self.session_from_jar()? {
            Some(session) => {
                debug!("login returned a session cookie");
                Ok(Credential::Session(session))
            }
            None => Err(anyhow!(
                "login succeeded but the API returned neither a token nor a session"
            )),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn logout(&self) -> Result<()> {
        self.post_discarding_body("/logout", &serde_json::json!({}))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ApiError;
    use mockito::Matcher;
    use serde_json::json;

    const DC_ID: &str = "0f4c9d43-6a29-4d35-b9d5-5d2c7f3f1a11";
    const ROOM_ID: &str = "7c3a8b1e-2f41-4d0a-9a55-3f1f0c6e2b10";

    fn dc_json() -> serde_json::Value {
        json!({
            "id": DC_ID,
            "vendor": "Acme",
            "vendor_name": "ACME-1",
            "region": "us-east",
            "location": "Ashburn, VA",
            "created": "2018-06-21T00:00:00Z",
            "updated": "2018-06-21T00:00:00Z"
        })
    }

    fn room_json() -> serde_json::Value {
        json!({
            "id": ROOM_ID,
            "datacenter_id": DC_ID,
            "az": "us-east-1a",
            "alias": "R1",
            "vendor_name": "room-1"
        })
    }

    fn client_for(server: &mockito::Server) -> ConchClient {
        ConchClient::new()
            .with_base_url(server.url())
            .with_credential(Credential::Bearer("abc123".into()))
    }

    #[tokio::test]
    async fn test_datacenters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/dc")
            .with_status(200)
            .with_body(json!([dc_json()]).to_string())
            .create_async()
            .await;

        let dcs = client_for(&server).datacenters().await.unwrap();

        mock.assert_async().await;
        assert_eq!(dcs.len(), 1);
        assert_eq!(dcs[0].vendor, "Acme");
        assert_eq!(dcs[0].id.to_string(), DC_ID);
    }

    #[tokio::test]
    async fn test_datacenters_undecodable_body_is_empty() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/dc")
            .with_status(200)
            .with_body("garbage")
            .create_async()
            .await;

        let dcs = client_for(&server).datacenters().await.unwrap();
        assert!(dcs.is_empty());
    }

    #[tokio::test]
    async fn test_room_by_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", format!("/room/{}", ROOM_ID).as_str())
            .match_header("authorization", "Bearer abc123")
            .with_status(200)
            .with_body(room_json().to_string())
            .create_async()
            .await;

        let room = client_for(&server)
            .room(ROOM_ID.parse().unwrap())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(room.alias.as_deref(), Some("R1"));
    }

    #[tokio::test]
    async fn test_room_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", format!("/room/{}", ROOM_ID).as_str())
            .with_status(404)
            .create_async()
            .await;

        let err = client_for(&server)
            .room(ROOM_ID.parse().unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<ApiError>(), Some(&ApiError::DataNotFound));
    }

    #[tokio::test]
    async fn test_room_undecodable_body_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", format!("/room/{}", ROOM_ID).as_str())
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let err = client_for(&server)
            .room(ROOM_ID.parse().unwrap())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("did not contain a room"));
    }

    #[tokio::test]
    async fn test_create_datacenter_from_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/dc")
            .match_body(Matcher::Json(json!({
                "vendor": "Acme",
                "region": "us-east",
                "location": "Ashburn, VA"
            })))
            .with_status(201)
            .with_body(dc_json().to_string())
            .create_async()
            .await;

        let new = NewDatacenter {
            vendor: "Acme".into(),
            vendor_name: None,
            region: "us-east".into(),
            location: "Ashburn, VA".into(),
        };
        let dc = client_for(&server).create_datacenter(&new).await.unwrap();

        mock.assert_async().await;
        assert_eq!(dc.id.to_string(), DC_ID);
    }

    #[tokio::test]
    async fn test_create_room_follows_location() {
        let mut server = mockito::Server::new_async().await;
        let _create = server
            .mock("POST", "/room")
            .with_status(201)
            .with_header("location", &format!("/room/{}", ROOM_ID))
            .create_async()
            .await;
        let fetch = server
            .mock("GET", format!("/room/{}", ROOM_ID).as_str())
            .with_status(200)
            .with_body(room_json().to_string())
            .create_async()
            .await;

        let new = NewRoom {
            datacenter_id: DC_ID.parse().unwrap(),
            az: "us-east-1a".into(),
            alias: "R1".into(),
            vendor_name: None,
        };
        let room = client_for(&server).create_room(&new).await.unwrap();

        fetch.assert_async().await;
        assert_eq!(room.id.to_string(), ROOM_ID);
    }

    #[tokio::test]
    async fn test_update_and_delete_datacenter() {
        let mut server = mockito::Server::new_async().await;
        let update_mock = server
            .mock("POST", format!("/dc/{}", DC_ID).as_str())
            .match_body(Matcher::Json(json!({"region": "us-west"})))
            .with_status(200)
            .create_async()
            .await;
        let delete_mock = server
            .mock("DELETE", format!("/dc/{}", DC_ID).as_str())
            .with_status(204)
            .create_async()
            .await;

        let client = client_for(&server);
        let id: Uuid = DC_ID.parse().unwrap();
        let update = DatacenterUpdate {
            region: Some("us-west".into()),
            ..Default::default()
        };
        client.update_datacenter(id, &update).await.unwrap();
        client.delete_datacenter(id).await.unwrap();

        update_mock.assert_async().await;
        delete_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_room_conflict_reports_server_message() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("DELETE", format!("/room/{}", ROOM_ID).as_str())
            .with_status(409)
            .with_body(r#"{"error":"room has racks"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .delete_room(ROOM_ID.parse().unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "room has racks");
    }

    #[tokio::test]
    async fn test_workspace_devices_sends_filter() {
        let ws_id = "5a2f3b58-7f24-4d7b-8d3e-2b7a1b5e9c01";
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", format!("/workspace/{}/device", ws_id).as_str())
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("health".into(), "fail".into()),
                Matcher::UrlEncoded("graduated".into(), "t".into()),
            ]))
            .with_status(200)
            .with_body(r#"[{"id":"SERIAL1","health":"fail"}]"#)
            .create_async()
            .await;

        let filter = DeviceFilter {
            health: Some("fail".into()),
            graduated: Some(true),
            ..Default::default()
        };
        let devices = client_for(&server)
            .workspace_devices(ws_id.parse().unwrap(), &filter)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(devices[0].id, "SERIAL1");
    }

    #[tokio::test]
    async fn test_login_returns_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/login")
            .match_body(Matcher::Json(json!({"user": "ops", "password": "hunter2"})))
            .with_status(200)
            .with_body(r#"{"jwt_token":"token-from-login"}"#)
            .create_async()
            .await;

        let client = ConchClient::new().with_base_url(server.url());
        let credential = client.login("ops", "hunter2").await.unwrap();

        mock.assert_async().await;
        assert_eq!(credential, Credential::Bearer("token-from-login".into()));
    }

    #[tokio::test]
    async fn test_login_falls_back_to_session_cookie() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/login")
            .with_status(204)
            .with_header("set-cookie", "conch=sess-from-login; Path=/")
            .create_async()
            .await;

        let client = ConchClient::new().with_base_url(server.url());
        let credential = client.login("ops", "hunter2").await.unwrap();

        assert_eq!(credential, Credential::Session("sess-from-login".into()));
    }

    #[tokio::test]
    async fn test_device_id_is_one_path_segment() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/device/a%2F..%2F..%2Fuser%2Fme%3Fx%3D1")
            .with_status(200)
            .with_body(r#"{"id":"a/../../user/me?x=1"}"#)
            .create_async()
            .await;
        let stray = server
            .mock("GET", "/user/me")
            .expect(0)
            .create_async()
            .await;

        let device = client_for(&server)
            .device("a/../../user/me?x=1")
            .await
            .unwrap();

        mock.assert_async().await;
        stray.assert_async().await;
        assert_eq!(device.id, "a/../../user/me?x=1");
    }

    #[tokio::test]
    async fn test_device_dot_segment_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = client_for(&server).device("..").await.unwrap_err();

        assert!(err.to_string().contains("not a usable resource ID"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_session_keeps_padding() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/login")
            .with_status(204)
            .with_header("set-cookie", "conch=c2Vzc2lvbi0xMjM0NQ==; Path=/")
            .create_async()
            .await;

        let client = ConchClient::new().with_base_url(server.url());
        let credential = client.login("ops", "hunter2").await.unwrap();

        assert_eq!(credential, Credential::Session("c2Vzc2lvbi0xMjM0NQ==".into()));
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/login")
            .with_status(401)
            .create_async()
            .await;

        let client = ConchClient::new().with_base_url(server.url());
        let err = client.login("ops", "wrong").await.unwrap_err();
        assert_eq!(err.downcast_ref::<ApiError>(), Some(&ApiError::NotAuthorized));
    }
}
