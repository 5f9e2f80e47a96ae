//! The Conch API client: lazily built HTTP client, per-request authentication
//! and response classification.

use anyhow::{Context, Result, bail};
use log::{debug, warn};
use reqwest::cookie::Jar;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Body, Client, Method, Request, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use super::auth::Credential;
use super::error::{classify_error_body, classify_status};
use super::redirect::Redirects;

/// API endpoint used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://conch.joyent.us";

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "conch-rs";

/// Name of the cookie carrying a session credential.
pub const SESSION_COOKIE: &str = "conch";

/// Applies to TCP connect and TLS handshake together.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const TCP_KEEPALIVE: Duration = Duration::from_secs(5);

/// A successful round trip returned by [`ConchClient::post_needs_response`].
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Final URL after any redirects.
    pub url: Url,
    /// `None` when the body was not valid JSON for `T`.
    pub data: Option<T>,
}

/// Whether `value` can be sent as a cookie value without being read as
/// another cookie or an attribute.
fn is_cookie_value(value: &str) -> bool {
    value
        .bytes()
        .all(|b| b.is_ascii_graphic() && !matches!(b, b';' | b',' | b'"' | b'\\'))
}

/// Body of a 2xx response, read in full.
struct Completed {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    body: Vec<u8>,
}

/// Client for the Conch API.
///
/// Unset fields take their defaults on first use. The HTTP client and cookie
/// jar are created once and reused for the life of the value, so connection
/// reuse and cookie state carry across calls. Anything injected with the
/// `with_*` builders before the first request is kept as is.
#[derive(Debug, Default)]
pub struct ConchClient {
    base_url: Option<String>,
    user_agent: Option<String>,
    credential: Credential,
    cookie_jar: OnceLock<Arc<Jar>>,
    http: OnceLock<Client>,
}

impl ConchClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = credential;
        self
    }

    /// Uses `jar` for session cookies. Ignored once a jar exists.
    pub fn with_cookie_jar(self, jar: Arc<Jar>) -> Self {
        if self.cookie_jar.set(jar).is_err() {
            warn!("cookie jar already initialised; keeping the existing one");
        }
        self
    }

    /// Uses `client` for every request. Ignored once a client exists.
    ///
    /// The injected client only presents session cookies if it was built
    /// with [`ConchClient::cookie_jar`] as its cookie provider.
    pub fn with_http_client(self, client: Client) -> Self {
        if self.http.set(client).is_err() {
            warn!("HTTP client already initialised; keeping the existing one");
        }
        self
    }

    /// Replaces the credential; the next request uses it.
    pub fn set_credential(&mut self, credential: Credential) {
        debug!("switching credential to {}", credential.masked());
        self.credential = credential;
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// The shared cookie jar, created empty on first access.
    pub fn cookie_jar(&self) -> Arc<Jar> {
        self.cookie_jar
            .get_or_init(|| Arc::new(Jar::default()))
            .clone()
    }

    /// The shared HTTP client, built on first access.
    pub fn http(&self) -> Result<&Client> {
        if let Some(client) = self.http.get() {
            return Ok(client);
        }
        let client = Client::builder()
            .cookie_provider(self.cookie_jar())
            .connect_timeout(CONNECT_TIMEOUT)
            .tcp_keepalive(TCP_KEEPALIVE)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("building HTTP client")?;
        // A racing caller may have won; either way the stored client is used.
        Ok(self.http.get_or_init(|| client))
    }

    fn parsed_base_url(&self) -> Result<Url> {
        Url::parse(self.base_url())
            .with_context(|| format!("parsing base URL `{}`", self.base_url()))
    }

    /// Starts a request for `path` resolved against the base URL, with the
    /// user agent and current credential attached.
    fn prepare(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let base = self.parsed_base_url()?;
        let url = base
            .join(path)
            .with_context(|| format!("joining path `{}` to base URL", path))?;

        let builder = self
            .http()?
            .request(method, url)
            .header(USER_AGENT, self.user_agent());

        self.authorize(builder, &base)
    }

    fn authorize(&self, builder: RequestBuilder, base: &Url) -> Result<RequestBuilder> {
        match &self.credential {
            Credential::Bearer(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .context("bearer token is not a valid header value")?;
                value.set_sensitive(true);
                Ok(builder.header(AUTHORIZATION, value))
            }
            Credential::Session(session) => {
                if !is_cookie_value(session) {
                    bail!("session value is not a valid cookie value");
                }
                self.cookie_jar()
                    .add_cookie_str(&format!("{}={}", SESSION_COOKIE, session), base);
                Ok(builder)
            }
            Credential::None => Ok(builder),
        }
    }

    fn with_json<P: Serialize + ?Sized>(builder: RequestBuilder, payload: &P) -> Result<Request> {
        let body = serde_json::to_vec(payload).context("encoding request payload as JSON")?;
        builder
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .build()
            .context("building request")
    }

    /// Executes `request`, following redirects.
    async fn send(&self, mut request: Request) -> Result<Response> {
        let client = self.http()?;
        let mut redirects = Redirects::new(&request);
        loop {
            debug!("{} {}", request.method(), request.url());
            let retry = request.try_clone();
            let response = client.execute(request).await?;
            debug!("{} from {}", response.status(), response.url());

            // Streaming bodies cannot be replayed; such a response is final.
            let Some(previous) = retry else {
                return Ok(response);
            };
            match redirects.next(previous, &response)? {
                Some(next) => request = next,
                None => return Ok(response),
            }
        }
    }

    /// Sends `request` and classifies the response. Only 2xx responses come
    /// back as `Ok`; their body has been read in full.
    async fn round_trip(&self, request: Request) -> Result<Completed> {
        let response = self.send(request).await?;
        let status = response.status();

        if let Some(err) = classify_status(status) {
            return Err(err.into());
        }

        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes().await?.to_vec();

        if status.is_success() {
            Ok(Completed {
                status,
                headers,
                url,
                body,
            })
        } else {
            Err(classify_error_body(&body).into())
        }
    }

    fn decode<T: DeserializeOwned>(completed: &Completed) -> Option<T> {
        match serde_json::from_slice(&completed.body) {
            Ok(data) => Some(data),
            Err(e) if completed.body.is_empty() => {
                debug!("empty body from {}: {}", completed.url, e);
                None
            }
            Err(e) => {
                warn!("ignoring undecodable body from {}: {}", completed.url, e);
                None
            }
        }
    }

    /// GETs `path` and decodes the JSON body.
    #[tracing::instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let request = self.prepare(Method::GET, path)?.build()?;
        let completed = self.round_trip(request).await?;
        Ok(Self::decode(&completed))
    }

    /// GETs `path` with `query` serialized into the query string.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_with_query<Q, T>(&self, path: &str, query: &Q) -> Result<Option<T>>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .prepare(Method::GET, path)?
            .query(query)
            .build()
            .context("encoding query string")?;
        let completed = self.round_trip(request).await?;
        Ok(Self::decode(&completed))
    }

    /// POSTs `payload` as JSON and decodes the JSON body.
    #[tracing::instrument(skip(self, payload))]
    pub async fn post<P, T>(&self, path: &str, payload: &P) -> Result<Option<T>>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = Self::with_json(self.prepare(Method::POST, path)?, payload)?;
        let completed = self.round_trip(request).await?;
        Ok(Self::decode(&completed))
    }

    /// POSTs `payload` as JSON without looking at the response body.
    #[tracing::instrument(skip(self, payload))]
    pub async fn post_discarding_body<P>(&self, path: &str, payload: &P) -> Result<()>
    where
        P: Serialize + ?Sized,
    {
        let request = Self::with_json(self.prepare(Method::POST, path)?, payload)?;
        self.round_trip(request).await?;
        Ok(())
    }

    /// Like [`ConchClient::post`], also returning status, headers and final URL.
    #[tracing::instrument(skip(self, payload))]
    pub async fn post_needs_response<P, T>(&self, path: &str, payload: &P) -> Result<ApiResponse<T>>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = Self::with_json(self.prepare(Method::POST, path)?, payload)?;
        let completed = self.round_trip(request).await?;
        let data = Self::decode(&completed);
        Ok(ApiResponse {
            status: completed.status,
            headers: completed.headers,
            url: completed.url,
            data,
        })
    }

    /// DELETEs `path`. Any success body is discarded.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> Result<()> {
        let request = self.prepare(Method::DELETE, path)?.build()?;
        self.round_trip(request).await?;
        Ok(())
    }

    /// GET with authentication handled but the response left to the caller.
    #[tracing::instrument(skip(self))]
    pub async fn raw_get(&self, path: &str) -> Result<Response> {
        let request = self.prepare(Method::GET, path)?.build()?;
        self.send(request).await
    }

    /// DELETE with authentication handled but the response left to the caller.
    #[tracing::instrument(skip(self))]
    pub async fn raw_delete(&self, path: &str) -> Result<Response> {
        let request = self.prepare(Method::DELETE, path)?.build()?;
        self.send(request).await
    }

    /// POST of a caller-supplied body, which the server expects to be JSON.
    /// The response is left to the caller.
    #[tracing::instrument(skip(self, body))]
    pub async fn raw_post(&self, path: &str, body: impl Into<Body>) -> Result<Response> {
        let request = self
            .prepare(Method::POST, path)?
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .build()?;
        self.send(request).await
    }
}
