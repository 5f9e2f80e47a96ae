//! HTTP transport for the Conch API: shared client, authentication and
//! response classification.

mod auth;
mod client;
mod error;
mod redirect;

pub use auth::Credential;
pub use client::{
    ApiResponse, ConchClient, DEFAULT_BASE_URL, DEFAULT_USER_AGENT, SESSION_COOKIE,
};
pub use error::{ApiError, classify_error_body, classify_status};
pub use redirect::{MAX_REDIRECTS, TooManyRedirects};
