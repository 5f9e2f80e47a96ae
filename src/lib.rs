//! Client library and command tree for the Conch hardware inventory API.

pub mod api;
pub mod commands;
pub mod http;
pub mod output;

pub use api::ConchApi;
pub use http::{ApiError, ConchClient, Credential};
