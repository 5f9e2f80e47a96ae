//! Redirect following for Conch requests.
//!
//! The shared HTTP client is built with [`reqwest::redirect::Policy::none`]
//! and hops are followed here, so that `Authorization` can be put back on any
//! hop that returns to the host of the first request.

use anyhow::{Context, Result};
use log::debug;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, COOKIE, HeaderValue, LOCATION};
use reqwest::{Method, Request, Response, StatusCode, Url};

/// Number of consecutive redirects followed before a request fails.
pub const MAX_REDIRECTS: usize = 30;

/// Returned when a request is redirected too many times.
#[derive(Debug)]
pub struct TooManyRedirects(pub usize);

impl std::fmt::Display for TooManyRedirects {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} > {} consecutive requests(redirects)",
            self.0, MAX_REDIRECTS
        )
    }
}

impl std::error::Error for TooManyRedirects {}

/// Host and port a URL is served from.
#[derive(Debug, PartialEq, Eq)]
struct Origin {
    host: Option<String>,
    port: Option<u16>,
}

impl Origin {
    fn of(url: &Url) -> Self {
        Self {
            host: url.host_str().map(str::to_ascii_lowercase),
            port: url.port_or_known_default(),
        }
    }
}

/// State of one request's redirect chain.
#[derive(Debug)]
pub(crate) struct Redirects {
    origin: Origin,
    authorization: Option<HeaderValue>,
    hops: usize,
}

impl Redirects {
    /// Starts a chain for `first`, the request as the caller built it.
    pub(crate) fn new(first: &Request) -> Self {
        Self {
            origin: Origin::of(first.url()),
            authorization: first.headers().get(AUTHORIZATION).cloned(),
            hops: 0,
        }
    }

    /// Turns `previous`, which produced `response`, into the next hop.
    ///
    /// Returns `None` when `response` is not a redirect to follow.
    pub(crate) fn next(
        &mut self,
        mut previous: Request,
        response: &Response,
    ) -> Result<Option<Request>> {
        let status = response.status();
        let keep_body = match status {
            StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::SEE_OTHER => false,
            StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT => true,
            _ => return Ok(None),
        };
        let Some(location) = response.headers().get(LOCATION) else {
            return Ok(None);
        };

        self.hops += 1;
        if self.hops > MAX_REDIRECTS {
            debug!("giving up on redirect from {} after {} hops", response.url(), self.hops);
            return Err(TooManyRedirects(self.hops).into());
        }

        let location = location
            .to_str()
            .context("redirect Location is not valid text")?;
        let target = response
            .url()
            .join(location)
            .with_context(|| format!("resolving redirect Location `{}`", location))?;

        if !keep_body {
            let to_get = match status {
                StatusCode::SEE_OTHER => previous.method() != Method::HEAD,
                _ => previous.method() == Method::POST,
            };
            if to_get {
                *previous.method_mut() = Method::GET;
            }
            *previous.body_mut() = None;
            previous.headers_mut().remove(CONTENT_TYPE);
            previous.headers_mut().remove(CONTENT_LENGTH);
        }

        let headers = previous.headers_mut();
        headers.remove(AUTHORIZATION);
        headers.remove(COOKIE);
        if Origin::of(&target) == self.origin {
            if let Some(value) = &self.authorization {
                headers.insert(AUTHORIZATION, value.clone());
            }
        }

        debug!("{} redirect {} -> {}", status, response.url(), target);
        *previous.url_mut() = target;
        Ok(Some(previous))
    }
}
