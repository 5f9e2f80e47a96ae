//! Direct access to API paths, bypassing response classification.

use anyhow::{Context as _, Result, bail};
use log::debug;
use reqwest::Response;
use std::io::{Read, Write};

use crate::http::ConchClient;

#[derive(clap::Subcommand, Debug)]
pub enum RawCommand {
    /// GET an API path and print the body
    Get {
        #[arg(value_name = "PATH")]
        path: String,
    },
    /// DELETE an API path and print the body
    #[command(visible_alias = "rm")]
    Delete {
        #[arg(value_name = "PATH")]
        path: String,
    },
    /// POST a JSON document to an API path and print the body
    Post {
        #[arg(value_name = "PATH")]
        path: String,
        /// JSON body; read from stdin when omitted
        #[arg(long, short = 'd')]
        data: Option<String>,
    },
}

#[tracing::instrument(skip(client, out))]
pub async fn run(client: &ConchClient, command: RawCommand, out: &mut dyn Write) -> Result<()> {
    let response = match command {
        RawCommand::Get { path } => client.raw_get(&path).await?,
        RawCommand::Delete { path } => client.raw_delete(&path).await?,
        RawCommand::Post { path, data } => {
            let body = match data {
                Some(data) => data,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("reading request body from stdin")?;
                    buf
                }
            };
            client.raw_post(&path, body).await?
        }
    };
    print_response(response, out).await
}

async fn print_response(response: Response, out: &mut dyn Write) -> Result<()> {
    let status = response.status();
    debug!("raw response {} from {}", status, response.url());
    let body = response.text().await.context("reading response body")?;

    if !body.is_empty() {
        writeln!(out, "{}", body)?;
    }
    if !status.is_success() {
        bail!("HTTP {}", status);
    }
    Ok(())
}
