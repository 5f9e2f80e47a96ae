use anyhow::Result;
use clap::Parser;
use conch::commands::{self, Command, Context, raw::RawCommand};
use conch::output::OutputFormat;
use conch::{ConchClient, Credential};
use log::debug;

/// conch - command line client for the Conch hardware inventory API
///
/// Authenticate with CONCH_TOKEN (a bearer token) or CONCH_SESSION (a
/// session cookie value). `conch login` prints either one for export.
#[derive(Parser, Debug)]
#[command(author, version = env!("CONCH_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API base URL (defaults to https://conch.joyent.us)
    #[arg(long = "url", env = "CONCH_URL", value_name = "URL", global = true)]
    base_url: Option<String>,

    /// Bearer token; wins over --session when both are set
    #[arg(long, env = "CONCH_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Session cookie value
    #[arg(long, env = "CONCH_SESSION", hide_env_values = true, global = true)]
    session: Option<String>,

    /// User agent sent with every request
    #[arg(long, env = "CONCH_USER_AGENT", global = true)]
    user_agent: Option<String>,

    /// Output format
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Text, global = true)]
    output: OutputFormat,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Resource(Command),

    /// Send requests to arbitrary API paths
    #[command(subcommand)]
    Api(RawCommand),
}

impl Cli {
    fn client(&self) -> ConchClient {
        let credential = Credential::from_parts(self.token.clone(), self.session.clone());
        debug!("using credential {}", credential.masked());

        let mut client = ConchClient::new()
            .with_credential(credential)
            .with_user_agent(
                self.user_agent
                    .clone()
                    .unwrap_or_else(|| format!("conch-shell/{}", env!("CONCH_VERSION"))),
            );
        if let Some(url) = &self.base_url {
            client = client.with_base_url(url.as_str());
        }
        client
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let client = cli.client();
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Resource(command) => {
            let mut ctx = Context::new(&client, cli.output, &mut stdout);
            commands::run(&mut ctx, command).await?
        }
        Commands::Api(command) => commands::raw::run(&client, command, &mut stdout).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    const DC_ID: &str = "0f4c9d43-6a29-4d35-b9d5-5d2c7f3f1a11";

    #[test]
    fn test_cli_global_datacenter_parsing() {
        let cli = Cli::try_parse_from(["conch", "global", "dc", DC_ID, "rm"]).unwrap();
        match cli.command {
            Commands::Resource(Command::Global(commands::GlobalCommand::Datacenter(args))) => {
                assert_eq!(args.id.to_string(), DC_ID);
            }
            other => panic!("Expected global datacenter command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_reports_alias() {
        let cli = Cli::try_parse_from(["conch", "reports", "health", "-w", DC_ID]).unwrap();
        match cli.command {
            Commands::Resource(Command::Reports(commands::ReportsCommand::DeviceHealth {
                workspace,
            })) => assert_eq!(workspace.to_string(), DC_ID),
            other => panic!("Expected reports command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_bad_uuid() {
        let result = Cli::try_parse_from(["conch", "global", "room", "not-a-uuid", "get"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from([
            "conch",
            "workspaces",
            "get",
            "--url",
            "http://localhost:5001/",
            "--token",
            "abc123",
            "-o",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.output, OutputFormat::Json);

        let client = cli.client();
        assert_eq!(client.base_url(), "http://localhost:5001/");
        assert_eq!(client.credential(), &Credential::Bearer("abc123".into()));
        assert!(client.user_agent().starts_with("conch-shell/"));
    }

    #[test]
    fn test_cli_api_parsing() {
        let cli = Cli::try_parse_from(["conch", "api", "post", "/dc", "-d", "{}"]).unwrap();
        match cli.command {
            Commands::Api(RawCommand::Post { path, data }) => {
                assert_eq!(path, "/dc");
                assert_eq!(data.as_deref(), Some("{}"));
            }
            other => panic!("Expected api post command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["conch"]).is_err());
    }
}
