use anyhow::Result;
use serde_json::json;

use super::Context;
use crate::api::ConchApi;
use crate::http::Credential;

#[derive(clap::Subcommand, Debug)]
pub enum UserCommand {
    /// Show the profile of the logged in user
    #[command(visible_alias = "me")]
    Profile,
}

#[derive(clap::Args)]
pub struct LoginArgs {
    /// Login name or email address
    #[arg(long, env = "CONCH_USER")]
    pub user: String,

    #[arg(long, env = "CONCH_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl std::fmt::Debug for LoginArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginArgs")
            .field("user", &self.user)
            .field("password", &"*********")
            .finish()
    }
}

pub(super) async fn run<A: ConchApi>(ctx: &mut Context<'_, A>, command: UserCommand) -> Result<()> {
    match command {
        UserCommand::Profile => {
            let user = ctx.api.current_user().await?;
            ctx.show(&user)
        }
    }
}

/// Prints the credential as shell exports so it can be reused by later calls.
pub(super) async fn login<A: ConchApi>(ctx: &mut Context<'_, A>, args: LoginArgs) -> Result<()> {
    let credential = ctx.api.login(&args.user, &args.password).await?;
    log::info!("logged in as {} ({})", args.user, credential.masked());

    let (var, value) = match &credential {
        Credential::Bearer(token) => ("CONCH_TOKEN", token.as_str()),
        Credential::Session(session) => ("CONCH_SESSION", session.as_str()),
        Credential::None => anyhow::bail!("login did not produce a credential"),
    };
    ctx.done(
        &format!("export {}={}", var, value),
        &json!({ var: value }),
    )
}

pub(super) async fn logout<A: ConchApi>(ctx: &mut Context<'_, A>) -> Result<()> {
    ctx.api.logout().await?;
    ctx.done("Logged out.", &json!({"logged_out": true}))
}
