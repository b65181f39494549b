//! Login, registration and identity commands

use anyhow::Result;
use clap::Args;
use rcm_domain::RegisterRequest;
use rcm_infra::ApiClient;

use crate::output::Output;

/// Credentials shared by `login` and `register`
#[derive(Debug, Clone, Args)]
pub struct CredentialArgs {
    /// Account name
    #[arg(short, long, env = "RCM_USERNAME")]
    pub username: String,

    /// Account password
    #[arg(short, long, env = "RCM_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn login(client: &ApiClient, out: Output, args: CredentialArgs) -> Result<()> {
    let session = client.auth().login(&args.username, &args.password).await?;
    out.emit(&session.user, |user| match user {
        Some(user) => format!("Logged in as {}", user.username),
        None => "Logged in".to_string(),
    })
}

pub async fn register(
    client: &ApiClient,
    out: Output,
    args: CredentialArgs,
    email: Option<String>,
) -> Result<()> {
    let request = RegisterRequest { username: args.username, password: args.password, email };
    let session = client.auth().register(&request).await?;
    out.emit(&session.user, |user| match user {
        Some(user) => format!("Registered and logged in as {}", user.username),
        None => "Registered".to_string(),
    })
}

pub async fn logout(client: &ApiClient, out: Output) -> Result<()> {
    client.auth().logout().await?;
    out.message("Logged out");
    Ok(())
}

pub async fn whoami(client: &ApiClient, out: Output) -> Result<()> {
    let user = client.auth().current_user().await;
    out.emit(&user, |user| match user {
        Some(user) if user.email.is_empty() => format!("{} (#{})", user.username, user.id),
        Some(user) => format!("{} <{}> (#{})", user.username, user.email, user.id),
        None => "Not logged in".to_string(),
    })
}
