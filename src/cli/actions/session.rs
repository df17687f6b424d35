use super::{print_json, Console};
use crate::{cli::globals::GlobalArgs, session::LoginCredentials};
use anyhow::{anyhow, bail, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

#[derive(Debug)]
pub struct LoginArgs {
    pub globals: GlobalArgs,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: SecretString,
}

/// # Errors
/// Returns the login failure message when the server refuses the credentials.
pub async fn login(args: LoginArgs) -> Result<()> {
    let console = Console::open(&args.globals)?;
    let password = args.password.expose_secret();

    let credentials = match (args.username, args.email) {
        (Some(username), _) => LoginCredentials::username(username, password),
        (None, Some(email)) => LoginCredentials::email(email, password),
        (None, None) => bail!("either --username or --email is required"),
    };

    let profile = console
        .session
        .login(&credentials)
        .await
        .map_err(|err| anyhow!(err.message()))?;

    info!(user = %profile.username, role = %profile.role, "Signed in");
    println!("Signed in as {} ({})", profile.username, profile.role);

    Ok(())
}

/// # Errors
/// Returns an error if the stored session cannot be removed.
pub fn logout(globals: &GlobalArgs) -> Result<()> {
    let console = Console::open(globals)?;
    console.session.logout()?;
    println!("Signed out");
    Ok(())
}

/// # Errors
/// Returns an error when there is no valid session.
pub async fn whoami(globals: &GlobalArgs) -> Result<()> {
    let console = Console::open(globals)?;
    let state = console.session.restore().await;

    if let Some(profile) = state.profile() {
        return print_json(profile);
    }

    match state.last_error() {
        Some(message) => bail!("{message}"),
        None => bail!("not signed in"),
    }
}
