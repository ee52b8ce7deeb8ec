//! Sign-in command.

use std::io::BufRead;

use anyhow::{bail, Context as _, Result};
use dialoguer::{Input, Password};
use grocer_auth::LoginCredentials;
use grocer_session::ClientError;

use super::LoginArgs;
use crate::context::Context;
use crate::output::{role_badge, status_badge};

/// Run the login command.
pub async fn run(args: LoginArgs, ctx: &Context) -> Result<()> {
    let identifier = match args.identifier {
        Some(identifier) => identifier,
        None => Input::<String>::new()
            .with_prompt("Email or username")
            .interact_text()
            .context("Failed to read identifier")?,
    };

    let credential = if args.password_stdin {
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read password from stdin")?;
        line.trim_end_matches(['\r', '\n']).to_string()
    } else {
        Password::new()
            .with_prompt("Password")
            .interact()
            .context("Failed to read password")?
    };
    if credential.is_empty() {
        bail!("Password must not be empty");
    }

    let stack = ctx.stack()?;
    let spinner = ctx.output.spinner(&format!("Signing in as {}...", identifier));
    let result = stack
        .session
        .login(&LoginCredentials::new(identifier, credential))
        .await;
    spinner.finish_and_clear();

    let identity = match result {
        Ok(identity) => identity,
        Err(ClientError::CredentialsRejected { message, .. }) => bail!("Sign-in rejected: {}", message),
        Err(e) => return Err(e).context("Sign-in failed"),
    };
    ctx.save_cookies(&stack)?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "username": identity.username,
            "role": identity.role,
            "profile": identity.profile,
        }));
        return Ok(());
    }

    ctx.output.success(&format!(
        "Signed in as {} ({})",
        identity.display_name(),
        role_badge(identity.role)
    ));
    ctx.output.kv("status", &status_badge(identity.profile.status));
    Ok(())
}
