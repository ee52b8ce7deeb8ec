//! Show the signed-in identity.

use anyhow::Result;

use crate::context::Context;
use crate::output::{role_badge, status_badge};

/// Run the whoami command.
pub async fn run(ctx: &Context) -> Result<()> {
    let stack = ctx.stack()?;
    let Some(identity) = stack.session.current_identity() else {
        if ctx.output.is_json() {
            ctx.output.json(&serde_json::Value::Null);
        } else {
            ctx.output.warn("Not signed in. Run `grocer login` first.");
        }
        return Ok(());
    };

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "username": identity.username,
            "role": identity.role,
            "profile": identity.profile,
        }));
        return Ok(());
    }

    let profile = &identity.profile;
    ctx.output.header(identity.display_name());
    ctx.output.kv("username", &identity.username);
    ctx.output.kv("role", &role_badge(identity.role));
    ctx.output.kv("status", &status_badge(profile.status));
    for (key, value) in [
        ("id", &profile.id),
        ("email", &profile.email),
        ("phone", &profile.phone),
    ] {
        if let Some(value) = value {
            ctx.output.kv(key, value);
        }
    }
    if profile.is_placeholder() {
        ctx.output.warn("Stored profile could not be read");
    }
    Ok(())
}
