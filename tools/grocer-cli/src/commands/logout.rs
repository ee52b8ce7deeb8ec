//! Sign-out command.

use anyhow::Result;

use crate::context::Context;

/// Run the logout command.
pub async fn run(ctx: &Context) -> Result<()> {
    let stack = ctx.stack()?;
    if !stack.session.is_authenticated() {
        ctx.output.info("Not signed in");
        return Ok(());
    }

    let spinner = ctx.output.spinner("Signing out...");
    stack.session.logout().await;
    spinner.finish_and_clear();
    ctx.save_cookies(&stack)?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "signed_out": true }));
    } else {
        ctx.output.success("Signed out");
    }
    Ok(())
}
