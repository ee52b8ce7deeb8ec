//! Call an API path with the current session.

use anyhow::{Context as _, Result};
use grocer_data::ApiRequest;

use super::GetArgs;
use crate::context::Context;

/// Run the get command.
pub async fn run(args: GetArgs, ctx: &Context) -> Result<()> {
    let stack = ctx.stack()?;
    if !args.public && !stack.session.is_authenticated() {
        ctx.output
            .warn("Not signed in; the request goes out without a token");
    }

    let mut request = ApiRequest::get(args.path.as_str()).accept("application/json");
    if args.public {
        request = request.public();
    }

    let spinner = ctx.output.spinner(&format!("GET {}", args.path));
    let result = stack.api.send(request).await;
    spinner.finish_and_clear();

    // A refresh may have rotated cookies, or a failed one signed us out.
    ctx.save_cookies(&stack)?;
    let response = result.with_context(|| format!("GET {} failed", args.path))?;

    ctx.output.debug(&format!(
        "{} {} ({} bytes, {} refresh calls)",
        response.status,
        response.content_type().unwrap_or("no content type"),
        response.body.len(),
        stack.api.coordinator().refresh_count()
    ));

    match response.json::<serde_json::Value>() {
        Ok(value) => ctx.output.json(&value),
        Err(_) => ctx.output.raw(&response.text().unwrap_or_default()),
    }
    Ok(())
}
