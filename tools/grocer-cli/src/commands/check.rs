//! Show where navigating to a path would land.

use anyhow::Result;
use grocer_auth::GuardDecision;
use grocer_session::Navigation;

use super::CheckArgs;
use crate::context::Context;
use crate::output::decision_badge;

/// Run the check command.
pub async fn run(args: CheckArgs, ctx: &Context) -> Result<()> {
    let stack = ctx.stack()?;
    let outcome = stack.navigator.resolve(&args.path);

    if ctx.output.is_json() {
        ctx.output.json(&outcome);
        return Ok(());
    }

    match &outcome {
        Navigation::Render { path, route } => {
            ctx.output.success(&format!(
                "{} {}",
                path,
                decision_badge(GuardDecision::Render)
            ));
            if let Some(route) = route {
                ctx.output.kv("section", &route.title);
            }
        }
        Navigation::Redirect { from, to, decision } => {
            ctx.output
                .warn(&format!("{} {} -> {}", from, decision_badge(*decision), to));
        }
    }
    Ok(())
}
