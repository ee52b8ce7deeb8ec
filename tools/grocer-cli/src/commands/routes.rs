//! List dashboard sections.

use anyhow::Result;
use grocer_auth::DashboardRoute;

use super::RoutesArgs;
use crate::context::Context;
use crate::output::role_badge;

/// Run the routes command.
pub async fn run(args: RoutesArgs, ctx: &Context) -> Result<()> {
    let stack = ctx.stack()?;
    let routes = stack.navigator.routes();
    let identity = stack.session.current_identity();

    let listed: Vec<&DashboardRoute> = match (&identity, args.all) {
        (Some(identity), false) => routes.visible_for(identity.role).collect(),
        _ => routes.routes().iter().collect(),
    };

    if ctx.output.is_json() {
        ctx.output.json(&listed);
        return Ok(());
    }

    match &identity {
        Some(identity) if !args.all => {
            ctx.output.header(&format!("Sections for {}", identity.role))
        }
        Some(_) => ctx.output.header("All sections"),
        None => {
            ctx.output.header("All sections");
            ctx.output.info("Not signed in; every section redirects to the login screen");
        }
    }

    let widths = [16, 20, 10];
    ctx.output.table_row(&["PATH", "TITLE", "ROLE"], &widths);
    for route in listed {
        let role = route
            .requirement
            .map(role_badge)
            .unwrap_or_else(|| "any".to_string());
        ctx.output
            .table_row(&[route.path.as_str(), route.title.as_str(), role.as_str()], &widths);
    }
    Ok(())
}
