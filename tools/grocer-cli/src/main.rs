//! Grocer CLI - command line client for the Grocer admin dashboard.
//!
//! Commands:
//! - `grocer login` - Sign in and keep the session
//! - `grocer logout` - Sign out
//! - `grocer whoami` - Show the signed-in identity
//! - `grocer get` - Call an API endpoint with the session
//! - `grocer routes` - List dashboard sections
//! - `grocer check` - Show where navigating to a path would land
//! - `grocer config` - Manage configuration

mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CheckArgs, ConfigArgs, GetArgs, LoginArgs, RoutesArgs};

/// Grocer CLI - Sign in to the admin dashboard and call its API
#[derive(Parser)]
#[command(name = "grocer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in
    Login(LoginArgs),

    /// Sign out
    Logout,

    /// Show the signed-in identity
    Whoami,

    /// GET an API path with the current session
    Get(GetArgs),

    /// List dashboard sections
    Routes(RoutesArgs),

    /// Show where navigating to a path would land
    Check(CheckArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Log filter from `GROCER_LOG`, raised to debug by `--verbose`.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("GROCER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = output::Output::new(cli.verbose, cli.json);

    let config_path = cli.config.as_deref();
    let ctx = match context::Context::load(config_path, output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Login(args) => commands::login::run(args, &ctx).await,
        Commands::Logout => commands::logout::run(&ctx).await,
        Commands::Whoami => commands::whoami::run(&ctx).await,
        Commands::Get(args) => commands::get::run(args, &ctx).await,
        Commands::Routes(args) => commands::routes::run(args, &ctx).await,
        Commands::Check(args) => commands::check::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
