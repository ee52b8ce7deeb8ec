//! CLI command implementations.

pub mod check;
pub mod config;
pub mod get;
pub mod login;
pub mod logout;
pub mod routes;
pub mod whoami;

use clap::{Args, Subcommand};

/// Arguments for the login command.
#[derive(Args)]
pub struct LoginArgs {
    /// Email or username (prompted when omitted).
    pub identifier: Option<String>,

    /// Read the password from the first line of stdin instead of prompting.
    #[arg(long)]
    pub password_stdin: bool,
}

/// Arguments for the get command.
#[derive(Args)]
pub struct GetArgs {
    /// API path, relative to the base URL.
    pub path: String,

    /// Send without credentials.
    #[arg(long)]
    pub public: bool,
}

/// Arguments for the routes command.
#[derive(Args)]
pub struct RoutesArgs {
    /// List every section, not only the ones the current role may open.
    #[arg(short, long)]
    pub all: bool,
}

/// Arguments for the check command.
#[derive(Args)]
pub struct CheckArgs {
    /// Dashboard path to check.
    pub path: String,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration.
    Show,
    /// Write a default config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the configuration.
    Validate,
}
