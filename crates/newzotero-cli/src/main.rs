//! NewZotero CLI - collect excerpts and notes from your literature
//!
//! Talks to the NewZotero backend on behalf of a stored user ID.

mod cli;
mod commands;
mod config_profiles;
mod error;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::auth::{run_login, run_logout, run_whoami};
use crate::commands::feedback::run_feedback;
use crate::commands::files::run_files;
use crate::commands::notes::run_notes;
use crate::commands::search::run_search;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "newzotero=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Login {
            username,
            server_url,
        } => run_login(&username, server_url.as_deref(), profile).await?,
        Commands::Logout => run_logout(profile)?,
        Commands::Whoami => run_whoami(profile)?,
        Commands::Files { command } => run_files(command, profile).await?,
        Commands::Notes { command } => run_notes(command, profile).await?,
        Commands::Search { query, limit, json } => {
            run_search(&query, limit, json, profile).await?;
        }
        Commands::Feedback { email, message } => run_feedback(&email, &message, profile).await?,
    }

    Ok(())
}
