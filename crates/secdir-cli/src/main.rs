//! CLI entry point for secdir.
//!
//! This binary provides the `secdir` command: the interactive administrator
//! menu, one-shot settings and user subcommands, and the login checker.

mod cli;
mod commands;
mod config;
mod helpers;
mod menu;
mod session;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::Directory;
use crate::config::DirectoryConfig;

fn main() -> Result<ExitCode> {
    // A missing .env is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    helpers::init_tracing("warn");

    let config = DirectoryConfig::load(&cli.config)?;
    let dir = Directory::open(&config)?;

    match cli.command {
        Commands::Menu => commands::cmd_menu(&dir),
        Commands::Settings { action } => commands::cmd_settings(&dir, action),
        Commands::Users { action } => commands::cmd_users(&dir, action),
        Commands::Login => commands::cmd_login(&dir),
    }
}
