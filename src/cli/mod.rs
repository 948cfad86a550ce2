//! CLI module for the user registry
//!
//! Provides subcommands for managing the schema and user records:
//! - `migrate`: apply (or revert) the users schema
//! - `create`, `update`, `delete`, `get`: user operations

pub mod migrate;
pub mod user;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging::init_logging;

/// User Registry - validated user records with soft delete
#[derive(Parser)]
#[command(name = "user-registry")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply pending schema migrations
    Migrate(migrate::MigrateArgs),

    /// Create a user
    Create(user::CreateArgs),

    /// Change name, email or notes of a user
    Update(user::UpdateArgs),

    /// Soft-delete a user
    Delete(user::IdArgs),

    /// Print a user as JSON
    Get(user::IdArgs),
}

/// Load `.env` and configuration, then install logging
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_logging(&config.logging);

    Ok(config)
}
