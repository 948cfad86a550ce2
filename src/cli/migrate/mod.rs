//! Migrate command - applies the users schema to PostgreSQL

use clap::Args;
use tracing::{info, warn};

use crate::infrastructure::storage::{
    connect, revert_last_user_migration, run_user_migrations, PostgresMigrator, StorageType,
};

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Revert the latest applied migration instead
    #[arg(long)]
    pub revert: bool,
}

/// Run the migrate command
pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    if config.storage.backend == StorageType::InMemory {
        warn!("Storage backend is in-memory, nothing to migrate");
        return Ok(());
    }

    let pool = connect(&config.database).await?;

    if args.revert {
        match revert_last_user_migration(&pool).await? {
            Some(version) => println!("Reverted migration {}", version),
            None => println!("No migration to revert"),
        }
        return Ok(());
    }

    let applied = run_user_migrations(&pool).await?;
    let version = PostgresMigrator::new(pool.clone()).current_version().await?;

    info!(applied, ?version, "Migrations complete");
    println!(
        "Applied {} migration(s), schema version {}",
        applied,
        version.unwrap_or_default()
    );

    Ok(())
}
