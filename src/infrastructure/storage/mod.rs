//! Storage infrastructure - connection pooling, schema and backend selection

mod factory;
pub mod migrations;
mod postgres;

pub use factory::{StorageType, UserRepositoryFactory};
pub use migrations::{
    revert_last_user_migration, run_user_migrations, user_migrations, Migration, PostgresMigrator,
};
pub use postgres::{connect, PostgresConfig};
