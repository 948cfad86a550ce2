//! Runtime selection of the user store backend

use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::domain::user::{UserEventPublisher, UserRepository};
use crate::domain::DomainError;
use crate::infrastructure::user::{InMemoryUserRepository, PostgresUserRepository};

use super::migrations::run_user_migrations;
use super::postgres::{connect, PostgresConfig};

/// Supported storage backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum StorageType {
    /// Process-local table, lost on exit
    InMemory,
    #[default]
    Postgres,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InMemory => "memory",
            Self::Postgres => "postgres",
        }
    }
}

impl FromStr for StorageType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            other => Err(DomainError::configuration(format!(
                "Unknown storage backend '{}'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for StorageType {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the user repository for a backend
#[derive(Debug)]
pub struct UserRepositoryFactory;

impl UserRepositoryFactory {
    /// Create a repository. The Postgres backend connects and applies
    /// pending migrations first.
    pub async fn create(
        backend: StorageType,
        database: &PostgresConfig,
        publisher: Arc<dyn UserEventPublisher>,
    ) -> Result<Arc<dyn UserRepository>, DomainError> {
        info!(backend = %backend, "Creating user repository");

        match backend {
            StorageType::InMemory => Ok(Self::create_in_memory(publisher)),
            StorageType::Postgres => {
                let pool = connect(database).await?;
                let applied = run_user_migrations(&pool).await?;
                if applied > 0 {
                    info!(applied, "Applied pending user migrations");
                }
                Ok(Arc::new(PostgresUserRepository::new(pool, publisher)))
            }
        }
    }

    pub fn create_in_memory(publisher: Arc<dyn UserEventPublisher>) -> Arc<dyn UserRepository> {
        Arc::new(InMemoryUserRepository::new(publisher))
    }
}
