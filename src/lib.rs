//! User Registry
//!
//! Validated create, update, soft-delete and lookup of user records with:
//! - Field rules for name and email (shape, symbols, restricted words,
//!   forbidden domains, uniqueness), reported all at once
//! - PostgreSQL storage with row locking, or an in-memory store
//! - Synchronous change events delivered after each commit

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use domain::user::{ForbiddenEmailDomains, RestrictedWords, UserRepository, UserValidator};
use infrastructure::storage::UserRepositoryFactory;
use infrastructure::user::{LoggingUserListener, UserEventNotifier, UserService};

/// Service over whichever backend the configuration selects
pub type AppUserService = UserService<dyn UserRepository>;

/// Build the user service from configuration
///
/// For the PostgreSQL backend this connects and applies pending migrations.
pub async fn create_user_service(config: &AppConfig) -> anyhow::Result<AppUserService> {
    let forbidden_domains = Arc::new(ForbiddenEmailDomains::new(
        &config.validation.forbidden_domains,
    ));
    let restricted_words = Arc::new(RestrictedWords::new(&config.validation.restricted_words)?);

    let notifier = UserEventNotifier::new().with_listener(Arc::new(LoggingUserListener::new()));

    let repository = UserRepositoryFactory::create(
        config.storage.backend,
        &config.database,
        Arc::new(notifier),
    )
    .await?;

    let validator = UserValidator::standard(repository.clone(), forbidden_domains, restricted_words);

    Ok(UserService::new(repository, validator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::StorageType;
    use crate::infrastructure::user::CreateUserRequest;

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.backend = StorageType::InMemory;
        config
    }

    #[tokio::test]
    async fn test_create_user_service_in_memory() {
        let service = create_user_service(&memory_config()).await.unwrap();

        let user = service
            .create(CreateUserRequest {
                name: "validname".to_string(),
                email: "user@ok.com".to_string(),
                notes: None,
            })
            .await
            .unwrap();

        assert_eq!(
            service.get_by_id(user.id().unwrap().value()).await.unwrap(),
            Some(user)
        );
    }

    #[tokio::test]
    async fn test_create_user_service_applies_configured_lists() {
        let mut config = memory_config();
        config.validation.forbidden_domains = vec!["example.net".to_string()];
        config.validation.restricted_words = vec!["moderator".to_string()];
        let service = create_user_service(&config).await.unwrap();

        let err = service
            .create(CreateUserRequest {
                name: "chiefmoderator".to_string(),
                email: "user@example.net".to_string(),
                notes: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.violations().len(), 2);

        service
            .create(CreateUserRequest {
                name: "adminuser".to_string(),
                email: "user@forbidden.org".to_string(),
                notes: None,
            })
            .await
            .unwrap();
    }
}
