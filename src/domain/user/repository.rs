//! User repository trait

use async_trait::async_trait;

use super::entity::{User, UserId};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Persistence gateway for users
///
/// Implementations publish a change event after each successful mutation and
/// only after the mutation is durable.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Get a user that exists and is not soft-deleted
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, DomainError>;

    /// Insert a new user and return it with its assigned ID
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Persist name, email and notes of an existing, not deleted user
    async fn update(&self, user: &User) -> Result<User, DomainError>;

    /// Stamp the user as deleted
    ///
    /// Returns `false` without error when the user is missing or already deleted.
    async fn soft_delete(&self, user: &User) -> Result<bool, DomainError>;

    /// Case-insensitive name lookup across all rows, blank input is never taken
    async fn has_user_by_name(&self, value: &str) -> Result<bool, DomainError>;

    /// Case-insensitive email lookup across all rows, blank input is never taken
    async fn has_user_by_email(&self, value: &str) -> Result<bool, DomainError>;

    /// Get a user or fail with `NotFound`
    async fn require_by_id(&self, id: UserId) -> Result<User, DomainError> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User not found [id={}]", id)))
    }
}
