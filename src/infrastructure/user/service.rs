//! User service: validation, persistence and lookups

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::domain::user::{User, UserId, UserRepository, UserValidator, ValidationContext};
use crate::domain::DomainError;

/// Request for creating a new user
#[derive(Debug, Clone, Default)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub notes: Option<String>,
}

/// Request for changing an existing user; absent fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    /// An empty string clears the notes
    pub notes: Option<String>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.notes.is_none()
    }
}

/// Entry point for user use cases
///
/// Every write is validated against the full rule set before it reaches the
/// repository; the repository publishes the resulting events.
pub struct UserService<R: UserRepository + ?Sized> {
    repository: Arc<R>,
    validator: UserValidator,
}

impl<R: UserRepository + ?Sized> UserService<R> {
    pub fn new(repository: Arc<R>, validator: UserValidator) -> Self {
        Self {
            repository,
            validator,
        }
    }

    /// Validate and insert a new user
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, request: CreateUserRequest) -> Result<User, DomainError> {
        let user = User::new(&request.name, &request.email, non_blank(request.notes));

        let violations = self
            .validator
            .validate(&user, &ValidationContext::new())
            .await?;
        if !violations.is_empty() {
            debug!(count = violations.len(), "Rejected new user");
            return Err(DomainError::validation_failed(violations));
        }

        self.repository.create(user).await
    }

    /// Apply the present fields of `request` to an existing user
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: i64, request: UpdateUserRequest) -> Result<User, DomainError> {
        let persisted = self.load(id).await?;
        let mut user = persisted.clone();

        if let Some(name) = &request.name {
            user.set_name(name);
        }
        if let Some(email) = &request.email {
            user.set_email(email);
        }
        if let Some(notes) = request.notes {
            user.set_notes(non_blank(Some(notes)));
        }

        let violations = self
            .validator
            .validate(&user, &ValidationContext::for_persisted(persisted))
            .await?;
        if !violations.is_empty() {
            debug!(count = violations.len(), "Rejected user update");
            return Err(DomainError::validation_failed(violations));
        }

        self.repository.update(&user).await
    }

    /// Soft-delete an existing user
    ///
    /// Returns `false` when a concurrent request deleted the user first.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let user = self.load(id).await?;
        self.repository.soft_delete(&user).await
    }

    /// Get a user that exists and is not deleted
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, DomainError> {
        let id = UserId::new(id)?;
        self.repository.get_by_id(id).await
    }

    async fn load(&self, id: i64) -> Result<User, DomainError> {
        let id = UserId::new(id)?;

        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User not found [id={}]", id)))
    }
}

/// Blank notes are stored as no notes
fn non_blank(notes: Option<String>) -> Option<String> {
    notes.filter(|n| !n.trim().is_empty())
}
