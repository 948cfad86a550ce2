//! User entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// User identifier assigned by the store - always positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct UserId(i64);

impl UserId {
    /// Create a new UserId, rejecting zero and negative values
    pub fn new(id: i64) -> Result<Self, DomainError> {
        if id <= 0 {
            return Err(DomainError::invalid_argument(format!(
                "User ID must be greater than 0, got {}",
                id
            )));
        }

        Ok(Self(id))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for UserId {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for i64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trim a user name
pub fn normalize_name(name: &str) -> String {
    name.trim().to_string()
}

/// Trim and lowercase an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User record with soft-delete support
///
/// Name and email are normalized on every write. `created` never changes after
/// construction and `deleted` can be set only once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// Identifier, absent until the store assigns one
    id: Option<UserId>,
    name: String,
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    created: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new, not yet persisted user
    pub fn new(name: &str, email: &str, notes: Option<String>) -> Self {
        Self {
            id: None,
            name: normalize_name(name),
            email: normalize_email(email),
            notes,
            created: Utc::now(),
            deleted: None,
        }
    }

    /// Rebuild a user from stored state, checking temporal ordering
    pub fn restore(
        id: Option<UserId>,
        name: &str,
        email: &str,
        notes: Option<String>,
        created: DateTime<Utc>,
        deleted: Option<DateTime<Utc>>,
    ) -> Result<Self, DomainError> {
        let now = Utc::now();

        if let Some(deleted) = deleted {
            if created > deleted {
                return Err(DomainError::logic("User is deleted before created"));
            }

            if deleted > now {
                return Err(DomainError::logic("User is deleted in the future"));
            }
        }

        if created > now {
            return Err(DomainError::logic("User is created in the future"));
        }

        Ok(Self {
            id,
            name: normalize_name(name),
            email: normalize_email(email),
            notes,
            created,
            deleted,
        })
    }

    // Getters

    pub fn id(&self) -> Option<UserId> {
        self.id
    }

    /// Identifier of a persisted user
    pub fn require_id(&self) -> Result<UserId, DomainError> {
        self.id
            .ok_or_else(|| DomainError::invalid_argument("User has no ID assigned"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn deleted(&self) -> Option<DateTime<Utc>> {
        self.deleted
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }

    // Mutators

    pub fn set_name(&mut self, name: &str) {
        self.name = normalize_name(name);
    }

    pub fn set_email(&mut self, email: &str) {
        self.email = normalize_email(email);
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
    }

    /// Mark the user as deleted at the given moment
    pub fn set_deleted(&mut self, deleted: DateTime<Utc>) -> Result<(), DomainError> {
        if self.deleted.is_some() {
            return Err(DomainError::logic("User is already deleted"));
        }

        if self.created > deleted {
            return Err(DomainError::logic("User is deleted before created"));
        }

        if deleted > Utc::now() {
            return Err(DomainError::logic("User is deleted in the future"));
        }

        self.deleted = Some(deleted);
        Ok(())
    }

    pub(crate) fn with_id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }
}
