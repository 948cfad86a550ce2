//! User change events

use async_trait::async_trait;
use serde::Serialize;

use super::entity::User;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Kind of change applied to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserEventKind {
    Created,
    Updated,
    Deleted,
}

impl UserEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for UserEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Notification emitted after a committed user mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "user", rename_all = "snake_case")]
pub enum UserEvent {
    Created(User),
    Updated(User),
    Deleted(User),
}

impl UserEvent {
    pub fn kind(&self) -> UserEventKind {
        match self {
            Self::Created(_) => UserEventKind::Created,
            Self::Updated(_) => UserEventKind::Updated,
            Self::Deleted(_) => UserEventKind::Deleted,
        }
    }

    /// The affected user
    pub fn user(&self) -> &User {
        match self {
            Self::Created(user) | Self::Updated(user) | Self::Deleted(user) => user,
        }
    }
}

/// Sink the repository hands its events to
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserEventPublisher: Send + Sync {
    /// Deliver an event; never fails from the caller's point of view
    async fn publish(&self, event: UserEvent);
}

/// Subscriber reacting to user events
#[async_trait]
pub trait UserEventListener: Send + Sync + std::fmt::Debug {
    async fn on_event(&self, event: &UserEvent) -> Result<(), DomainError>;
}
