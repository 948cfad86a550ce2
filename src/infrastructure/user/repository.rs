//! In-memory user repository implementation

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::user::{
    email_taken, name_taken, User, UserEvent, UserEventPublisher, UserId, UserRepository,
};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<UserId, User>,
}

impl Table {
    /// Unique index check over all rows, soft-deleted ones included
    fn check_unique(&self, user: &User, except: Option<UserId>) -> Result<(), DomainError> {
        let mut violations = Vec::new();
        let others = self.rows.iter().filter(|(id, _)| Some(**id) != except);

        for (_, row) in others {
            if row.name() == user.name() {
                violations.push(name_taken(user.name()));
            }
            if row.email() == user.email() {
                violations.push(email_taken(user.email()));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(DomainError::validation_failed(violations))
        }
    }
}

/// In-memory implementation of UserRepository
///
/// The table mutex is held for the whole read-check-write sequence of a
/// mutation, which gives the same isolation as a row lock. Events are
/// published after the mutex is released.
pub struct InMemoryUserRepository {
    table: Mutex<Table>,
    publisher: Arc<dyn UserEventPublisher>,
}

impl std::fmt::Debug for InMemoryUserRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryUserRepository").finish()
    }
}

impl InMemoryUserRepository {
    /// Create a new empty repository
    pub fn new(publisher: Arc<dyn UserEventPublisher>) -> Self {
        Self {
            table: Mutex::new(Table {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
            publisher,
        }
    }

    /// Number of stored rows, soft-deleted ones included
    pub async fn row_count(&self) -> usize {
        self.table.lock().await.rows.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, DomainError> {
        let table = self.table.lock().await;

        Ok(table.rows.get(&id).filter(|u| !u.is_deleted()).cloned())
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let created = {
            let mut table = self.table.lock().await;
            table.check_unique(&user, None)?;

            let id = UserId::new(table.next_id)?;
            table.next_id += 1;

            let created = user.with_id(id);
            table.rows.insert(id, created.clone());
            created
        };

        debug!(user_id = ?created.id(), "Inserted user");
        self.publisher.publish(UserEvent::Created(created.clone())).await;

        Ok(created)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let id = user.require_id()?;

        {
            let mut table = self.table.lock().await;

            match table.rows.get(&id) {
                Some(row) if !row.is_deleted() => {}
                _ => {
                    return Err(DomainError::not_found(format!(
                        "User not found [id={}]",
                        id
                    )));
                }
            }

            table.check_unique(user, Some(id))?;

            if let Some(row) = table.rows.get_mut(&id) {
                row.set_name(user.name());
                row.set_email(user.email());
                row.set_notes(user.notes().map(str::to_string));
            }
        }

        debug!(user_id = %id, "Updated user");
        self.publisher.publish(UserEvent::Updated(user.clone())).await;

        Ok(user.clone())
    }

    async fn soft_delete(&self, user: &User) -> Result<bool, DomainError> {
        let id = user.require_id()?;
        let deleted_at = Utc::now();

        let deleted = {
            let mut table = self.table.lock().await;

            let row = match table.rows.get_mut(&id) {
                Some(row) if !row.is_deleted() => row,
                _ => {
                    debug!(user_id = %id, "User missing or already deleted, nothing to do");
                    return Ok(false);
                }
            };

            row.set_deleted(deleted_at)?;
            row.clone()
        };

        debug!(user_id = %id, "Soft-deleted user");
        self.publisher.publish(UserEvent::Deleted(deleted)).await;

        Ok(true)
    }

    async fn has_user_by_name(&self, value: &str) -> Result<bool, DomainError> {
        if value.trim().is_empty() {
            return Ok(false);
        }

        let needle = value.trim().to_lowercase();
        let table = self.table.lock().await;

        Ok(table.rows.values().any(|u| u.name().to_lowercase() == needle))
    }

    async fn has_user_by_email(&self, value: &str) -> Result<bool, DomainError> {
        if value.trim().is_empty() {
            return Ok(false);
        }

        let needle = value.trim().to_lowercase();
        let table = self.table.lock().await;

        Ok(table.rows.values().any(|u| u.email() == needle))
    }
}
