//! PostgreSQL user repository implementation

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, warn};

use crate::domain::user::{
    email_taken, name_taken, User, UserEvent, UserEventPublisher, UserId, UserRepository,
};
use crate::domain::DomainError;

const NAME_INDEX: &str = "users_name_uindex";
const EMAIL_INDEX: &str = "users_email_uindex";

/// State of a row read under `FOR UPDATE`
enum LockedRow {
    Missing,
    Deleted,
    Active,
}

/// PostgreSQL implementation of UserRepository
///
/// `update` and `soft_delete` lock the target row for the duration of their
/// transaction. Events are published only after a successful commit.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
    publisher: Arc<dyn UserEventPublisher>,
}

impl std::fmt::Debug for PostgresUserRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresUserRepository").finish()
    }
}

impl PostgresUserRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool, publisher: Arc<dyn UserEventPublisher>) -> Self {
        Self { pool, publisher }
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, DomainError> {
        self.pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))
    }

    /// Finish a transaction: commit on success, roll back and re-raise on error
    async fn finish<T>(
        tx: Transaction<'static, Postgres>,
        outcome: Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        match outcome {
            Ok(value) => {
                tx.commit()
                    .await
                    .map_err(|e| DomainError::storage(format!("Failed to commit: {}", e)))?;
                Ok(value)
            }
            Err(error) => {
                if let Err(e) = tx.rollback().await {
                    warn!(error = %e, "Failed to roll back transaction");
                }
                Err(error)
            }
        }
    }

    async fn apply_update(
        tx: &mut Transaction<'static, Postgres>,
        id: UserId,
        user: &User,
    ) -> Result<(), DomainError> {
        match lock_row(tx, id).await? {
            LockedRow::Active => {}
            LockedRow::Missing | LockedRow::Deleted => {
                return Err(DomainError::not_found(format!(
                    "User not found [id={}]",
                    id
                )));
            }
        }

        sqlx::query("UPDATE users SET name = $2, email = $3, notes = $4 WHERE id = $1")
            .bind(id.value())
            .bind(user.name())
            .bind(user.email().to_lowercase())
            .bind(user.notes())
            .execute(&mut **tx)
            .await
            .map_err(|e| map_write_error(e, user, "update"))?;

        Ok(())
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, notes, created, deleted
            FROM users
            WHERE id = $1 AND deleted IS NULL
            "#,
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get user: {}", e)))?;

        match row {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (name, email, notes, created)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(user.name())
        .bind(user.email().to_lowercase())
        .bind(user.notes())
        .bind(user.created())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &user, "create"))?;

        let id = UserId::new(id)
            .map_err(|e| DomainError::storage(format!("Invalid user ID from database: {}", e)))?;
        let created = user.with_id(id);

        debug!(user_id = %id, "Inserted user");
        self.publisher.publish(UserEvent::Created(created.clone())).await;

        Ok(created)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let id = user.require_id()?;

        let mut tx = self.begin().await?;
        let outcome = Self::apply_update(&mut tx, id, user).await;
        Self::finish(tx, outcome).await?;

        debug!(user_id = %id, "Updated user");
        self.publisher.publish(UserEvent::Updated(user.clone())).await;

        Ok(user.clone())
    }

    async fn soft_delete(&self, user: &User) -> Result<bool, DomainError> {
        let id = user.require_id()?;

        if user.is_deleted() {
            return Ok(false);
        }

        let mut deleted = user.clone();
        deleted.set_deleted(Utc::now())?;

        let mut tx = self.begin().await?;

        let state = match lock_row(&mut tx, id).await {
            Ok(state) => state,
            Err(e) => return Self::finish(tx, Err(e)).await,
        };

        if !matches!(state, LockedRow::Active) {
            if let Err(e) = tx.rollback().await {
                warn!(user_id = %id, error = %e, "Failed to roll back transaction");
            }
            debug!(user_id = %id, "User missing or already deleted, nothing to do");
            return Ok(false);
        }

        let outcome = sqlx::query("UPDATE users SET deleted = $2 WHERE id = $1")
            .bind(id.value())
            .bind(deleted.deleted())
            .execute(&mut *tx)
            .await
            .map(|_| ())
            .map_err(|e| DomainError::storage(format!("Failed to soft-delete user: {}", e)));
        Self::finish(tx, outcome).await?;

        debug!(user_id = %id, "Soft-deleted user");
        self.publisher.publish(UserEvent::Deleted(deleted)).await;

        Ok(true)
    }

    async fn has_user_by_name(&self, value: &str) -> Result<bool, DomainError> {
        if value.trim().is_empty() {
            return Ok(false);
        }

        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(name) = $1)")
            .bind(value.trim().to_lowercase())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to look up user name: {}", e)))
    }

    async fn has_user_by_email(&self, value: &str) -> Result<bool, DomainError> {
        if value.trim().is_empty() {
            return Ok(false);
        }

        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = $1)")
            .bind(value.trim().to_lowercase())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to look up user email: {}", e)))
    }
}

async fn lock_row(
    tx: &mut Transaction<'static, Postgres>,
    id: UserId,
) -> Result<LockedRow, DomainError> {
    let row = sqlx::query("SELECT id, deleted FROM users WHERE id = $1 FOR UPDATE")
        .bind(id.value())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to lock user row: {}", e)))?;

    let Some(row) = row else {
        return Ok(LockedRow::Missing);
    };

    let deleted: Option<DateTime<Utc>> = row
        .try_get("deleted")
        .map_err(|e| DomainError::storage(format!("Failed to read user row: {}", e)))?;

    Ok(if deleted.is_some() {
        LockedRow::Deleted
    } else {
        LockedRow::Active
    })
}

/// Map an insert/update error, turning unique index hits into violations
fn map_write_error(error: sqlx::Error, user: &User, operation: &str) -> DomainError {
    if let Some(db_error) = error.as_database_error() {
        if db_error.is_unique_violation() {
            return match db_error.constraint() {
                Some(NAME_INDEX) => DomainError::validation_failed(vec![name_taken(user.name())]),
                Some(EMAIL_INDEX) => {
                    DomainError::validation_failed(vec![email_taken(user.email())])
                }
                _ => DomainError::storage(format!("Failed to {} user: {}", operation, error)),
            };
        }
    }

    DomainError::storage(format!("Failed to {} user: {}", operation, error))
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> Result<User, DomainError> {
    let read = |e: sqlx::Error| DomainError::storage(format!("Failed to read user row: {}", e));

    let id: i64 = row.try_get("id").map_err(read)?;
    let name: String = row.try_get("name").map_err(read)?;
    let email: String = row.try_get("email").map_err(read)?;
    let notes: Option<String> = row.try_get("notes").map_err(read)?;
    let created: DateTime<Utc> = row.try_get("created").map_err(read)?;
    let deleted: Option<DateTime<Utc>> = row.try_get("deleted").map_err(read)?;

    let id = UserId::new(id)
        .map_err(|e| DomainError::storage(format!("Invalid user ID in database: {}", e)))?;

    User::restore(Some(id), &name, &email, notes, created, deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_write_error_non_database() {
        let user = User::new("johndoe123", "john@example.com", None);

        let error = map_write_error(sqlx::Error::RowNotFound, &user, "create");

        assert!(matches!(error, DomainError::Storage { .. }));
        assert!(error.to_string().contains("Failed to create user"));
    }

    #[test]
    fn test_index_names_match_migration() {
        let migrations = crate::infrastructure::storage::user_migrations();
        let schema = &migrations[0].up;

        assert!(schema.contains(NAME_INDEX));
        assert!(schema.contains(EMAIL_INDEX));
    }
}
