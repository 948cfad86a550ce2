//! User infrastructure module
//!
//! Repository gateways (PostgreSQL and in-memory), synchronous event
//! dispatch and the user service.

mod notifier;
mod postgres_repository;
mod repository;
mod service;

pub use notifier::{LoggingUserListener, UserEventNotifier};
pub use postgres_repository::PostgresUserRepository;
pub use repository::InMemoryUserRepository;
pub use service::{CreateUserRequest, UpdateUserRequest, UserService};
