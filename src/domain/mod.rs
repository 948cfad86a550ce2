//! Domain layer - User entity, validation rules and persistence contracts

pub mod error;
pub mod user;

pub use error::DomainError;
pub use user::{
    User, UserEvent, UserEventKind, UserEventListener, UserEventPublisher, UserId,
    UserRepository, UserValidator, Violation,
};
