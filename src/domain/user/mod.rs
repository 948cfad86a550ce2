//! User domain
//!
//! This module provides the user entity, its validation rules and the
//! lookup registries they consult, the repository trait and change events.

mod entity;
mod event;
mod registry;
mod repository;
mod validation;

pub use entity::{normalize_email, normalize_name, User, UserId};
pub use event::{UserEvent, UserEventKind, UserEventListener, UserEventPublisher};
pub use registry::{ForbiddenEmailDomains, RestrictedWords};
pub use repository::UserRepository;
pub use validation::{
    AllowedEmailDomain, AllowedSymbols, EmailShape, FieldRule, Length, NoRestrictedWords,
    NotBlank, UniqueEmail, UniqueName, UserField, UserValidator, ValidationContext, Violation,
    MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MIN_NAME_LENGTH,
};

pub(crate) use validation::{email_taken, name_taken};

#[cfg(test)]
pub use event::MockUserEventPublisher;
#[cfg(test)]
pub use repository::MockUserRepository;
