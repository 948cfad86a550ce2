//! User validation rules
//!
//! Every field owns an ordered list of rule objects. All rules of all fields
//! run on each validation and their violations are collected together, so a
//! caller can report every problem at once.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use validator::ValidateEmail;

use super::entity::User;
use super::registry::{ForbiddenEmailDomains, RestrictedWords};
use super::repository::UserRepository;
use crate::domain::DomainError;

pub const MIN_NAME_LENGTH: usize = 8;
pub const MAX_NAME_LENGTH: usize = 64;
pub const MAX_EMAIL_LENGTH: usize = 256;

/// Any character outside lowercase ASCII letters and digits
static FORBIDDEN_NAME_SYMBOLS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]").unwrap());

const TOO_SHORT_MESSAGE: &str =
    "This value is too short. It should have {{ limit }} characters or more.";
const TOO_LONG_MESSAGE: &str =
    "This value is too long. It should have {{ limit }} characters or less.";
const NOT_BLANK_MESSAGE: &str = "This value should not be blank.";
const INVALID_EMAIL_MESSAGE: &str = "This value is not a valid email address.";
const NAME_SYMBOLS_MESSAGE: &str = "The username \"{{ value }}\" contains forbidden symbols.";
const NAME_TAKEN_MESSAGE: &str = "The name \"{{ value }}\" is already in use.";
const EMAIL_TAKEN_MESSAGE: &str = "This email is already in use.";
const RESTRICTED_WORDS_MESSAGE: &str = "This username contains restricted words.";
const FORBIDDEN_DOMAIN_MESSAGE: &str = "The domain \"{{ domain }}\" is not allowed.";

/// Validated user field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserField {
    Name,
    Email,
}

impl UserField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
        }
    }

    fn value_of<'a>(&self, user: &'a User) -> &'a str {
        match self {
            Self::Name => user.name(),
            Self::Email => user.email(),
        }
    }
}

impl fmt::Display for UserField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single failed rule: message template, its parameters and the offending value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    field: UserField,
    template: String,
    parameters: Vec<(String, String)>,
    value: String,
}

impl Violation {
    /// Create a violation; `{{ value }}` is bound to the offending value
    pub fn new(field: UserField, template: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();

        Self {
            field,
            template: template.into(),
            parameters: vec![("{{ value }}".to_string(), value.clone())],
            value,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    pub fn field(&self) -> UserField {
        self.field
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Template with all parameters substituted
    pub fn message(&self) -> String {
        self.parameters
            .iter()
            .fold(self.template.clone(), |message, (name, value)| {
                message.replace(name.as_str(), value)
            })
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message())
    }
}

/// State a candidate is validated against
///
/// Holds the persisted version of the user when an existing user is being
/// re-validated, so unchanged unique values do not collide with themselves.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    persisted: Option<User>,
}

impl ValidationContext {
    /// Context for a user that is not stored yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for re-validating a stored user
    pub fn for_persisted(user: User) -> Self {
        Self {
            persisted: Some(user),
        }
    }

    fn persisted_value(&self, field: UserField) -> Option<&str> {
        self.persisted.as_ref().map(|user| field.value_of(user))
    }
}

/// A check applied to one field value
#[async_trait]
pub trait FieldRule: Send + Sync + fmt::Debug {
    async fn check(
        &self,
        field: UserField,
        value: &str,
        context: &ValidationContext,
    ) -> Result<Option<Violation>, DomainError>;
}

/// Rejects an empty value
#[derive(Debug, Clone, Copy, Default)]
pub struct NotBlank;

#[async_trait]
impl FieldRule for NotBlank {
    async fn check(
        &self,
        field: UserField,
        value: &str,
        _context: &ValidationContext,
    ) -> Result<Option<Violation>, DomainError> {
        if value.trim().is_empty() {
            return Ok(Some(Violation::new(field, NOT_BLANK_MESSAGE, value)));
        }

        Ok(None)
    }
}

/// Character count bounds
#[derive(Debug, Clone, Copy, Default)]
pub struct Length {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Length {
    pub fn between(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_most(max: usize) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }
}

#[async_trait]
impl FieldRule for Length {
    async fn check(
        &self,
        field: UserField,
        value: &str,
        _context: &ValidationContext,
    ) -> Result<Option<Violation>, DomainError> {
        let length = value.chars().count();

        if let Some(min) = self.min.filter(|min| length < *min) {
            return Ok(Some(
                Violation::new(field, TOO_SHORT_MESSAGE, value)
                    .with_parameter("{{ limit }}", min.to_string()),
            ));
        }

        if let Some(max) = self.max.filter(|max| length > *max) {
            return Ok(Some(
                Violation::new(field, TOO_LONG_MESSAGE, value)
                    .with_parameter("{{ limit }}", max.to_string()),
            ));
        }

        Ok(None)
    }
}

/// Email address shape
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailShape;

#[async_trait]
impl FieldRule for EmailShape {
    async fn check(
        &self,
        field: UserField,
        value: &str,
        _context: &ValidationContext,
    ) -> Result<Option<Violation>, DomainError> {
        if value.is_empty() || value.validate_email() {
            return Ok(None);
        }

        Ok(Some(Violation::new(field, INVALID_EMAIL_MESSAGE, value)))
    }
}

/// Only lowercase letters and digits
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowedSymbols;

#[async_trait]
impl FieldRule for AllowedSymbols {
    async fn check(
        &self,
        field: UserField,
        value: &str,
        _context: &ValidationContext,
    ) -> Result<Option<Violation>, DomainError> {
        if value.is_empty() || !FORBIDDEN_NAME_SYMBOLS.is_match(value) {
            return Ok(None);
        }

        Ok(Some(Violation::new(field, NAME_SYMBOLS_MESSAGE, value)))
    }
}

/// No restricted word inside the value
#[derive(Debug, Clone)]
pub struct NoRestrictedWords {
    registry: Arc<RestrictedWords>,
}

impl NoRestrictedWords {
    pub fn new(registry: Arc<RestrictedWords>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl FieldRule for NoRestrictedWords {
    async fn check(
        &self,
        field: UserField,
        value: &str,
        _context: &ValidationContext,
    ) -> Result<Option<Violation>, DomainError> {
        if value.is_empty() || !self.registry.contains_restricted(value) {
            return Ok(None);
        }

        Ok(Some(Violation::new(field, RESTRICTED_WORDS_MESSAGE, value)))
    }
}

/// Domain part of the email is not in the forbidden set
#[derive(Debug, Clone)]
pub struct AllowedEmailDomain {
    registry: Arc<ForbiddenEmailDomains>,
}

impl AllowedEmailDomain {
    pub fn new(registry: Arc<ForbiddenEmailDomains>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl FieldRule for AllowedEmailDomain {
    async fn check(
        &self,
        field: UserField,
        value: &str,
        _context: &ValidationContext,
    ) -> Result<Option<Violation>, DomainError> {
        let domain = match value.split('@').nth(1) {
            Some(domain) if !domain.trim().is_empty() => domain,
            _ => return Ok(None),
        };

        if !self.registry.is_forbidden(domain) {
            return Ok(None);
        }

        Ok(Some(
            Violation::new(field, FORBIDDEN_DOMAIN_MESSAGE, value)
                .with_parameter("{{ domain }}", domain.trim()),
        ))
    }
}

/// No other user holds the same name
pub struct UniqueName<R: UserRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: UserRepository + ?Sized> UniqueName<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

impl<R: UserRepository + ?Sized> fmt::Debug for UniqueName<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniqueName").finish()
    }
}

#[async_trait]
impl<R: UserRepository + ?Sized> FieldRule for UniqueName<R> {
    async fn check(
        &self,
        field: UserField,
        value: &str,
        context: &ValidationContext,
    ) -> Result<Option<Violation>, DomainError> {
        if value.is_empty() || is_own_value(context, field, value) {
            return Ok(None);
        }

        if self.repository.has_user_by_name(value).await? {
            return Ok(Some(Violation::new(field, NAME_TAKEN_MESSAGE, value)));
        }

        Ok(None)
    }
}

/// No other user holds the same email
pub struct UniqueEmail<R: UserRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: UserRepository + ?Sized> UniqueEmail<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

impl<R: UserRepository + ?Sized> fmt::Debug for UniqueEmail<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniqueEmail").finish()
    }
}

#[async_trait]
impl<R: UserRepository + ?Sized> FieldRule for UniqueEmail<R> {
    async fn check(
        &self,
        field: UserField,
        value: &str,
        context: &ValidationContext,
    ) -> Result<Option<Violation>, DomainError> {
        if value.is_empty() || is_own_value(context, field, value) {
            return Ok(None);
        }

        if self.repository.has_user_by_email(value).await? {
            return Ok(Some(Violation::new(field, EMAIL_TAKEN_MESSAGE, value)));
        }

        Ok(None)
    }
}

fn is_own_value(context: &ValidationContext, field: UserField, value: &str) -> bool {
    context
        .persisted_value(field)
        .is_some_and(|persisted| persisted.to_lowercase() == value.to_lowercase())
}

/// Violation messages used when the store itself rejects a duplicate
pub(crate) fn name_taken(value: &str) -> Violation {
    Violation::new(UserField::Name, NAME_TAKEN_MESSAGE, value)
}

pub(crate) fn email_taken(value: &str) -> Violation {
    Violation::new(UserField::Email, EMAIL_TAKEN_MESSAGE, value)
}

/// Ordered rule set for a user
#[derive(Debug, Default)]
pub struct UserValidator {
    rules: Vec<(UserField, Box<dyn FieldRule>)>,
}

impl UserValidator {
    /// Validator without any rule
    pub fn new() -> Self {
        Self::default()
    }

    /// Full rule set: shape, character set, restricted words, forbidden
    /// domains and uniqueness against the repository
    pub fn standard<R>(
        repository: Arc<R>,
        forbidden_domains: Arc<ForbiddenEmailDomains>,
        restricted_words: Arc<RestrictedWords>,
    ) -> Self
    where
        R: UserRepository + ?Sized + 'static,
    {
        Self::new()
            .with_rule(UserField::Name, Length::between(MIN_NAME_LENGTH, MAX_NAME_LENGTH))
            .with_rule(UserField::Name, UniqueName::new(repository.clone()))
            .with_rule(UserField::Name, AllowedSymbols)
            .with_rule(UserField::Name, NoRestrictedWords::new(restricted_words))
            .with_rule(UserField::Email, NotBlank)
            .with_rule(UserField::Email, Length::at_most(MAX_EMAIL_LENGTH))
            .with_rule(UserField::Email, EmailShape)
            .with_rule(UserField::Email, UniqueEmail::new(repository))
            .with_rule(UserField::Email, AllowedEmailDomain::new(forbidden_domains))
    }

    pub fn with_rule(mut self, field: UserField, rule: impl FieldRule + 'static) -> Self {
        self.rules.push((field, Box::new(rule)));
        self
    }

    /// Run every rule and collect all violations
    ///
    /// An error is returned only when a rule could not be evaluated, e.g. the
    /// repository lookup failed.
    pub async fn validate(
        &self,
        user: &User,
        context: &ValidationContext,
    ) -> Result<Vec<Violation>, DomainError> {
        let mut violations = Vec::new();

        for (field, rule) in &self.rules {
            if let Some(violation) = rule.check(*field, field.value_of(user), context).await? {
                violations.push(violation);
            }
        }

        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::repository::MockUserRepository;
    use crate::domain::user::UserId;

    fn ctx() -> ValidationContext {
        ValidationContext::new()
    }

    async fn check(rule: &dyn FieldRule, field: UserField, value: &str) -> Option<Violation> {
        rule.check(field, value, &ctx()).await.unwrap()
    }

    fn repository_with(
        names: &'static [&'static str],
        emails: &'static [&'static str],
    ) -> MockUserRepository {
        let mut repository = MockUserRepository::new();
        repository
            .expect_has_user_by_name()
            .returning(move |value| Ok(names.iter().any(|name| *name == value)));
        repository
            .expect_has_user_by_email()
            .returning(move |value| Ok(emails.iter().any(|email| *email == value)));
        repository
    }

    fn standard_validator(repository: MockUserRepository) -> UserValidator {
        UserValidator::standard(
            Arc::new(repository),
            Arc::new(ForbiddenEmailDomains::new(["forbidden.org"])),
            Arc::new(RestrictedWords::new(["admin", "root", "superuser"]).unwrap()),
        )
    }

    #[test]
    fn test_violation_message_rendering() {
        let violation = Violation::new(UserField::Name, NAME_SYMBOLS_MESSAGE, "Bad-Name");

        assert_eq!(
            violation.message(),
            "The username \"Bad-Name\" contains forbidden symbols."
        );
        assert_eq!(
            violation.to_string(),
            "name: The username \"Bad-Name\" contains forbidden symbols."
        );
        assert_eq!(violation.template(), NAME_SYMBOLS_MESSAGE);
        assert_eq!(violation.value(), "Bad-Name");
    }

    #[tokio::test]
    async fn test_length_bounds() {
        let rule = Length::between(8, 64);

        let short = check(&rule, UserField::Name, "short").await.unwrap();
        assert_eq!(
            short.message(),
            "This value is too short. It should have 8 characters or more."
        );

        let long = check(&rule, UserField::Name, &"a".repeat(65)).await.unwrap();
        assert_eq!(
            long.message(),
            "This value is too long. It should have 64 characters or less."
        );

        assert!(check(&rule, UserField::Name, "exactly8").await.is_none());
        assert!(check(&rule, UserField::Name, &"a".repeat(64)).await.is_none());
    }

    #[tokio::test]
    async fn test_length_counts_characters() {
        let rule = Length::at_most(3);

        assert!(check(&rule, UserField::Email, "äöü").await.is_none());
        assert!(check(&rule, UserField::Email, "äöüß").await.is_some());
    }

    #[tokio::test]
    async fn test_not_blank() {
        assert!(check(&NotBlank, UserField::Email, "").await.is_some());
        assert!(check(&NotBlank, UserField::Email, "   ").await.is_some());
        assert!(check(&NotBlank, UserField::Email, "a@b.com").await.is_none());
    }

    #[tokio::test]
    async fn test_email_shape() {
        assert!(check(&EmailShape, UserField::Email, "user@ok.com").await.is_none());
        assert!(check(&EmailShape, UserField::Email, "").await.is_none());
        assert!(check(&EmailShape, UserField::Email, "not-an-email").await.is_some());
        assert!(check(&EmailShape, UserField::Email, "user@").await.is_some());
        assert!(check(&EmailShape, UserField::Email, "@ok.com").await.is_some());
    }

    #[tokio::test]
    async fn test_allowed_symbols() {
        assert!(check(&AllowedSymbols, UserField::Name, "validname1").await.is_none());
        assert!(check(&AllowedSymbols, UserField::Name, "").await.is_none());
        assert!(check(&AllowedSymbols, UserField::Name, "InvalidName").await.is_some());
        assert!(check(&AllowedSymbols, UserField::Name, "invalid_name").await.is_some());
        assert!(check(&AllowedSymbols, UserField::Name, "invalid name").await.is_some());
        assert!(check(&AllowedSymbols, UserField::Name, "naïvename").await.is_some());
    }

    #[tokio::test]
    async fn test_restricted_words() {
        let rule = NoRestrictedWords::new(Arc::new(RestrictedWords::new(["admin"]).unwrap()));

        assert!(check(&rule, UserField::Name, "admin2").await.is_some());
        assert!(check(&rule, UserField::Name, "validname").await.is_none());
        assert!(check(&rule, UserField::Name, "").await.is_none());
    }

    #[tokio::test]
    async fn test_forbidden_domain() {
        let rule = AllowedEmailDomain::new(Arc::new(ForbiddenEmailDomains::new(["forbidden.org"])));

        let violation = check(&rule, UserField::Email, "user@forbidden.org").await.unwrap();
        assert_eq!(violation.message(), "The domain \"forbidden.org\" is not allowed.");
        assert_eq!(violation.value(), "user@forbidden.org");

        assert!(check(&rule, UserField::Email, "user@ok.com").await.is_none());
        assert!(check(&rule, UserField::Email, "no-domain").await.is_none());
        assert!(check(&rule, UserField::Email, "user@").await.is_none());
        assert!(check(&rule, UserField::Email, "").await.is_none());
    }

    #[tokio::test]
    async fn test_unique_name_queries_repository() {
        let rule = UniqueName::new(Arc::new(repository_with(&["takenname"], &[])));

        let violation = check(&rule, UserField::Name, "takenname").await.unwrap();
        assert_eq!(violation.message(), "The name \"takenname\" is already in use.");
        assert!(check(&rule, UserField::Name, "freename1").await.is_none());
    }

    #[tokio::test]
    async fn test_unique_rules_skip_blank_without_query() {
        let mut repository = MockUserRepository::new();
        repository.expect_has_user_by_name().never();
        repository.expect_has_user_by_email().never();
        let repository = Arc::new(repository);

        assert!(check(&UniqueName::new(repository.clone()), UserField::Name, "").await.is_none());
        assert!(check(&UniqueEmail::new(repository), UserField::Email, "").await.is_none());
    }

    #[tokio::test]
    async fn test_unique_email_ignores_own_persisted_value() {
        let mut repository = MockUserRepository::new();
        repository.expect_has_user_by_email().never();
        let rule = UniqueEmail::new(Arc::new(repository));

        let persisted = User::new("johndoe123", "john@example.com", None)
            .with_id(UserId::new(1).unwrap());
        let context = ValidationContext::for_persisted(persisted);

        let result = rule
            .check(UserField::Email, "john@example.com", &context)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_repository_failure_propagates() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_has_user_by_name()
            .returning(|_| Err(DomainError::storage("connection lost")));
        let rule = UniqueName::new(Arc::new(repository));

        let result = rule.check(UserField::Name, "somename1", &ctx()).await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }

    #[tokio::test]
    async fn test_standard_validator_accepts_valid_user() {
        let validator = standard_validator(repository_with(&[], &[]));
        let user = User::new("validname", "user@ok.com", None);

        let violations = validator.validate(&user, &ctx()).await.unwrap();
        assert!(violations.is_empty(), "unexpected violations: {:?}", violations);
    }

    #[tokio::test]
    async fn test_standard_validator_accumulates_violations() {
        let validator = standard_validator(repository_with(&["admin2"], &["user@forbidden.org"]));
        let user = User::new("admin2", "user@forbidden.org", None);

        let violations = validator.validate(&user, &ctx()).await.unwrap();
        let messages: Vec<String> = violations.iter().map(|v| v.to_string()).collect();

        assert_eq!(
            messages,
            vec![
                "name: This value is too short. It should have 8 characters or more.",
                "name: The name \"admin2\" is already in use.",
                "name: This username contains restricted words.",
                "email: This email is already in use.",
                "email: The domain \"forbidden.org\" is not allowed.",
            ]
        );
    }

    #[tokio::test]
    async fn test_standard_validator_blank_email() {
        let validator = standard_validator(repository_with(&[], &[]));
        let user = User::new("validname", "   ", None);

        let violations = validator.validate(&user, &ctx()).await.unwrap();

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field(), UserField::Email);
        assert_eq!(violations[0].message(), "This value should not be blank.");
    }

    #[tokio::test]
    async fn test_standard_validator_rejects_restricted_name() {
        let validator = standard_validator(repository_with(&[], &[]));
        let user = User::new("superadmin1", "user@ok.com", None);

        let violations = validator.validate(&user, &ctx()).await.unwrap();

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message(), "This username contains restricted words.");
    }
}
