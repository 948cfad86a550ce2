//! Lookup tables consulted by the user validation rules
//!
//! Both registries are built once from configuration and are read-only
//! afterwards, so they can be shared freely behind an `Arc`.

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

use crate::domain::DomainError;

/// Set of email domains that may not be used for registration
#[derive(Debug, Clone, Default)]
pub struct ForbiddenEmailDomains {
    domains: HashSet<String>,
}

impl ForbiddenEmailDomains {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = domains
            .into_iter()
            .map(|d| d.as_ref().trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        Self { domains }
    }

    /// Exact match of the trimmed domain against the set
    pub fn is_forbidden(&self, domain: &str) -> bool {
        if self.domains.is_empty() {
            return false;
        }

        self.domains.contains(domain.trim())
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// Words that may not appear anywhere inside a user name
///
/// All words are compiled into one case-insensitive alternation.
#[derive(Debug, Clone, Default)]
pub struct RestrictedWords {
    pattern: Option<Regex>,
}

impl RestrictedWords {
    pub fn new<I, S>(words: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .map(|w| regex::escape(&w))
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = RegexBuilder::new(&alternatives.join("|"))
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                DomainError::configuration(format!("Invalid restricted words pattern: {}", e))
            })?;

        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// Check whether the name contains any restricted word
    pub fn contains_restricted(&self, username: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.is_match(&username.trim().to_lowercase()),
            None => false,
        }
    }
}
