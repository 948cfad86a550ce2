use serde::Deserialize;

use crate::infrastructure::storage::{PostgresConfig, StorageType};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: PostgresConfig,
    pub storage: StorageConfig,
    pub validation: ValidationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageType,
}

/// Inputs to the user validation rules
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Email domains that may not register
    pub forbidden_domains: Vec<String>,
    /// Words that may not appear anywhere in a user name
    pub restricted_words: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            forbidden_domains: vec!["forbidden.org".to_string()],
            restricted_words: ["admin", "root", "superuser"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("validation.forbidden_domains")
                    .with_list_parse_key("validation.restricted_words")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.storage.backend, StorageType::Postgres);
        assert_eq!(config.validation.forbidden_domains, vec!["forbidden.org"]);
        assert_eq!(
            config.validation.restricted_words,
            vec!["admin", "root", "superuser"]
        );
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_sources_keep_defaults() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [storage]
                backend = "memory"

                [validation]
                restricted_words = ["moderator"]

                [logging]
                format = "json"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.storage.backend, StorageType::InMemory);
        assert_eq!(config.validation.restricted_words, vec!["moderator"]);
        assert_eq!(config.validation.forbidden_domains, vec!["forbidden.org"]);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.database.max_connections, 10);
    }
}
