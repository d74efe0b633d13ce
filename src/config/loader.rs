//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
///
/// Apps without an alias get a generated one before validation.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    let mut config: ProxyConfig = toml::from_str(content)?;
    config.assign_missing_aliases(&mut rand::thread_rng());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assigns_aliases() {
        let config = parse_config(
            r#"
            [[apps]]
            address = "localhost:61345"
            element = "app-one"
            path = "/app1.js"
            targets = [{ path = "/test/app1" }]
            "#,
        )
        .unwrap();
        assert_eq!(config.apps[0].alias.len(), 4);
    }

    #[test]
    fn test_validation_error_display() {
        let err = parse_config(
            r#"
            [proxy]
            path_separator = ""
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().starts_with("Validation failed: path separator"));
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[proxy\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/kdex.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
