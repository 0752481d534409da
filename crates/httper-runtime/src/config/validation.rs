//! Configuration validation utilities.

use std::collections::HashSet;

use httper_core::{GenerateConfig, ReservedNames};

use super::error::{ConfigError, ConfigResult};
use super::schema::{HttperConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &HttperConfig) -> ConfigResult<()> {
    validate_generate_config(&config.generate)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_generate_config(config: &GenerateConfig) -> ConfigResult<()> {
    validate_reserved_names(&config.reserved)?;

    config
        .parse_runtime_path()
        .map_err(|e| ConfigError::validation(e.to_string()))?;

    Ok(())
}

/// Reserved names must be distinct identifiers.
fn validate_reserved_names(reserved: &ReservedNames) -> ConfigResult<()> {
    let names = [
        ("reserved.raw_body", &reserved.raw_body),
        ("reserved.writer", &reserved.writer),
        ("reserved.request", &reserved.request),
    ];

    let mut seen = HashSet::new();
    for (field, name) in names {
        if !is_identifier(name) {
            return Err(ConfigError::validation(format!(
                "{field} must be an identifier, got {name:?}"
            )));
        }
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::validation(format!(
                "{field} duplicates another reserved name: {name}"
            )));
        }
    }

    Ok(())
}

fn validate_logging_config(config: &LoggingConfig) -> ConfigResult<()> {
    if config.output == LogOutput::File && config.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output is \"file\"",
        ));
    }
    Ok(())
}

/// A Rust identifier that is not a keyword.
fn is_identifier(name: &str) -> bool {
    syn::parse_str::<syn::Ident>(name).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&HttperConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_reserved_name() {
        let mut config = HttperConfig::default();
        config.generate.reserved.writer = String::new();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_duplicate_reserved_names() {
        let mut config = HttperConfig::default();
        config.generate.reserved.request = "w".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("reserved.request"));
    }

    #[test]
    fn test_bad_runtime_path() {
        let mut config = HttperConfig::default();
        config.generate.runtime_path = "::".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = HttperConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("httper.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("req_body"));
        assert!(is_identifier("_w"));
        assert!(!is_identifier("_"));
        assert!(!is_identifier("1w"));
        assert!(!is_identifier("raw-body"));
        assert!(!is_identifier("type"));
        assert!(!is_identifier("self"));
    }

    #[test]
    fn test_keyword_reserved_name() {
        let mut config = HttperConfig::default();
        config.generate.reserved.raw_body = "match".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("reserved.raw_body"));
    }
}
