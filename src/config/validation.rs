//! Configuration validation.
//!
//! Serde handles syntax; this checks values. Every problem is reported, not
//! just the first.

use std::fmt;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut fail = |field: &'static str, message: String| {
        errors.push(ValidationError { field, message });
    };

    let network = &config.network;
    if network.chain_id == 0 {
        fail("network.chain_id", "must be non-zero".to_string());
    }
    match network.rpc_url.parse::<url::Url>() {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => fail(
            "network.rpc_url",
            format!("unsupported scheme '{}'", url.scheme()),
        ),
        Err(e) => fail("network.rpc_url", format!("invalid URL: {}", e)),
    }
    if network.rpc_timeout_secs == 0 {
        fail("network.rpc_timeout_secs", "must be greater than 0".to_string());
    }
    if network.confirmation_timeout_secs == 0 {
        fail(
            "network.confirmation_timeout_secs",
            "must be greater than 0".to_string(),
        );
    }
    if network.poll_interval_ms == 0 {
        fail("network.poll_interval_ms", "must be greater than 0".to_string());
    } else if network.poll_interval_ms / 1000 >= network.confirmation_timeout_secs {
        fail(
            "network.poll_interval_ms",
            "must be shorter than the confirmation timeout".to_string(),
        );
    }

    if config.artifacts.contract_name.trim().is_empty() {
        fail("artifacts.contract_name", "must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.network.chain_id = 0;
        config.network.rpc_url = "ws://127.0.0.1:8545".to_string();
        config.network.rpc_timeout_secs = 0;
        config.artifacts.contract_name = " ".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "network.chain_id",
                "network.rpc_url",
                "network.rpc_timeout_secs",
                "artifacts.contract_name",
            ]
        );
    }

    #[test]
    fn test_poll_interval_must_fit_timeout() {
        let mut config = AppConfig::default();
        config.network.confirmation_timeout_secs = 1;
        config.network.poll_interval_ms = 5000;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "network.poll_interval_ms");
    }
}
