// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid URLs, non-empty paths, and sane thresholds.

use crate::diagnostic::ConfigError;
use crate::model::VigiaConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &VigiaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate database_path is not empty
    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // Validate intelligence base_url parses as an http(s) URL
    let base_url = config.intelligence.base_url.trim();
    if base_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "intelligence.base_url must not be empty".to_string(),
        });
    } else if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!(
                "intelligence.base_url `{base_url}` must start with http:// or https://"
            ),
        });
    }

    // Validate intelligence timeout is non-zero
    if config.intelligence.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "intelligence.timeout_secs must be greater than zero".to_string(),
        });
    }

    // Validate gateway host looks like a valid IP or hostname
    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    // Validate janitor threshold exceeds the analysis timeout. A reclaim
    // window shorter than the AI call would re-queue batches that are
    // still legitimately in flight.
    if config.janitor.enabled && config.janitor.stale_after_secs <= config.intelligence.timeout_secs
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "janitor.stale_after_secs ({}) must exceed intelligence.timeout_secs ({})",
                config.janitor.stale_after_secs, config.intelligence.timeout_secs
            ),
        });
    }

    // Validate scheduler settings
    if config.scheduler.enabled {
        if config.scheduler.interval_secs == 0 {
            errors.push(ConfigError::Validation {
                message: "scheduler.interval_secs must be greater than zero".to_string(),
            });
        }
        if config.scheduler.min_messages < 1 {
            errors.push(ConfigError::Validation {
                message: format!(
                    "scheduler.min_messages must be at least 1, got {}",
                    config.scheduler.min_messages
                ),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
