// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as a parseable timezone, a non-empty database path, and
//! a non-zero history limit.

use std::collections::HashSet;
use std::str::FromStr;

use crate::diagnostic::ConfigError;
use crate::model::{GatehouseConfig, TierLimitsEntry};

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast on the first one).
pub fn validate_config(config: &GatehouseConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.engine.history_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "engine.history_limit must be at least 1".to_string(),
        });
    }

    if config.engine.decision_timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "engine.decision_timeout_ms must be at least 1".to_string(),
        });
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.engine.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "engine.log_level `{}` is not one of trace, debug, info, warn, error",
                config.engine.log_level
            ),
        });
    }

    if chrono_tz::Tz::from_str(&config.quota.timezone).is_err() {
        errors.push(ConfigError::Validation {
            message: format!(
                "quota.timezone `{}` is not a valid IANA timezone name",
                config.quota.timezone
            ),
        });
    }

    let mut seen_admins = HashSet::new();
    for id in &config.admin.allow_list {
        if !seen_admins.insert(id) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate admin id {id} in admin.allow_list"),
            });
        }
    }

    validate_tier(&config.quota.tiers.free, "free", &mut errors);
    validate_tier(&config.quota.tiers.basic, "basic", &mut errors);
    validate_tier(&config.quota.tiers.pro, "pro", &mut errors);
    validate_tier(&config.quota.tiers.elite, "elite", &mut errors);

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn validate_tier(entry: &TierLimitsEntry, name: &str, errors: &mut Vec<ConfigError>) {
    if entry.per_minute_cap == 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "quota.tiers.{name}.per_minute_cap must be at least 1 (0 would deny every event)"
            ),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = GatehouseConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_history_limit_is_rejected() {
        let mut config = GatehouseConfig::default();
        config.engine.history_limit = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| e.to_string().contains("history_limit"))
        );
    }

    #[test]
    fn bad_timezone_is_rejected() {
        let mut config = GatehouseConfig::default();
        config.quota.timezone = "Mars/Olympus_Mons".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("timezone")));
    }

    #[test]
    fn duplicate_admin_ids_are_rejected() {
        let mut config = GatehouseConfig::default();
        config.admin.allow_list = vec![1, 2, 1];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("duplicate")));
    }

    #[test]
    fn zero_per_minute_cap_is_rejected() {
        let mut config = GatehouseConfig::default();
        config.quota.tiers.basic.per_minute_cap = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| e.to_string().contains("tiers.basic.per_minute_cap"))
        );
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = GatehouseConfig::default();
        config.engine.history_limit = 0;
        config.quota.timezone = "nowhere".to_string();
        config.engine.log_level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3, "expected all errors, got {errors:?}");
    }
}
