// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Gatehouse admission engine.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, environment variable
//! overrides, and Elm-style diagnostic error rendering with typo suggestions.
//!
//! The engine refuses to start on missing or malformed configuration: the
//! binary renders the collected diagnostics and exits non-zero.
//!
//! # Usage
//!
//! ```no_run
//! use gatehouse_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("history limit: {}", config.engine.history_limit);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{GatehouseConfig, StorageFailurePolicy};

/// Load configuration from the XDG hierarchy and validate it.
///
/// This is the high-level entry point that:
/// 1. Loads config from TOML files + env vars via Figment
/// 2. On success: runs post-deserialization validation
/// 3. On Figment error: converts to rich miette diagnostics with typo suggestions
///
/// Returns either a valid `GatehouseConfig` or a list of diagnostic errors.
pub fn load_and_validate() -> Result<GatehouseConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            // Read TOML source files for error source span information.
            let toml_sources = collect_toml_sources();
            Err(diagnostic::figment_to_config_errors(err, &toml_sources))
        }
    }
}

/// Load configuration from a specific TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<GatehouseConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Read the TOML files from the XDG hierarchy that exist on disk, for
/// source-span rendering in diagnostics.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut sources = Vec::new();
    let mut candidates = vec![std::path::PathBuf::from("/etc/gatehouse/gatehouse.toml")];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("gatehouse/gatehouse.toml"));
    }
    candidates.push(std::path::PathBuf::from("gatehouse.toml"));

    for path in candidates {
        if let Ok(content) = std::fs::read_to_string(&path) {
            sources.push((path.display().to_string(), content));
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_and_validate_str_accepts_valid_config() {
        let config = load_and_validate_str(
            r#"
            [quota]
            timezone = "Europe/Moscow"

            [admin]
            allow_list = [42]
            "#,
        )
        .unwrap();
        assert_eq!(config.quota.timezone, "Europe/Moscow");
        assert_eq!(config.admin.allow_list, vec![42]);
    }

    #[test]
    fn load_and_validate_str_collects_semantic_errors() {
        let errors = load_and_validate_str(
            r#"
            [engine]
            history_limit = 0

            [quota]
            timezone = "nowhere"
            "#,
        )
        .unwrap_err();
        assert!(errors.len() >= 2, "expected both errors, got {errors:?}");
    }

    #[test]
    fn load_and_validate_str_rejects_unknown_section() {
        let errors = load_and_validate_str("[telemetry]\nenabled = true\n").unwrap_err();
        assert!(!errors.is_empty());
    }
}
