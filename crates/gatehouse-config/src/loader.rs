// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./gatehouse.toml` > `~/.config/gatehouse/gatehouse.toml`
//! > `/etc/gatehouse/gatehouse.toml` with environment variable overrides via
//! `GATEHOUSE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::GatehouseConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/gatehouse/gatehouse.toml` (system-wide)
/// 3. `~/.config/gatehouse/gatehouse.toml` (user XDG config)
/// 4. `./gatehouse.toml` (local directory)
/// 5. `GATEHOUSE_*` environment variables
pub fn load_config() -> Result<GatehouseConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<GatehouseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GatehouseConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<GatehouseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GatehouseConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(GatehouseConfig::default()))
        .merge(Toml::file("/etc/gatehouse/gatehouse.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("gatehouse/gatehouse.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("gatehouse.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `GATEHOUSE_ENGINE_HISTORY_LIMIT` must map
/// to `engine.history_limit`, not `engine.history.limit`.
fn env_provider() -> Env {
    Env::prefixed("GATEHOUSE_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: GATEHOUSE_STORAGE_DATABASE_PATH -> "storage_database_path"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("engine_", "engine.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("admin_", "admin.", 1)
            .replacen("quota_", "quota.", 1);
        mapped.into()
    })
}
