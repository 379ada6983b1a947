// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Gatehouse admission engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use gatehouse_core::types::{FeatureFlags, Tier, TierLimits};
use serde::{Deserialize, Serialize};

/// Top-level Gatehouse configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatehouseConfig {
    /// Engine behavior settings (history limit, failure policy).
    #[serde(default)]
    pub engine: EngineConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Admin allow-list for the control plane.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Quota windows and per-tier limits.
    #[serde(default)]
    pub quota: QuotaConfig,
}

/// What admission does when the durable counter store is unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageFailurePolicy {
    /// Deny admission rather than risk uncharged quota (recommended).
    Deny,
    /// Admit without charging quota.
    Allow,
}

/// Engine behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum retained dialog turns per user.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Policy for mutating operations when storage is unreachable.
    #[serde(default = "default_storage_failure_policy")]
    pub on_storage_error: StorageFailurePolicy,

    /// Whether pure reads (stats snapshots) return an empty view instead of
    /// failing when storage is unreachable.
    #[serde(default = "default_fail_open_reads")]
    pub fail_open_reads: bool,

    /// Upper bound on the admission decision path, in milliseconds.
    #[serde(default = "default_decision_timeout_ms")]
    pub decision_timeout_ms: u64,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            on_storage_error: default_storage_failure_policy(),
            fail_open_reads: default_fail_open_reads(),
            decision_timeout_ms: default_decision_timeout_ms(),
            log_level: default_log_level(),
        }
    }
}

fn default_history_limit() -> usize {
    16
}

fn default_storage_failure_policy() -> StorageFailurePolicy {
    StorageFailurePolicy::Deny
}

fn default_fail_open_reads() -> bool {
    true
}

fn default_decision_timeout_ms() -> u64 {
    50
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("gatehouse").join("gatehouse.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("gatehouse.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Admin allow-list configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdminConfig {
    /// Numeric user ids allowed to call control-plane operations and to
    /// bypass the global kill-switch.
    #[serde(default)]
    pub allow_list: Vec<i64>,
}

/// Quota window and tier-limit configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaConfig {
    /// IANA timezone name used for the daily window boundary.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Per-tier limits table.
    #[serde(default)]
    pub tiers: TierTable,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            tiers: TierTable::default(),
        }
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Limits for all four subscription tiers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TierTable {
    #[serde(default = "default_free_limits")]
    pub free: TierLimitsEntry,
    #[serde(default = "default_basic_limits")]
    pub basic: TierLimitsEntry,
    #[serde(default = "default_pro_limits")]
    pub pro: TierLimitsEntry,
    #[serde(default = "default_elite_limits")]
    pub elite: TierLimitsEntry,
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            free: default_free_limits(),
            basic: default_basic_limits(),
            pro: default_pro_limits(),
            elite: default_elite_limits(),
        }
    }
}

impl TierTable {
    /// Limits entry for a tier.
    pub fn entry(&self, tier: Tier) -> &TierLimitsEntry {
        match tier {
            Tier::Free => &self.free,
            Tier::Basic => &self.basic,
            Tier::Pro => &self.pro,
            Tier::Elite => &self.elite,
        }
    }
}

/// One tier's configured limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TierLimitsEntry {
    pub daily_message_cap: u32,
    pub daily_image_cap: u32,
    pub per_minute_cap: u32,
    #[serde(default = "default_true")]
    pub images: bool,
    #[serde(default)]
    pub voice: bool,
}

impl TierLimitsEntry {
    /// Convert into the runtime limits value.
    pub fn limits(&self) -> TierLimits {
        TierLimits {
            daily_message_cap: self.daily_message_cap,
            daily_image_cap: self.daily_image_cap,
            per_minute_cap: self.per_minute_cap,
            features: FeatureFlags {
                images: self.images,
                voice: self.voice,
            },
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_free_limits() -> TierLimitsEntry {
    TierLimitsEntry {
        daily_message_cap: 20,
        daily_image_cap: 5,
        per_minute_cap: 5,
        images: true,
        voice: false,
    }
}

fn default_basic_limits() -> TierLimitsEntry {
    TierLimitsEntry {
        daily_message_cap: 100,
        daily_image_cap: 20,
        per_minute_cap: 10,
        images: true,
        voice: true,
    }
}

fn default_pro_limits() -> TierLimitsEntry {
    TierLimitsEntry {
        daily_message_cap: 200,
        daily_image_cap: 50,
        per_minute_cap: 20,
        images: true,
        voice: true,
    }
}

fn default_elite_limits() -> TierLimitsEntry {
    TierLimitsEntry {
        daily_message_cap: 1000,
        daily_image_cap: 200,
        per_minute_cap: 60,
        images: true,
        voice: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = GatehouseConfig::default();
        assert_eq!(config.engine.history_limit, 16);
        assert_eq!(config.engine.on_storage_error, StorageFailurePolicy::Deny);
        assert!(config.engine.fail_open_reads);
        assert_eq!(config.engine.decision_timeout_ms, 50);
        assert_eq!(config.quota.timezone, "UTC");
        assert!(config.admin.allow_list.is_empty());
    }

    #[test]
    fn default_tier_table_is_monotonic() {
        let tiers = TierTable::default();
        assert!(tiers.free.daily_message_cap < tiers.basic.daily_message_cap);
        assert!(tiers.basic.daily_message_cap < tiers.pro.daily_message_cap);
        assert!(tiers.pro.daily_message_cap < tiers.elite.daily_message_cap);
        assert!(!tiers.free.voice, "voice is not included in Free");
        assert!(tiers.pro.voice);
    }

    #[test]
    fn entry_lookup_matches_tier() {
        let tiers = TierTable::default();
        assert_eq!(
            tiers.entry(Tier::Pro).daily_image_cap,
            tiers.pro.daily_image_cap
        );
        assert_eq!(
            tiers.entry(Tier::Free).per_minute_cap,
            tiers.free.per_minute_cap
        );
    }

    #[test]
    fn limits_entry_converts_to_runtime_limits() {
        let entry = default_free_limits();
        let limits = entry.limits();
        assert_eq!(limits.daily_message_cap, 20);
        assert_eq!(limits.daily_image_cap, 5);
        assert!(limits.features.images);
        assert!(!limits.features.voice);
    }

    #[test]
    fn storage_failure_policy_parses_lowercase() {
        let allow: StorageFailurePolicy = serde_json::from_str("\"allow\"").unwrap();
        assert_eq!(allow, StorageFailurePolicy::Allow);
        let deny: StorageFailurePolicy = serde_json::from_str("\"deny\"").unwrap();
        assert_eq!(deny, StorageFailurePolicy::Deny);
    }
}
