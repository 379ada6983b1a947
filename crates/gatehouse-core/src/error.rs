// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Gatehouse admission engine.
//!
//! Expected admission outcomes (quota exceeded, feature not in tier, bot
//! disabled) are NOT errors -- they travel inside
//! [`AdmissionDecision`](crate::types::AdmissionDecision). This enum covers
//! the genuinely exceptional cases.

use thiserror::Error;

use crate::types::UserId;

/// The primary error type used across all Gatehouse crates.
#[derive(Debug, Error)]
pub enum GatehouseError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The acting id is not in the admin allow-list.
    #[error("unauthorized: {actor} is not an admin")]
    Unauthorized { actor: UserId },

    /// A persisted tier string did not parse. Recovered locally by falling
    /// back to the most restrictive tier; surfaced only in logs and tests.
    #[error("unknown tier: {raw:?}")]
    UnknownTier { raw: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatehouseError {
    /// Wrap any error as a storage failure.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(source),
        }
    }

    /// True for failures of the durable store, which admission maps to its
    /// configurable fail-open/fail-closed policy.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_are_detected() {
        let err = GatehouseError::storage(std::io::Error::other("disk gone"));
        assert!(err.is_storage());
        assert!(err.to_string().contains("disk gone"));
    }

    #[test]
    fn unauthorized_names_the_actor() {
        let err = GatehouseError::Unauthorized {
            actor: UserId(42),
        };
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn unknown_tier_is_not_storage() {
        let err = GatehouseError::UnknownTier {
            raw: "platinum".into(),
        };
        assert!(!err.is_storage());
        assert!(err.to_string().contains("platinum"));
    }
}
