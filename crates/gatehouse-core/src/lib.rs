// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Gatehouse admission engine.
//!
//! This crate provides the error type, identifier and value types, and the
//! audit-sink trait used throughout the Gatehouse workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::GatehouseError;
pub use traits::{AuditRecord, AuditSink};
pub use types::{
    AdmissionDecision, ContextEntry, DenyReason, EventKind, FeatureFlags, InboundEvent,
    QuotaKind, QuotaSnapshot, QuotaUsage, Role, Tier, TierLimits, UserId, UserRecord,
    iso_timestamp,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_serializes_for_audit_consumers() {
        let decision = AdmissionDecision::denied(DenyReason::QuotaExceeded(
            QuotaKind::PerMinuteRequests,
        ));
        let json = serde_json::to_string(&decision).expect("should serialize");
        let parsed: AdmissionDecision =
            serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(decision, parsed);
    }

    #[test]
    fn audit_record_serializes() {
        let record = AuditRecord {
            id: uuid::Uuid::new_v4(),
            user: UserId(7),
            event_kind: EventKind::Image,
            admitted: false,
            reason: Some(DenyReason::FeatureNotInTier),
            occurred_at: "2026-08-25T00:00:00.000Z".to_string(),
        };
        let json = serde_json::to_string(&record).expect("should serialize");
        assert!(json.contains("FeatureNotInTier"));
    }

    #[test]
    fn iso_timestamp_has_millis_and_zulu() {
        let ts = iso_timestamp(chrono::Utc::now());
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), "2026-08-25T00:00:00.000Z".len());
    }
}
