// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common value types shared across the Gatehouse workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque numeric identity of a chat user (e.g. a Telegram user id).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Subscription tier of a user.
///
/// Persisted as its lowercase string form. `Free` is the fallback for any
/// unrecognized persisted value.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Basic,
    Pro,
    Elite,
}

/// Kind of inbound user event presented for admission.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum EventKind {
    /// A text message exchange.
    Message,
    /// An image generation request.
    Image,
    /// Speech-to-text on a voice note.
    VoiceTranscription,
    /// Text-to-speech synthesis.
    VoiceSynthesis,
}

/// Quota window kinds tracked by the ledger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum QuotaKind {
    DailyMessages,
    DailyImages,
    PerMinuteRequests,
}

/// Role of a conversation turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One retained turn of a user's dialog history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub user: UserId,
    /// Monotonic per-user sequence number; eviction is strict FIFO by seq.
    pub seq: i64,
    pub role: Role,
    pub content: String,
    /// ISO 8601 timestamp.
    pub created_at: String,
}

/// Feature availability switches per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Image generation enabled for this tier.
    pub images: bool,
    /// Voice transcription and synthesis enabled for this tier.
    pub voice: bool,
}

/// Numeric limits and feature flags for one subscription tier.
///
/// Read-only at runtime; changed only via administrative configuration
/// reload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierLimits {
    pub daily_message_cap: u32,
    pub daily_image_cap: u32,
    pub per_minute_cap: u32,
    pub features: FeatureFlags,
}

impl TierLimits {
    /// The cap applying to a given quota kind.
    pub fn cap(&self, kind: QuotaKind) -> u32 {
        match kind {
            QuotaKind::DailyMessages => self.daily_message_cap,
            QuotaKind::DailyImages => self.daily_image_cap,
            QuotaKind::PerMinuteRequests => self.per_minute_cap,
        }
    }
}

/// Why an event was denied admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenyReason {
    /// The global kill-switch is off and the user is not an admin.
    BotDisabled,
    /// The user's tier does not include this event kind.
    FeatureNotInTier,
    /// A quota window is exhausted; carries the exhausted kind.
    QuotaExceeded(QuotaKind),
    /// The durable counter store was unreachable and the deployment runs
    /// fail-closed.
    StorageUnavailable,
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BotDisabled => write!(f, "BotDisabled"),
            Self::FeatureNotInTier => write!(f, "FeatureNotInTier"),
            Self::QuotaExceeded(kind) => write!(f, "QuotaExceeded({kind})"),
            Self::StorageUnavailable => write!(f, "StorageUnavailable"),
        }
    }
}

/// Usage of one quota kind at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub kind: QuotaKind,
    pub used: u32,
    pub cap: u32,
    pub remaining: u32,
}

/// Point-in-time view of a user's counters against their tier limits.
///
/// Produced by the ledger for the admin stats surface and attached to
/// admitted decisions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    pub entries: Vec<QuotaUsage>,
}

impl QuotaSnapshot {
    /// Remaining quota for a kind, if tracked in this snapshot.
    pub fn remaining(&self, kind: QuotaKind) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| e.remaining)
    }
}

/// The outcome of one admission check. Value type, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionDecision {
    pub admitted: bool,
    pub reason: Option<DenyReason>,
    /// Remaining-quota snapshot, present on admitted decisions.
    pub remaining: Option<QuotaSnapshot>,
}

impl AdmissionDecision {
    pub fn allowed(remaining: QuotaSnapshot) -> Self {
        Self {
            admitted: true,
            reason: None,
            remaining: Some(remaining),
        }
    }

    pub fn denied(reason: DenyReason) -> Self {
        Self {
            admitted: false,
            reason: Some(reason),
            remaining: None,
        }
    }
}

/// Inbound event descriptor handed over by the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub user: UserId,
    pub kind: EventKind,
    /// Optional tier asserted by the transport; absent means the engine
    /// loads the authoritative tier from its own user record.
    pub tier_hint: Option<Tier>,
    pub occurred_at: chrono::DateTime<chrono::Utc>,
}

impl InboundEvent {
    /// Event with the current timestamp and no tier hint.
    pub fn now(user: UserId, kind: EventKind) -> Self {
        Self {
            user,
            kind,
            tier_hint: None,
            occurred_at: chrono::Utc::now(),
        }
    }
}

/// Durable user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    /// Persisted tier string; parsed through the tier policy so unknown
    /// values degrade to `Free` instead of failing.
    pub tier: String,
    pub active: bool,
    /// ISO 8601 timestamp.
    pub created_at: String,
}

/// Format a timestamp the way Gatehouse persists them.
pub fn iso_timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn tier_round_trips_lowercase() {
        assert_eq!(Tier::Pro.to_string(), "pro");
        assert_eq!(Tier::from_str("elite").unwrap(), Tier::Elite);
        assert_eq!(Tier::from_str("FREE").unwrap(), Tier::Free);
        assert!(Tier::from_str("platinum").is_err());
    }

    #[test]
    fn quota_kind_round_trips() {
        for kind in [
            QuotaKind::DailyMessages,
            QuotaKind::DailyImages,
            QuotaKind::PerMinuteRequests,
        ] {
            let parsed = QuotaKind::from_str(&kind.to_string()).unwrap();
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn deny_reason_display_names_the_kind() {
        let reason = DenyReason::QuotaExceeded(QuotaKind::DailyImages);
        assert_eq!(reason.to_string(), "QuotaExceeded(DailyImages)");
    }

    #[test]
    fn tier_limits_cap_lookup() {
        let limits = TierLimits {
            daily_message_cap: 20,
            daily_image_cap: 5,
            per_minute_cap: 3,
            features: FeatureFlags {
                images: true,
                voice: false,
            },
        };
        assert_eq!(limits.cap(QuotaKind::DailyMessages), 20);
        assert_eq!(limits.cap(QuotaKind::DailyImages), 5);
        assert_eq!(limits.cap(QuotaKind::PerMinuteRequests), 3);
    }

    #[test]
    fn decision_constructors() {
        let allowed = AdmissionDecision::allowed(QuotaSnapshot::default());
        assert!(allowed.admitted);
        assert!(allowed.reason.is_none());

        let denied = AdmissionDecision::denied(DenyReason::BotDisabled);
        assert!(!denied.admitted);
        assert_eq!(denied.reason, Some(DenyReason::BotDisabled));
        assert!(denied.remaining.is_none());
    }

    #[test]
    fn snapshot_remaining_lookup() {
        let snapshot = QuotaSnapshot {
            entries: vec![QuotaUsage {
                kind: QuotaKind::DailyMessages,
                used: 3,
                cap: 20,
                remaining: 17,
            }],
        };
        assert_eq!(snapshot.remaining(QuotaKind::DailyMessages), Some(17));
        assert_eq!(snapshot.remaining(QuotaKind::DailyImages), None);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::from_str("assistant").unwrap(), Role::Assistant);
    }
}
