// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The admission controller: the single decision point for inbound events.
//!
//! Order of checks, short-circuiting on the first denial: global
//! kill-switch, tier resolution, feature flags, then quota consumption
//! (per-minute before daily, all-or-nothing). Counter mutation happens only
//! here; one audit record is emitted per decision, admitted or denied.
//!
//! Events for the same user are serialized through a per-user lock so a
//! burst cannot interleave between the status/feature checks and the ledger
//! commit. Different users never contend on these locks.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::warn;

use gatehouse_config::model::EngineConfig;
use gatehouse_config::StorageFailurePolicy;
use gatehouse_control::ControlPlane;
use gatehouse_core::types::{
    AdmissionDecision, DenyReason, EventKind, FeatureFlags, InboundEvent, QuotaKind,
    QuotaSnapshot, QuotaUsage, Tier, TierLimits, UserId, iso_timestamp,
};
use gatehouse_core::{AuditRecord, AuditSink, GatehouseError};
use gatehouse_policy::TierPolicy;
use gatehouse_quota::{ConsumeOutcome, QuotaDemand, QuotaLedger};
use gatehouse_storage::queries::users;
use gatehouse_storage::Database;

/// Aggregate view for the admin reporting surface.
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub user: UserId,
    pub tier: Tier,
    pub limits: TierLimits,
    pub snapshot: QuotaSnapshot,
}

/// The decision point consulted for every inbound event.
pub struct AdmissionController {
    db: Database,
    control: Arc<ControlPlane>,
    policy: Arc<TierPolicy>,
    ledger: QuotaLedger,
    audit: Arc<dyn AuditSink>,
    locks: DashMap<UserId, Arc<Mutex<()>>>,
    on_storage_error: StorageFailurePolicy,
    fail_open_reads: bool,
    decision_timeout: Duration,
}

impl AdmissionController {
    pub fn new(
        db: Database,
        control: Arc<ControlPlane>,
        policy: Arc<TierPolicy>,
        ledger: QuotaLedger,
        audit: Arc<dyn AuditSink>,
        engine: &EngineConfig,
    ) -> Self {
        Self {
            db,
            control,
            policy,
            ledger,
            audit,
            locks: DashMap::new(),
            on_storage_error: engine.on_storage_error,
            fail_open_reads: engine.fail_open_reads,
            decision_timeout: Duration::from_millis(engine.decision_timeout_ms),
        }
    }

    /// Decide whether to admit an inbound event.
    ///
    /// Always returns a decision for storage trouble (mapped through the
    /// configured fail-open/fail-closed policy); `Err` is reserved for
    /// non-storage internal failures.
    pub async fn admit(
        &self,
        event: &InboundEvent,
    ) -> Result<AdmissionDecision, GatehouseError> {
        let lock = self
            .locks
            .entry(event.user)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let outcome = {
            let _guard = lock.lock().await;
            tokio::time::timeout(self.decision_timeout, self.decide(event)).await
        };
        drop(lock);
        // Shed the entry unless another task still holds a clone, so the
        // table does not grow with every user ever seen.
        self.locks
            .remove_if(&event.user, |_, entry| Arc::strong_count(entry) == 1);

        let decision = match outcome {
            Ok(Ok(decision)) => decision,
            Ok(Err(err)) if err.is_storage() => {
                warn!(user = %event.user, error = %err, "storage unavailable during admission");
                self.storage_fallback()
            }
            Ok(Err(err)) => return Err(err),
            Err(_) => {
                warn!(
                    user = %event.user,
                    timeout_ms = self.decision_timeout.as_millis() as u64,
                    "admission decision timed out, treating as storage unavailable"
                );
                self.storage_fallback()
            }
        };

        self.emit(event, &decision).await;
        Ok(decision)
    }

    /// Aggregate quota statistics for the admin reporting surface.
    ///
    /// A pure read: never mutates counters. When storage is unreachable and
    /// `fail_open_reads` is set, returns an empty view instead of failing.
    pub async fn stats(&self, user: UserId) -> Result<UserStats, GatehouseError> {
        match self.stats_inner(user).await {
            Ok(stats) => Ok(stats),
            Err(err) if err.is_storage() && self.fail_open_reads => {
                warn!(user = %user, error = %err, "storage unavailable, returning empty stats");
                let limits = self.policy.limits_for(Tier::Free);
                Ok(UserStats {
                    user,
                    tier: Tier::Free,
                    limits,
                    snapshot: QuotaSnapshot::default(),
                })
            }
            Err(err) => Err(err),
        }
    }

    async fn stats_inner(&self, user: UserId) -> Result<UserStats, GatehouseError> {
        let tier = match users::get_user(&self.db, user).await? {
            Some(record) => self.policy.resolve(&record.tier),
            None => Tier::Free,
        };
        let limits = self.policy.limits_for(tier);
        let snapshot = self.ledger.snapshot(user, &limits).await?;
        Ok(UserStats {
            user,
            tier,
            limits,
            snapshot,
        })
    }

    async fn decide(
        &self,
        event: &InboundEvent,
    ) -> Result<AdmissionDecision, GatehouseError> {
        // 1. Global kill-switch; admins pass through.
        if !self.control.get_active() && !self.control.is_admin(event.user) {
            return Ok(AdmissionDecision::denied(DenyReason::BotDisabled));
        }

        // 2. Tier. The durable record is created on first sight either way;
        //    a transport hint overrides it for this decision only.
        let record = users::ensure_user(&self.db, event.user).await?;
        let tier = match event.tier_hint {
            Some(tier) => tier,
            None => self.policy.resolve(&record.tier),
        };
        let limits = self.policy.limits_for(tier);

        // 3. Feature flags.
        if !feature_enabled(event.kind, &limits.features) {
            return Ok(AdmissionDecision::denied(DenyReason::FeatureNotInTier));
        }

        // 4. Quotas, per-minute first, all-or-nothing.
        let demands = demands_for(event.kind, &limits);
        let outcome = self
            .ledger
            .try_consume_all_at(event.user, &demands, 1, event.occurred_at)
            .await?;

        Ok(match outcome {
            ConsumeOutcome::Allowed { remaining } => {
                let entries = remaining
                    .into_iter()
                    .map(|(kind, left)| {
                        let cap = limits.cap(kind);
                        QuotaUsage {
                            kind,
                            used: cap - left,
                            cap,
                            remaining: left,
                        }
                    })
                    .collect();
                AdmissionDecision::allowed(QuotaSnapshot { entries })
            }
            ConsumeOutcome::Denied { kind } => {
                AdmissionDecision::denied(DenyReason::QuotaExceeded(kind))
            }
        })
    }

    /// Map a storage failure to a decision per the configured policy.
    fn storage_fallback(&self) -> AdmissionDecision {
        match self.on_storage_error {
            StorageFailurePolicy::Deny => {
                AdmissionDecision::denied(DenyReason::StorageUnavailable)
            }
            // Fail-open: admit without charging quota.
            StorageFailurePolicy::Allow => AdmissionDecision {
                admitted: true,
                reason: None,
                remaining: None,
            },
        }
    }

    async fn emit(&self, event: &InboundEvent, decision: &AdmissionDecision) {
        let record = AuditRecord {
            id: uuid::Uuid::new_v4(),
            user: event.user,
            event_kind: event.kind,
            admitted: decision.admitted,
            reason: decision.reason,
            occurred_at: iso_timestamp(event.occurred_at),
        };
        if let Err(err) = self.audit.record(&record).await {
            // The decision stands even when the sink misbehaves.
            warn!(user = %event.user, error = %err, "audit sink failed");
        }
    }
}

/// Whether the tier's feature flags include this event kind.
fn feature_enabled(kind: EventKind, features: &FeatureFlags) -> bool {
    match kind {
        EventKind::Message => true,
        EventKind::Image => features.images,
        EventKind::VoiceTranscription | EventKind::VoiceSynthesis => features.voice,
    }
}

/// The quota kinds an event charges, in the fixed consumption order:
/// per-minute first, then the daily kind.
fn demands_for(kind: EventKind, limits: &TierLimits) -> Vec<QuotaDemand> {
    let mut demands = vec![QuotaDemand {
        kind: QuotaKind::PerMinuteRequests,
        cap: limits.per_minute_cap,
    }];
    match kind {
        EventKind::Message => demands.push(QuotaDemand {
            kind: QuotaKind::DailyMessages,
            cap: limits.daily_message_cap,
        }),
        EventKind::Image => demands.push(QuotaDemand {
            kind: QuotaKind::DailyImages,
            cap: limits.daily_image_cap,
        }),
        EventKind::VoiceTranscription | EventKind::VoiceSynthesis => {}
    }
    demands
}
