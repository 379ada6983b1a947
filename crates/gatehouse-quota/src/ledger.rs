// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The quota ledger: windowed counters with atomic check-then-commit.
//!
//! All mutation goes through [`QuotaLedger::try_consume_all`], which runs
//! as one SQLite transaction on the single writer thread. Two concurrent
//! consumes for the same (user, kind) can therefore never both succeed on
//! the last unit of quota, and once `Allowed` is returned the increment is
//! durable.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rusqlite::params;
use tracing::debug;

use gatehouse_core::GatehouseError;
use gatehouse_core::types::{QuotaKind, QuotaSnapshot, QuotaUsage, TierLimits, UserId};
use gatehouse_storage::Database;
use gatehouse_storage::database::map_tr_err;

use crate::window::window_id;

/// One quota requirement for an event: the kind and the tier's cap for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDemand {
    pub kind: QuotaKind,
    pub cap: u32,
}

/// Outcome of a consume attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// Every demanded kind had room; all counters were incremented.
    Allowed {
        /// Remaining units per demanded kind, after the increment.
        remaining: Vec<(QuotaKind, u32)>,
    },
    /// A kind was exhausted; no counter was touched.
    Denied { kind: QuotaKind },
}

/// Persistent quota ledger keyed by (user, kind).
#[derive(Clone)]
pub struct QuotaLedger {
    db: Database,
    tz: Tz,
}

impl QuotaLedger {
    /// Create a ledger over the shared database using the given timezone
    /// for daily window boundaries.
    pub fn new(db: Database, tz: Tz) -> Self {
        Self { db, tz }
    }

    /// Consume `amount` units from a single quota kind.
    pub async fn try_consume(
        &self,
        user: UserId,
        kind: QuotaKind,
        cap: u32,
        amount: u32,
    ) -> Result<ConsumeOutcome, GatehouseError> {
        self.try_consume_all(user, &[QuotaDemand { kind, cap }], amount)
            .await
    }

    /// Consume `amount` units from every demanded kind, all or nothing.
    ///
    /// Checks all kinds first and only writes when every one has room, so a
    /// denial never leaves a partial charge behind. The evaluation happens
    /// at the current instant; see [`try_consume_all_at`](Self::try_consume_all_at).
    pub async fn try_consume_all(
        &self,
        user: UserId,
        demands: &[QuotaDemand],
        amount: u32,
    ) -> Result<ConsumeOutcome, GatehouseError> {
        self.try_consume_all_at(user, demands, amount, Utc::now()).await
    }

    /// [`try_consume_all`](Self::try_consume_all) evaluated at an explicit
    /// instant. Window identity is derived from `at`, which makes rollover
    /// behavior testable without waiting for a boundary.
    pub async fn try_consume_all_at(
        &self,
        user: UserId,
        demands: &[QuotaDemand],
        amount: u32,
        at: DateTime<Utc>,
    ) -> Result<ConsumeOutcome, GatehouseError> {
        let demands: Vec<(QuotaKind, String, u32)> = demands
            .iter()
            .map(|d| (d.kind, window_id(d.kind, self.tz, at), d.cap))
            .collect();

        let outcome = self
            .db
            .connection()
            .call(move |conn| -> Result<ConsumeOutcome, rusqlite::Error> {
                let tx = conn.transaction()?;

                // Pre-check every kind before touching any counter.
                let mut new_counts: Vec<(QuotaKind, &str, u32, u32)> = Vec::new();
                for (kind, window, cap) in &demands {
                    let current = read_count(&tx, user, *kind, window)?;
                    let new_count = current.saturating_add(amount);
                    if new_count > *cap {
                        return Ok(ConsumeOutcome::Denied { kind: *kind });
                    }
                    new_counts.push((*kind, window.as_str(), new_count, *cap));
                }

                // Every check passed; commit all increments together.
                let mut remaining = Vec::with_capacity(new_counts.len());
                for (kind, window, new_count, cap) in &new_counts {
                    tx.execute(
                        "INSERT INTO quota_counters (user_id, kind, window_id, count)
                         VALUES (?1, ?2, ?3, ?4)
                         ON CONFLICT(user_id, kind) DO UPDATE SET
                             window_id = excluded.window_id,
                             count = excluded.count",
                        params![user.0, kind.to_string(), window, new_count],
                    )?;
                    remaining.push((*kind, cap - new_count));
                }

                tx.commit()?;
                Ok(ConsumeOutcome::Allowed { remaining })
            })
            .await
            .map_err(map_tr_err)?;

        if let ConsumeOutcome::Denied { kind } = &outcome {
            debug!(user = %user, kind = %kind, "quota denied");
        }
        Ok(outcome)
    }

    /// Pure read of a user's counters against their tier limits, with
    /// rollover applied. Used by the admin stats surface and attached to
    /// admitted decisions.
    pub async fn snapshot(
        &self,
        user: UserId,
        limits: &TierLimits,
    ) -> Result<QuotaSnapshot, GatehouseError> {
        self.snapshot_at(user, limits, Utc::now()).await
    }

    /// [`snapshot`](Self::snapshot) evaluated at an explicit instant.
    pub async fn snapshot_at(
        &self,
        user: UserId,
        limits: &TierLimits,
        at: DateTime<Utc>,
    ) -> Result<QuotaSnapshot, GatehouseError> {
        let kinds = [
            QuotaKind::DailyMessages,
            QuotaKind::DailyImages,
            QuotaKind::PerMinuteRequests,
        ];
        let lookups: Vec<(QuotaKind, String, u32)> = kinds
            .iter()
            .map(|&kind| (kind, window_id(kind, self.tz, at), limits.cap(kind)))
            .collect();

        self.db
            .connection()
            .call(move |conn| -> Result<QuotaSnapshot, rusqlite::Error> {
                let mut entries = Vec::with_capacity(lookups.len());
                for (kind, window, cap) in &lookups {
                    let used = read_count(conn, user, *kind, window)?;
                    entries.push(QuotaUsage {
                        kind: *kind,
                        used,
                        cap: *cap,
                        remaining: cap.saturating_sub(used),
                    });
                }
                Ok(QuotaSnapshot { entries })
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Counter value for (user, kind) within `window`. A row whose stored
/// window id differs is logically zero (lazy rollover).
fn read_count(
    conn: &rusqlite::Connection,
    user: UserId,
    kind: QuotaKind,
    window: &str,
) -> Result<u32, rusqlite::Error> {
    let row: Option<(String, u32)> = match conn.query_row(
        "SELECT window_id, count FROM quota_counters WHERE user_id = ?1 AND kind = ?2",
        params![user.0, kind.to_string()],
        |row| Ok((row.get(0)?, row.get(1)?)),
    ) {
        Ok(row) => Some(row),
        Err(rusqlite::Error::QueryReturnedNoRows) => None,
        Err(e) => return Err(e),
    };

    Ok(match row {
        Some((stored_window, count)) if stored_window == window => count,
        _ => 0,
    })
}
