// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Window identity computation.
//!
//! A counter belongs to exactly one window. Rollover is lazy: instead of a
//! scheduled reset, the stored window id is compared with the current one,
//! and a mismatch means the counter is logically zero.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use gatehouse_core::types::QuotaKind;

/// Identity of the window `kind` is accumulating in at instant `at`.
///
/// Daily kinds use the calendar date in the configured timezone; the
/// per-minute kind uses a fixed 60-second bucket of the Unix epoch.
pub fn window_id(kind: QuotaKind, tz: Tz, at: DateTime<Utc>) -> String {
    match kind {
        QuotaKind::DailyMessages | QuotaKind::DailyImages => {
            at.with_timezone(&tz).format("%Y-%m-%d").to_string()
        }
        QuotaKind::PerMinuteRequests => format!("m{}", at.timestamp().div_euclid(60)),
    }
}
