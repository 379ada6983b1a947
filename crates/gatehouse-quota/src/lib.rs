// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quota ledger for the Gatehouse admission engine.
//!
//! Tracks daily message/image counts and per-minute request counts per user
//! with lazy window rollover: no background sweep, a counter whose stored
//! window id differs from the current one is treated as zero.

pub mod ledger;
pub mod window;

pub use ledger::{ConsumeOutcome, QuotaDemand, QuotaLedger};
pub use window::window_id;
