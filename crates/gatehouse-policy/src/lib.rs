// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tier policy: pure lookup from subscription tier to numeric limits.
//!
//! The table is immutable at runtime and swapped wholesale by an
//! administrative configuration reload. Unknown persisted tier strings fall
//! back to the most restrictive tier (`Free`) with a warning rather than
//! failing the admission path.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::warn;

use gatehouse_config::model::TierTable;
use gatehouse_core::types::{Tier, TierLimits};

/// Immutable snapshot of the limits for all tiers.
#[derive(Debug, Clone, PartialEq)]
struct TierSet {
    free: TierLimits,
    basic: TierLimits,
    pro: TierLimits,
    elite: TierLimits,
}

impl TierSet {
    fn from_table(table: &TierTable) -> Self {
        Self {
            free: table.free.limits(),
            basic: table.basic.limits(),
            pro: table.pro.limits(),
            elite: table.elite.limits(),
        }
    }
}

/// Lock-free tier-to-limits lookup with hot reload.
pub struct TierPolicy {
    table: ArcSwap<TierSet>,
}

impl TierPolicy {
    /// Build the policy from the configured tier table.
    pub fn new(table: &TierTable) -> Self {
        Self {
            table: ArcSwap::from_pointee(TierSet::from_table(table)),
        }
    }

    /// Limits for a tier. Pure lookup over the current snapshot.
    pub fn limits_for(&self, tier: Tier) -> TierLimits {
        let set = self.table.load();
        match tier {
            Tier::Free => set.free,
            Tier::Basic => set.basic,
            Tier::Pro => set.pro,
            Tier::Elite => set.elite,
        }
    }

    /// Parse a persisted tier string. Unknown values degrade to `Free` --
    /// a data inconsistency worth a warning, not a user fault.
    pub fn resolve(&self, raw: &str) -> Tier {
        raw.parse::<Tier>().unwrap_or_else(|_| {
            warn!(tier = raw, "unknown tier, falling back to free");
            Tier::Free
        })
    }

    /// Swap in a new tier table (administrative configuration reload).
    pub fn reload(&self, table: &TierTable) {
        self.table.store(Arc::new(TierSet::from_table(table)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_for_returns_the_tier_entry() {
        let table = TierTable::default();
        let policy = TierPolicy::new(&table);

        let free = policy.limits_for(Tier::Free);
        assert_eq!(free.daily_message_cap, table.free.daily_message_cap);
        assert!(!free.features.voice);

        let elite = policy.limits_for(Tier::Elite);
        assert_eq!(elite.daily_message_cap, table.elite.daily_message_cap);
        assert!(elite.features.voice);
    }

    #[test]
    fn resolve_parses_known_tiers() {
        let policy = TierPolicy::new(&TierTable::default());
        assert_eq!(policy.resolve("free"), Tier::Free);
        assert_eq!(policy.resolve("pro"), Tier::Pro);
        assert_eq!(policy.resolve("ELITE"), Tier::Elite);
    }

    #[test]
    fn resolve_falls_back_to_free_for_unknown() {
        let policy = TierPolicy::new(&TierTable::default());
        assert_eq!(policy.resolve("platinum"), Tier::Free);
        assert_eq!(policy.resolve(""), Tier::Free);
    }

    #[test]
    fn reload_swaps_the_table() {
        let mut table = TierTable::default();
        let policy = TierPolicy::new(&table);
        let before = policy.limits_for(Tier::Free).daily_message_cap;

        table.free.daily_message_cap = before + 100;
        policy.reload(&table);
        assert_eq!(
            policy.limits_for(Tier::Free).daily_message_cap,
            before + 100
        );
    }
}
