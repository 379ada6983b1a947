// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical value types live in `gatehouse-core::types` for use across
//! crate boundaries. This module re-exports them and defines rows that only
//! the storage layer sees.

pub use gatehouse_core::types::{ContextEntry, UserRecord};

/// Persisted kill-switch state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotStatusRow {
    pub is_active: bool,
    /// ISO 8601 timestamp of the last admin change.
    pub updated_at: String,
}
