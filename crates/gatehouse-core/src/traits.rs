// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the engine and its external collaborators.

use async_trait::async_trait;

use crate::error::GatehouseError;
use crate::types::{DenyReason, EventKind, UserId};

/// One record emitted per admitted or denied event.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AuditRecord {
    /// Unique record id, assigned at emission.
    pub id: uuid::Uuid,
    pub user: UserId,
    pub event_kind: EventKind,
    pub admitted: bool,
    pub reason: Option<DenyReason>,
    /// ISO 8601 timestamp.
    pub occurred_at: String,
}

/// Sink for admission audit records.
///
/// The engine only emits; it never queries this sink. Implementations
/// belong to the external analytics/logging layer.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: &AuditRecord) -> Result<(), GatehouseError>;
}
