// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit sink implementations.
//!
//! The engine emits one record per admitted or denied event. Production
//! deployments hand these to an external analytics store; the default sink
//! writes structured tracing events.

use async_trait::async_trait;
use tracing::info;

use gatehouse_core::{AuditRecord, AuditSink, GatehouseError};

/// Audit sink that emits one structured tracing event per record.
///
/// Expected denials are part of normal operation, so everything goes out at
/// info level.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), GatehouseError> {
        match &record.reason {
            Some(reason) => info!(
                id = %record.id,
                user = %record.user,
                event_kind = %record.event_kind,
                admitted = record.admitted,
                reason = %reason,
                occurred_at = %record.occurred_at,
                "admission decision"
            ),
            None => info!(
                id = %record.id,
                user = %record.user,
                event_kind = %record.event_kind,
                admitted = record.admitted,
                occurred_at = %record.occurred_at,
                "admission decision"
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Test sink that captures every record for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub records: Mutex<Vec<AuditRecord>>,
    }

    #[async_trait]
    impl AuditSink for RecordingSink {
        async fn record(&self, record: &AuditRecord) -> Result<(), GatehouseError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::types::{DenyReason, EventKind, UserId};

    #[tokio::test]
    async fn tracing_sink_accepts_both_outcomes() {
        let sink = TracingAuditSink;
        let admitted = AuditRecord {
            id: uuid::Uuid::new_v4(),
            user: UserId(1),
            event_kind: EventKind::Message,
            admitted: true,
            reason: None,
            occurred_at: "2026-08-25T00:00:00.000Z".into(),
        };
        let denied = AuditRecord {
            reason: Some(DenyReason::BotDisabled),
            admitted: false,
            ..admitted.clone()
        };
        sink.record(&admitted).await.unwrap();
        sink.record(&denied).await.unwrap();
    }
}
