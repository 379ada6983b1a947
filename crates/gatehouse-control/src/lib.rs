// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Control plane: the global bot enable/disable toggle and admin-only
//! overrides.
//!
//! The flag is read by every admission decision and written only through
//! explicit admin action, so reads go through an `arc-swap` snapshot while
//! writes persist to SQLite first and then swap the snapshot. A freshly
//! started process loads the last persisted value before serving any
//! decision; absent prior state the default is "active", persisted
//! immediately so a crash never silently leaves the bot off unless an admin
//! chose that.

use std::collections::HashSet;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use gatehouse_core::GatehouseError;
use gatehouse_core::types::{UserId, iso_timestamp};
use gatehouse_storage::models::BotStatusRow;
use gatehouse_storage::queries::status::{load_status, save_status};
use gatehouse_storage::Database;

/// The global singleton status. Owned by the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotStatus {
    pub is_active: bool,
    /// ISO 8601 timestamp of the last change.
    pub updated_at: String,
}

impl From<BotStatusRow> for BotStatus {
    fn from(row: BotStatusRow) -> Self {
        Self {
            is_active: row.is_active,
            updated_at: row.updated_at,
        }
    }
}

/// Durable kill-switch with a read-optimized in-memory snapshot.
pub struct ControlPlane {
    db: Database,
    status: ArcSwap<BotStatus>,
    admins: HashSet<UserId>,
}

impl ControlPlane {
    /// Restore the persisted status (or persist the "active" default on a
    /// fresh database) and build the control plane.
    ///
    /// Must complete before any admission decision is served.
    pub async fn load(
        db: Database,
        admins: HashSet<UserId>,
    ) -> Result<Self, GatehouseError> {
        let status = match load_status(&db).await? {
            Some(row) => BotStatus::from(row),
            None => {
                let initial = BotStatusRow {
                    is_active: true,
                    updated_at: iso_timestamp(chrono::Utc::now()),
                };
                save_status(&db, &initial).await?;
                BotStatus::from(initial)
            }
        };

        info!(is_active = status.is_active, "control plane loaded");
        Ok(Self {
            db,
            status: ArcSwap::from_pointee(status),
            admins,
        })
    }

    /// Lock-free read of the global flag.
    pub fn get_active(&self) -> bool {
        self.status.load().is_active
    }

    /// Current status snapshot.
    pub fn status(&self) -> BotStatus {
        BotStatus::clone(&self.status.load())
    }

    /// Whether an id may call control-plane operations and bypass the
    /// kill-switch.
    pub fn is_admin(&self, id: UserId) -> bool {
        self.admins.contains(&id)
    }

    /// Toggle the bot, durably.
    ///
    /// Only callable by an id in the admin allow-list; persists before the
    /// in-memory snapshot is swapped so a crash between the two leaves the
    /// durable value authoritative.
    pub async fn set_active(
        &self,
        active: bool,
        acting_admin: UserId,
    ) -> Result<(), GatehouseError> {
        if !self.is_admin(acting_admin) {
            return Err(GatehouseError::Unauthorized {
                actor: acting_admin,
            });
        }

        let row = BotStatusRow {
            is_active: active,
            updated_at: iso_timestamp(chrono::Utc::now()),
        };
        save_status(&self.db, &row).await?;
        self.status.store(Arc::new(BotStatus::from(row)));

        info!(is_active = active, admin = %acting_admin, "bot status changed");
        Ok(())
    }
}
