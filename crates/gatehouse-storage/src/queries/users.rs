// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User record operations.
//!
//! Users are created on their first-seen event and never deleted -- an
//! admin can only deactivate them or change their tier.

use rusqlite::params;

use gatehouse_core::types::{Tier, UserId, iso_timestamp};
use gatehouse_core::GatehouseError;

use crate::database::Database;
use crate::models::UserRecord;

fn row_to_user(row: &rusqlite::Row<'_>) -> Result<UserRecord, rusqlite::Error> {
    Ok(UserRecord {
        id: UserId(row.get(0)?),
        tier: row.get(1)?,
        active: row.get::<_, i64>(2)? != 0,
        created_at: row.get(3)?,
    })
}

/// Fetch the user record, creating it with the `free` tier on first sight.
pub async fn ensure_user(db: &Database, id: UserId) -> Result<UserRecord, GatehouseError> {
    let now = iso_timestamp(chrono::Utc::now());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO users (id, tier, active, created_at)
                 VALUES (?1, 'free', 1, ?2)",
                params![id.0, now],
            )?;
            conn.query_row(
                "SELECT id, tier, active, created_at FROM users WHERE id = ?1",
                params![id.0],
                row_to_user,
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a user record by id.
pub async fn get_user(db: &Database, id: UserId) -> Result<Option<UserRecord>, GatehouseError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, tier, active, created_at FROM users WHERE id = ?1",
                params![id.0],
                row_to_user,
            );
            match result {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set a user's subscription tier. Creates the record if it does not exist.
pub async fn set_tier(db: &Database, id: UserId, tier: Tier) -> Result<(), GatehouseError> {
    let now = iso_timestamp(chrono::Utc::now());
    let tier = tier.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (id, tier, active, created_at) VALUES (?1, ?2, 1, ?3)
                 ON CONFLICT(id) DO UPDATE SET tier = excluded.tier",
                params![id.0, tier, now],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a user as inactive. The record is retained.
pub async fn deactivate(db: &Database, id: UserId) -> Result<(), GatehouseError> {
    db.connection()
        .call(move |conn| {
            conn.execute("UPDATE users SET active = 0 WHERE id = ?1", params![id.0])?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_user_creates_free_tier_record() {
        let db = Database::open_in_memory().await.unwrap();
        let user = ensure_user(&db, UserId(7)).await.unwrap();
        assert_eq!(user.id, UserId(7));
        assert_eq!(user.tier, "free");
        assert!(user.active);
        assert!(!user.created_at.is_empty());
    }

    #[tokio::test]
    async fn ensure_user_is_idempotent() {
        let db = Database::open_in_memory().await.unwrap();
        let first = ensure_user(&db, UserId(7)).await.unwrap();
        set_tier(&db, UserId(7), Tier::Pro).await.unwrap();
        let second = ensure_user(&db, UserId(7)).await.unwrap();
        // A later ensure_user must not reset the tier or timestamp.
        assert_eq!(second.tier, "pro");
        assert_eq!(second.created_at, first.created_at);
    }

    #[tokio::test]
    async fn get_user_returns_none_for_unknown() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(get_user(&db, UserId(999)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_tier_creates_record_when_missing() {
        let db = Database::open_in_memory().await.unwrap();
        set_tier(&db, UserId(3), Tier::Elite).await.unwrap();
        let user = get_user(&db, UserId(3)).await.unwrap().unwrap();
        assert_eq!(user.tier, "elite");
    }

    #[tokio::test]
    async fn deactivate_retains_the_record() {
        let db = Database::open_in_memory().await.unwrap();
        ensure_user(&db, UserId(5)).await.unwrap();
        deactivate(&db, UserId(5)).await.unwrap();
        let user = get_user(&db, UserId(5)).await.unwrap().unwrap();
        assert!(!user.active);
    }
}
