// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot status singleton persistence.
//!
//! A single row (id = 1) holds the global kill-switch so it survives
//! process restarts.

use rusqlite::params;

use gatehouse_core::GatehouseError;

use crate::database::Database;
use crate::models::BotStatusRow;

/// Load the persisted status, if one was ever written.
pub async fn load_status(db: &Database) -> Result<Option<BotStatusRow>, GatehouseError> {
    db.connection()
        .call(|conn| {
            let result = conn.query_row(
                "SELECT is_active, updated_at FROM bot_status WHERE id = 1",
                [],
                |row| {
                    Ok(BotStatusRow {
                        is_active: row.get::<_, i64>(0)? != 0,
                        updated_at: row.get(1)?,
                    })
                },
            );
            match result {
                Ok(status) => Ok(Some(status)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Persist the status singleton, inserting or overwriting the single row.
pub async fn save_status(db: &Database, status: &BotStatusRow) -> Result<(), GatehouseError> {
    let status = status.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO bot_status (id, is_active, updated_at) VALUES (1, ?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET
                     is_active = excluded.is_active,
                     updated_at = excluded.updated_at",
                params![status.is_active as i64, status.updated_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_status_is_none_on_fresh_database() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(load_status(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let db = Database::open_in_memory().await.unwrap();
        let status = BotStatusRow {
            is_active: false,
            updated_at: "2026-08-25T10:00:00.000Z".to_string(),
        };
        save_status(&db, &status).await.unwrap();
        assert_eq!(load_status(&db).await.unwrap(), Some(status));
    }

    #[tokio::test]
    async fn save_overwrites_the_singleton() {
        let db = Database::open_in_memory().await.unwrap();
        save_status(
            &db,
            &BotStatusRow {
                is_active: true,
                updated_at: "2026-08-25T10:00:00.000Z".to_string(),
            },
        )
        .await
        .unwrap();
        save_status(
            &db,
            &BotStatusRow {
                is_active: false,
                updated_at: "2026-08-25T11:00:00.000Z".to_string(),
            },
        )
        .await
        .unwrap();

        let loaded = load_status(&db).await.unwrap().unwrap();
        assert!(!loaded.is_active);
        assert_eq!(loaded.updated_at, "2026-08-25T11:00:00.000Z");
    }
}
