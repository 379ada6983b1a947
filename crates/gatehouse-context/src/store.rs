// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded, ordered conversation history per user.
//!
//! This is a retention window, not an LRU cache: dialog is sequential, so
//! insertion order equals semantic order and eviction is strict FIFO by
//! sequence number.

use rusqlite::params;
use tracing::debug;

use gatehouse_core::GatehouseError;
use gatehouse_core::types::{ContextEntry, Role, UserId, iso_timestamp};
use gatehouse_storage::Database;
use gatehouse_storage::database::map_tr_err;

/// Store for the bounded dialog history supplied to downstream AI calls.
#[derive(Clone)]
pub struct ContextStore {
    db: Database,
    history_limit: usize,
}

impl ContextStore {
    /// Create a store retaining at most `history_limit` entries per user.
    pub fn new(db: Database, history_limit: usize) -> Self {
        Self { db, history_limit }
    }

    /// The configured retention limit.
    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Append one turn, assigning the next sequence number and evicting the
    /// oldest entries beyond the limit, all in one transaction.
    pub async fn append(
        &self,
        user: UserId,
        role: Role,
        content: &str,
    ) -> Result<(), GatehouseError> {
        let content = content.to_string();
        let role = role.to_string();
        let created_at = iso_timestamp(chrono::Utc::now());
        let limit = self.history_limit as i64;

        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;

                let next_seq: i64 = tx.query_row(
                    "SELECT COALESCE(MAX(seq), 0) + 1 FROM context_entries WHERE user_id = ?1",
                    params![user.0],
                    |row| row.get(0),
                )?;

                tx.execute(
                    "INSERT INTO context_entries (user_id, seq, role, content, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![user.0, next_seq, role, content, created_at],
                )?;

                // Sequence numbers are contiguous per user (appends assign
                // max+1, eviction removes the low end), so everything at or
                // below next_seq - limit is excess.
                tx.execute(
                    "DELETE FROM context_entries WHERE user_id = ?1 AND seq <= ?2",
                    params![user.0, next_seq - limit],
                )?;

                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// The retained entries for a user, oldest first.
    pub async fn recent(&self, user: UserId) -> Result<Vec<ContextEntry>, GatehouseError> {
        self.db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT user_id, seq, role, content, created_at
                     FROM context_entries WHERE user_id = ?1 ORDER BY seq ASC",
                )?;
                let rows = stmt.query_map(params![user.0], |row| {
                    let role: String = row.get(2)?;
                    Ok(ContextEntry {
                        user: UserId(row.get(0)?),
                        seq: row.get(1)?,
                        role: role.parse::<Role>().map_err(|_| {
                            rusqlite::Error::InvalidColumnType(
                                2,
                                "role".to_string(),
                                rusqlite::types::Type::Text,
                            )
                        })?,
                        content: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?;
                let mut entries = Vec::new();
                for row in rows {
                    entries.push(row?);
                }
                Ok(entries)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Clear all entries for a user (explicit `/reset` by the caller).
    pub async fn reset(&self, user: UserId) -> Result<(), GatehouseError> {
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "DELETE FROM context_entries WHERE user_id = ?1",
                    params![user.0],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!(user = %user, "context reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 4;

    async fn store() -> ContextStore {
        let db = Database::open_in_memory().await.unwrap();
        ContextStore::new(db, LIMIT)
    }

    #[tokio::test]
    async fn append_and_recent_preserve_order() {
        let store = store().await;
        let user = UserId(1);
        store.append(user, Role::User, "hello").await.unwrap();
        store.append(user, Role::Assistant, "hi there").await.unwrap();

        let entries = store.recent(user).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].role, Role::User);
        assert_eq!(entries[0].content, "hello");
        assert_eq!(entries[1].role, Role::Assistant);
        assert!(entries[0].seq < entries[1].seq);
    }

    #[tokio::test]
    async fn eviction_keeps_exactly_the_newest_entries() {
        let store = store().await;
        let user = UserId(1);
        // LIMIT + 3 appends leave exactly LIMIT entries, the most recent
        // ones, in chronological order.
        for i in 0..(LIMIT + 3) {
            store
                .append(user, Role::User, &format!("turn {i}"))
                .await
                .unwrap();
        }

        let entries = store.recent(user).await.unwrap();
        assert_eq!(entries.len(), LIMIT);
        let expected: Vec<String> =
            (3..LIMIT + 3).map(|i| format!("turn {i}")).collect();
        let actual: Vec<String> = entries.iter().map(|e| e.content.clone()).collect();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn users_do_not_share_history() {
        let store = store().await;
        store.append(UserId(1), Role::User, "mine").await.unwrap();
        store.append(UserId(2), Role::User, "yours").await.unwrap();

        let entries = store.recent(UserId(1)).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "mine");
    }

    #[tokio::test]
    async fn reset_clears_only_that_user() {
        let store = store().await;
        store.append(UserId(1), Role::User, "a").await.unwrap();
        store.append(UserId(2), Role::User, "b").await.unwrap();

        store.reset(UserId(1)).await.unwrap();
        assert!(store.recent(UserId(1)).await.unwrap().is_empty());
        assert_eq!(store.recent(UserId(2)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn recent_is_empty_for_unknown_user() {
        let store = store().await;
        assert!(store.recent(UserId(404)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_after_reset_starts_clean() {
        let store = store().await;
        let user = UserId(1);
        for i in 0..LIMIT {
            store
                .append(user, Role::User, &format!("old {i}"))
                .await
                .unwrap();
        }
        store.reset(user).await.unwrap();
        store.append(user, Role::User, "fresh").await.unwrap();

        let entries = store.recent(user).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "fresh");
    }
}
