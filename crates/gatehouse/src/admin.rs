// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `gatehouse enable` / `disable` / `set-tier` / `deactivate` commands.
//!
//! The enable/disable pair goes through the control plane so the admin
//! allow-list is enforced; user record maintenance writes storage directly.

use gatehouse_context::ContextStore;
use gatehouse_control::ControlPlane;
use gatehouse_core::GatehouseError;
use gatehouse_core::types::{Tier, UserId};
use gatehouse_storage::Database;
use gatehouse_storage::queries::users;

/// Run `gatehouse enable` or `gatehouse disable`.
pub async fn run_set_active(
    control: &ControlPlane,
    active: bool,
    acting_admin: UserId,
) -> Result<(), GatehouseError> {
    control.set_active(active, acting_admin).await?;
    println!(
        "gatehouse: bot {}",
        if active { "enabled" } else { "disabled" }
    );
    Ok(())
}

/// Run `gatehouse set-tier --user <id> --tier <tier>`.
pub async fn run_set_tier(
    db: &Database,
    user: UserId,
    tier: Tier,
) -> Result<(), GatehouseError> {
    users::set_tier(db, user, tier).await?;
    println!("gatehouse: user {user} set to tier {tier}");
    Ok(())
}

/// Run `gatehouse deactivate --user <id>`.
pub async fn run_deactivate(db: &Database, user: UserId) -> Result<(), GatehouseError> {
    users::deactivate(db, user).await?;
    println!("gatehouse: user {user} deactivated");
    Ok(())
}

/// Run `gatehouse reset-context --user <id>`.
pub async fn run_reset_context(
    store: &ContextStore,
    user: UserId,
) -> Result<(), GatehouseError> {
    store.reset(user).await?;
    println!("gatehouse: context cleared for user {user}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ADMIN: UserId = UserId(1);

    #[tokio::test]
    async fn enable_disable_round_trips_through_control_plane() {
        let db = Database::open_in_memory().await.unwrap();
        let control = ControlPlane::load(db, HashSet::from([ADMIN])).await.unwrap();

        run_set_active(&control, false, ADMIN).await.unwrap();
        assert!(!control.get_active());
        run_set_active(&control, true, ADMIN).await.unwrap();
        assert!(control.get_active());
    }

    #[tokio::test]
    async fn non_admin_cannot_toggle() {
        let db = Database::open_in_memory().await.unwrap();
        let control = ControlPlane::load(db, HashSet::from([ADMIN])).await.unwrap();

        let err = run_set_active(&control, false, UserId(2)).await.unwrap_err();
        assert!(matches!(err, GatehouseError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn reset_context_clears_history() {
        use gatehouse_core::types::Role;

        let db = Database::open_in_memory().await.unwrap();
        let store = ContextStore::new(db, 16);
        store.append(UserId(3), Role::User, "hello").await.unwrap();

        run_reset_context(&store, UserId(3)).await.unwrap();
        assert!(store.recent(UserId(3)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_tier_and_deactivate_update_the_record() {
        let db = Database::open_in_memory().await.unwrap();
        run_set_tier(&db, UserId(5), Tier::Elite).await.unwrap();
        run_deactivate(&db, UserId(5)).await.unwrap();

        let record = users::get_user(&db, UserId(5)).await.unwrap().unwrap();
        assert_eq!(record.tier, "elite");
        assert!(!record.active);
    }
}
