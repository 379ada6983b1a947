// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `gatehouse stats` command implementation.
//!
//! Prints a user's quota usage against their tier limits. A pure read:
//! never charges quota.

use gatehouse_admission::AdmissionController;
use gatehouse_core::GatehouseError;
use gatehouse_core::types::UserId;

/// Run the `gatehouse stats --user <id>` command.
pub async fn run_stats(
    controller: &AdmissionController,
    user: UserId,
    json: bool,
) -> Result<(), GatehouseError> {
    let stats = controller.stats(user).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).unwrap_or_else(|_| "{}".to_string())
        );
        return Ok(());
    }

    println!();
    println!("  gatehouse stats for user {user}");
    println!("  {}", "-".repeat(35));
    println!("    Tier:     {}", stats.tier);
    for entry in &stats.snapshot.entries {
        println!(
            "    {:<20} {:>4} / {:<4} ({} left)",
            entry.kind.to_string(),
            entry.used,
            entry.cap,
            entry.remaining
        );
    }
    if stats.snapshot.entries.is_empty() {
        println!("    (no counters recorded)");
    }
    println!();
    Ok(())
}
