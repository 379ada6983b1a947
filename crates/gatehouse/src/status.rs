// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `gatehouse status` command implementation.
//!
//! Shows the durable global bot flag and when it last changed.

use std::io::IsTerminal;

use serde::Serialize;

use gatehouse_control::ControlPlane;
use gatehouse_core::GatehouseError;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub active: bool,
    pub updated_at: String,
}

/// Run the `gatehouse status` command.
///
/// If `--json` is passed, outputs structured JSON for scripting.
/// If `--plain` is passed or stdout is not a TTY, disables colors.
pub fn run_status(
    control: &ControlPlane,
    json: bool,
    plain: bool,
) -> Result<(), GatehouseError> {
    let status = control.status();

    if json {
        let resp = StatusResponse {
            active: status.is_active,
            updated_at: status.updated_at,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&resp).unwrap_or_else(|_| "{}".to_string())
        );
        return Ok(());
    }

    let use_color = !plain && std::io::stdout().is_terminal();
    println!();
    println!("  gatehouse status");
    println!("  {}", "-".repeat(35));

    if use_color {
        use colored::Colorize;
        if status.is_active {
            println!("    Bot:      {} {}", "✓".green(), "active".green());
        } else {
            println!("    Bot:      {} {}", "✗".red(), "disabled".red());
        }
    } else if status.is_active {
        println!("    Bot:      [OK] active");
    } else {
        println!("    Bot:      [OFF] disabled");
    }

    println!("    Changed:  {}", status.updated_at);
    println!();
    Ok(())
}
