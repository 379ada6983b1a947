// SPDX-FileCopyrightText: 2026 Gatehouse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gatehouse - session and admission control engine for chat AI bots.
//!
//! This is the binary entry point: the admin command surface over the
//! engine's durable state.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::collections::HashSet;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gatehouse_admission::{AdmissionController, TracingAuditSink};
use gatehouse_config::model::GatehouseConfig;
use gatehouse_control::ControlPlane;
use gatehouse_core::GatehouseError;
use gatehouse_core::types::{Tier, UserId};
use gatehouse_policy::TierPolicy;
use gatehouse_quota::QuotaLedger;
use gatehouse_storage::Database;

mod admin;
mod stats;
mod status;

/// Gatehouse - session and admission control engine for chat AI bots.
#[derive(Parser, Debug)]
#[command(name = "gatehouse", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the global bot status.
    Status {
        /// Output structured JSON for scripting.
        #[arg(long)]
        json: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Turn the bot on (admin only).
    Enable {
        /// Acting admin user id; must be in the configured allow-list.
        #[arg(long)]
        admin: i64,
    },
    /// Turn the bot off (admin only).
    Disable {
        /// Acting admin user id; must be in the configured allow-list.
        #[arg(long)]
        admin: i64,
    },
    /// Show a user's quota usage against their tier limits.
    Stats {
        /// Target user id.
        #[arg(long)]
        user: i64,
        /// Output structured JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// Change a user's subscription tier.
    SetTier {
        /// Target user id.
        #[arg(long)]
        user: i64,
        /// New tier: free, basic, pro, or elite.
        #[arg(long)]
        tier: Tier,
    },
    /// Mark a user as inactive. The record is retained.
    Deactivate {
        /// Target user id.
        #[arg(long)]
        user: i64,
    },
    /// Clear a user's retained dialog history.
    ResetContext {
        /// Target user id.
        #[arg(long)]
        user: i64,
    },
}

/// Engine handles shared by the subcommands.
struct Engine {
    db: Database,
    control: Arc<ControlPlane>,
    controller: AdmissionController,
}

/// Open storage and wire up the engine components from validated config.
async fn build_engine(config: &GatehouseConfig) -> Result<Engine, GatehouseError> {
    let db = Database::open_with(&config.storage.database_path, config.storage.wal_mode).await?;

    let tz: chrono_tz::Tz = config
        .quota
        .timezone
        .parse()
        .map_err(|_| GatehouseError::Config(format!(
            "unknown timezone: {}",
            config.quota.timezone
        )))?;

    let admins: HashSet<UserId> = config.admin.allow_list.iter().map(|&id| UserId(id)).collect();
    let control = Arc::new(ControlPlane::load(db.clone(), admins).await?);
    let policy = Arc::new(TierPolicy::new(&config.quota.tiers));
    let ledger = QuotaLedger::new(db.clone(), tz);
    let controller = AdmissionController::new(
        db.clone(),
        control.clone(),
        policy,
        ledger,
        Arc::new(TracingAuditSink),
        &config.engine,
    );

    Ok(Engine {
        db,
        control,
        controller,
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Refuse to start on missing or malformed configuration.
    let config = match gatehouse_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            gatehouse_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.engine.log_level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli, &config).await {
        eprintln!("gatehouse: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &GatehouseConfig) -> Result<(), GatehouseError> {
    let Some(command) = cli.command else {
        println!("gatehouse: use --help for available commands");
        return Ok(());
    };

    let engine = build_engine(config).await?;

    match command {
        Commands::Status { json, plain } => {
            status::run_status(&engine.control, json, plain)?;
        }
        Commands::Enable { admin } => {
            admin::run_set_active(&engine.control, true, UserId(admin)).await?;
        }
        Commands::Disable { admin } => {
            admin::run_set_active(&engine.control, false, UserId(admin)).await?;
        }
        Commands::Stats { user, json } => {
            stats::run_stats(&engine.controller, UserId(user), json).await?;
        }
        Commands::SetTier { user, tier } => {
            admin::run_set_tier(&engine.db, UserId(user), tier).await?;
        }
        Commands::Deactivate { user } => {
            admin::run_deactivate(&engine.db, UserId(user)).await?;
        }
        Commands::ResetContext { user } => {
            let store = gatehouse_context::ContextStore::new(
                engine.db.clone(),
                config.engine.history_limit,
            );
            admin::run_reset_context(&store, UserId(user)).await?;
        }
    }

    engine.db.close().await?;
    Ok(())
}
