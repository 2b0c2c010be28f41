//! # Salon DevTools
//!
//! Developer console for the reconciliation passes.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  salon-devtools [--config FILE] [--db PATH] [--json] <command>          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SalonConfig::load ──► init_tracing(filter) ──► Database::new           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StockReplayer / OrderSequencer / self_test                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  summary line (or pretty JSON with --json)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use salon_core::ledger::{TransactionKind, TransactionRef};
use salon_core::OrderCategory;
use salon_db::Database;
use salon_ops::{self_test, OrderSequencer, RecalcSummary, RenumberReport, SalonConfig, StockReplayer};

// =============================================================================
// Command Line
// =============================================================================

#[derive(Parser)]
#[command(name = "salon-devtools", about = "Salon POS stock and order maintenance", version)]
struct Cli {
    /// Config file (defaults to the platform config directory).
    #[arg(long, global = true, env = "SALON_CONFIG")]
    config: Option<PathBuf>,

    /// Database file, overriding the config.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recalculate stock for one product or every active product.
    RecalcStock {
        #[arg(long)]
        product: Option<String>,
    },
    /// Delete one ledger row and recalculate its product.
    DeleteTransaction {
        #[arg(long, value_enum)]
        kind: KindArg,
        #[arg(long)]
        id: String,
    },
    /// Backfill order categories, then renumber every order.
    MigrateOrderIds,
    /// Renumber every order densely per partition.
    RenumberOrders,
    /// Replace missing or timestamp-fallback order identifiers.
    RepairOrderIds,
    /// Migrate and renumber orders.
    FullOrderUpdate,
    /// Migrate and renumber orders, then recalculate all stock.
    FullSystemUpdate,
    /// Show the identifier the next order would receive.
    NextOrderId {
        /// Salon-consumption partition instead of sales.
        #[arg(long)]
        salon: bool,
    },
    /// Read one row from every stock table.
    SelfTest,
    /// Inspect or create the config file.
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration.
    Show,
    /// Write the default configuration file.
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Purchase,
    Sale,
    Consumption,
}

impl From<KindArg> for TransactionKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Purchase => TransactionKind::Purchase,
            KindArg::Sale => TransactionKind::Sale,
            KindArg::Consumption => TransactionKind::Consumption,
        }
    }
}

// =============================================================================
// Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = SalonConfig::load(cli.config.clone()).context("failed to load config")?;
    if let Some(db) = &cli.db {
        config.database.path = db.clone();
    }
    init_tracing(&config.logging.filter);

    let json = cli.json;
    let command = match cli.command {
        Commands::Config(command) => {
            return handle_config_command(&config, cli.config, &command, json);
        }
        other => other,
    };

    let db = Database::new(config.db_config())
        .await
        .with_context(|| format!("failed to open {}", config.database.path.display()))?;
    info!(path = %config.database.path.display(), "Database ready");

    let replayer = StockReplayer::new(db.clone());
    let sequencer = OrderSequencer::new(db.clone());

    match command {
        Commands::RecalcStock { product: Some(name) } => {
            let result = replayer.recalculate_product(&name).await?;
            emit(json, &result, || {
                format!(
                    "{}: stock {} ({} transactions)",
                    result.product_name, result.final_stock, result.transactions
                )
            })?;
        }
        Commands::RecalcStock { product: None } => {
            let summary = replayer.recalculate_all().await?;
            emit(json, &summary, || recalc_line(&summary))?;
            check_recalc(&summary)?;
        }
        Commands::DeleteTransaction { kind, id } => {
            let target = TransactionRef::new(kind.into(), id);
            let result = replayer.remove_transaction(&target).await?;
            emit(json, &result, || {
                format!(
                    "Deleted {} {}; {} stock now {}",
                    target.kind, target.id, result.product_name, result.final_stock
                )
            })?;
        }
        Commands::MigrateOrderIds => {
            let report = sequencer.migrate_order_ids().await?;
            emit(json, &report, || {
                format!(
                    "Categorized {} legacy orders; {}",
                    report.categorized,
                    renumber_line(&report.renumber)
                )
            })?;
            check_renumber(&report.renumber)?;
        }
        Commands::RenumberOrders => {
            let report = sequencer.renumber_all().await?;
            emit(json, &report, || renumber_line(&report))?;
            check_renumber(&report)?;
        }
        Commands::RepairOrderIds => {
            let report = sequencer.repair_order_ids().await?;
            emit(json, &report, || {
                format!(
                    "{} broken identifiers; {}",
                    report.flagged,
                    renumber_line(&report.renumber)
                )
            })?;
            check_renumber(&report.renumber)?;
        }
        Commands::FullOrderUpdate => {
            let migration = sequencer.migrate_order_ids().await?;
            emit(json, &migration, || renumber_line(&migration.renumber))?;
            check_renumber(&migration.renumber)?;
        }
        Commands::FullSystemUpdate => {
            let migration = sequencer.migrate_order_ids().await?;
            let stock = replayer.recalculate_all().await?;
            let report = SystemUpdate {
                categorized: migration.categorized,
                renumber: &migration.renumber,
                stock: &stock,
            };
            emit(json, &report, || {
                format!("{}\n{}", renumber_line(&migration.renumber), recalc_line(&stock))
            })?;
            check_renumber(&migration.renumber)?;
            check_recalc(&stock)?;
        }
        Commands::NextOrderId { salon } => {
            let category = OrderCategory::from_salon_flag(salon);
            let id = sequencer.next_order_id(category).await;
            emit(json, &id, || id.clone())?;
        }
        Commands::SelfTest => {
            let report = self_test(&db).await?;
            emit(json, &report, || {
                format!(
                    "{} (purchases {}, sales {}, consumption {}, products {})",
                    report.message,
                    report.purchase_records,
                    report.sales_records,
                    report.consumption_records,
                    report.product_records
                )
            })?;
        }
        Commands::Config(_) => {}
    }

    db.close().await;
    Ok(())
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// =============================================================================
// Config Commands
// =============================================================================

fn handle_config_command(
    config: &SalonConfig,
    path: Option<PathBuf>,
    command: &ConfigCommands,
    json: bool,
) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            if json {
                print_json(config)?;
            } else {
                print!("{}", toml::to_string_pretty(config)?);
            }
        }
        ConfigCommands::Init { force } => {
            let target = path
                .or_else(SalonConfig::default_config_path)
                .context("no config directory on this platform")?;
            if target.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", target.display());
            }
            let written = SalonConfig::default().save(Some(target))?;
            println!("Wrote {}", written.display());
        }
    }
    Ok(())
}

// =============================================================================
// Output
// =============================================================================

#[derive(Serialize)]
struct SystemUpdate<'a> {
    categorized: usize,
    renumber: &'a RenumberReport,
    stock: &'a RecalcSummary,
}

fn emit<T: Serialize>(json: bool, value: &T, line: impl FnOnce() -> String) -> Result<()> {
    if json {
        print_json(value)
    } else {
        println!("{}", line());
        Ok(())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn renumber_line(report: &RenumberReport) -> String {
    format!(
        "Renumbered {} orders ({} changed, {} partitions failed)",
        report.total_orders(),
        report.total_changed(),
        report.failed.len()
    )
}

fn recalc_line(summary: &RecalcSummary) -> String {
    let degraded = summary
        .updated
        .iter()
        .filter(|p| !p.degraded.is_empty())
        .count();
    format!(
        "Recalculated {} products ({} failed, {} from incomplete ledgers)",
        summary.updated.len(),
        summary.failed.len(),
        degraded
    )
}

fn check_renumber(report: &RenumberReport) -> Result<()> {
    if report.is_clean() {
        return Ok(());
    }
    let partitions: Vec<String> = report.failed.iter().map(|f| f.category.to_string()).collect();
    bail!("renumbering failed for: {}", partitions.join(", "))
}

fn check_recalc(summary: &RecalcSummary) -> Result<()> {
    if summary.failed.is_empty() {
        return Ok(());
    }
    let products: Vec<&str> = summary.failed.iter().map(|f| f.product_name.as_str()).collect();
    bail!("stock recalculation failed for: {}", products.join(", "))
}
