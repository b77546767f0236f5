//! MacroDash CLI: fetch, view, export and store commands.
//!
//! Commands:
//! - `fetch`: download indicators into the series store
//! - `momentum` / `growth`: print a dashboard view, optionally as CSV
//! - `indicators`: list the registry with store state
//! - `store status`: report stored series, date ranges and sizes
//! - `store clean`: remove entries not refreshed recently
//! - `serve`: run the HTTP server

use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use macrodash_core::data::{StdoutProgress, StoreStatus};
use macrodash_core::domain::Period;
use macrodash_server::init_tracing;
use macrodash_service::{
    growth_csv, momentum_csv, write_csv, ApiResponse, Dashboard, DashboardConfig, GrowthEntry,
    MomentumEntry, DEFAULT_GROWTH_MONTHS,
};

#[derive(Parser)]
#[command(name = "macrodash", about = "MacroDash CLI: economic indicator dashboard")]
struct Cli {
    /// Path to a TOML config file. Defaults to ./macrodash.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store directory (overrides [store].dir).
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Serve deterministic synthetic series instead of calling providers.
    #[arg(long, global = true, default_value_t = false)]
    synthetic: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download indicators from their providers into the store.
    Fetch {
        /// Indicator keys (e.g., sp500 gold). Defaults to the whole registry.
        keys: Vec<String>,

        /// Refetch even when the stored copy is fresh.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Print the momentum view: each indicator rebased to 100.
    Momentum {
        /// Baseline period: current, 1m, 6m, 1y, 2y, 3y, 4y, 5y.
        #[arg(long, default_value = "1y")]
        period: String,

        /// Write the view as CSV to this path.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Use stored data only; no network access.
        #[arg(long, default_value_t = false)]
        offline: bool,
    },
    /// Print month-over-month growth.
    Growth {
        /// Trailing window in months.
        #[arg(long, default_value_t = DEFAULT_GROWTH_MONTHS)]
        months: usize,

        /// Write the view as CSV to this path.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Use stored data only; no network access.
        #[arg(long, default_value_t = false)]
        offline: bool,
    },
    /// List registered indicators and their store state.
    Indicators,
    /// Store management commands.
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
    /// Run the HTTP server.
    Serve {
        /// Override the listen port.
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Report stored series, date ranges and file sizes.
    Status,
    /// Remove stored series not refreshed within the given number of days.
    Clean {
        /// Remove entries last updated more than this many days ago.
        #[arg(long, default_value_t = 30)]
        days: i64,

        /// Actually delete (without this flag, only previews what would be removed).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

fn main() -> Result<()> {
    init_tracing("macrodash=warn");

    let cli = Cli::parse();
    let mut config = DashboardConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.store_dir {
        config.store.dir = dir;
    }
    let synthetic = cli.synthetic;
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Fetch { keys, force } => run_fetch(config, synthetic, &keys, force, today),
        Commands::Momentum {
            period,
            csv,
            offline,
        } => {
            config.fetch.offline |= offline;
            let dashboard = Dashboard::new(config).with_synthetic(synthetic);
            run_momentum(&dashboard, &period, csv, today)
        }
        Commands::Growth {
            months,
            csv,
            offline,
        } => {
            config.fetch.offline |= offline;
            let dashboard = Dashboard::new(config).with_synthetic(synthetic);
            run_growth(&dashboard, months, csv, today)
        }
        Commands::Indicators => run_indicators(&Dashboard::new(config)),
        Commands::Store { action } => match action {
            StoreAction::Status => run_store_status(&Dashboard::new(config)),
            StoreAction::Clean { days, confirm } => {
                run_store_clean(&Dashboard::new(config), days, confirm)
            }
        },
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let dashboard = Dashboard::new(config).with_synthetic(synthetic);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(macrodash_server::serve(dashboard))
        }
    }
}

fn run_fetch(
    config: DashboardConfig,
    synthetic: bool,
    keys: &[String],
    force: bool,
    today: NaiveDate,
) -> Result<()> {
    let dashboard = Dashboard::new(config).with_synthetic(synthetic);
    let summary = dashboard.refresh(keys, force, today, &StdoutProgress)?;

    for key in &summary.skipped {
        println!("  fresh, skipped: {key}");
    }

    if !summary.all_succeeded() {
        for (key, err) in &summary.errors {
            eprintln!("Error for {key}: {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run_momentum(
    dashboard: &Dashboard,
    period: &str,
    csv: Option<PathBuf>,
    today: NaiveDate,
) -> Result<()> {
    let period = Period::parse_or_fallback(period);
    let view = dashboard.momentum(period, today);
    if !view.success {
        bail!("no indicator could be rebased; run `macrodash fetch` first");
    }

    if let Some(path) = csv {
        write_csv(&path, &momentum_csv(&view)?)?;
        println!("Momentum ({period}) written to {}", path.display());
        return Ok(());
    }

    print_momentum(&view, period);
    Ok(())
}

fn run_growth(
    dashboard: &Dashboard,
    months: usize,
    csv: Option<PathBuf>,
    today: NaiveDate,
) -> Result<()> {
    let view = dashboard.growth(months, today);
    if !view.success {
        bail!("no indicator has two months of data; run `macrodash fetch` first");
    }

    if let Some(path) = csv {
        write_csv(&path, &growth_csv(&view)?)?;
        println!("Growth ({months} months) written to {}", path.display());
        return Ok(());
    }

    print_growth(&view);
    Ok(())
}

fn run_indicators(dashboard: &Dashboard) -> Result<()> {
    let listing = dashboard.indicators();

    println!(
        "{:<12} {:<28} {:<7} {:<12} {:<12} {:>7}  Updated",
        "Key", "Name", "Source", "Source ID", "Category", "Points"
    );
    println!("{}", "-".repeat(100));
    for info in &listing {
        let updated = info
            .last_updated
            .map_or_else(|| "(not stored)".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        println!(
            "{:<12} {:<28} {:<7} {:<12} {:<12} {:>7}  {}",
            info.key,
            truncate(&info.name, 28),
            info.source.to_string(),
            info.source_id,
            info.category,
            info.points,
            updated
        );
    }
    Ok(())
}

fn run_store_status(dashboard: &Dashboard) -> Result<()> {
    let store = dashboard.store();
    if !store.dir().exists() {
        println!("Store directory does not exist: {}", store.dir().display());
        return Ok(());
    }

    let keys = store.list()?;
    if keys.is_empty() {
        println!("Store is empty: {}", store.dir().display());
        return Ok(());
    }

    let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    let rows = store.status(&key_refs);
    let total_size: u64 = rows.iter().map(|r| r.size_bytes).sum();

    println!("Store: {}", store.dir().display());
    println!("Series: {}", rows.len());
    println!("Total size: {}", format_size(total_size));
    println!();
    println!(
        "{:<12} {:<25} {:<8} {:<18} {:>10}",
        "Indicator", "Date Range", "Points", "Updated", "Size"
    );
    println!("{}", "-".repeat(77));
    for row in &rows {
        println!(
            "{:<12} {:<25} {:<8} {:<18} {:>10}",
            row.indicator,
            date_range(row),
            row.points,
            row.last_updated
                .map_or_else(|| "(unreadable)".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string()),
            format_size(row.size_bytes)
        );
    }

    Ok(())
}

fn run_store_clean(dashboard: &Dashboard, days: i64, confirm: bool) -> Result<()> {
    let store = dashboard.store();
    if !store.dir().exists() {
        println!("Store directory does not exist: {}", store.dir().display());
        return Ok(());
    }

    let stale = store.stale_entries(chrono::Duration::days(days), Utc::now())?;
    if stale.is_empty() {
        println!("No series older than {days} days to remove.");
        return Ok(());
    }

    println!("Found {} series not refreshed in {days} days:", stale.len());
    for row in &stale {
        println!("  {} ({})", row.indicator, format_size(row.size_bytes));
    }

    if !confirm {
        println!();
        println!("Dry run: pass --confirm to actually delete.");
        return Ok(());
    }

    let mut removed = 0;
    for row in &stale {
        if store.remove(&row.indicator)? {
            removed += 1;
            println!("Removed: {}", row.indicator);
        }
    }

    println!("Done. Removed {removed} series.");
    Ok(())
}

fn print_momentum(view: &ApiResponse<MomentumEntry>, period: Period) {
    println!();
    println!("=== Momentum ({period}) ===");
    println!(
        "{:<12} {:<28} {:<12} {:<12} {:>10}",
        "Indicator", "Name", "Baseline", "Latest", "Value"
    );
    println!("{}", "-".repeat(78));
    for (key, entry) in &view.data {
        let baseline = entry
            .baseline_date
            .map_or_else(|| "-".to_string(), |d| d.to_string());
        let (latest, value) = match (entry.dates.last(), entry.values.last()) {
            (Some(d), Some(v)) => (d.to_string(), format!("{v:.2}")),
            _ => ("-".to_string(), "-".to_string()),
        };
        println!(
            "{:<12} {:<28} {:<12} {:<12} {:>10}",
            key,
            truncate(&entry.name, 28),
            baseline,
            latest,
            value
        );
    }
    println!();
}

fn print_growth(view: &ApiResponse<GrowthEntry>) {
    println!();
    println!("=== Month-over-month growth ===");
    println!(
        "{:<12} {:<28} {:<10} {:>9} {:>9} {:>9}",
        "Indicator", "Name", "Latest", "Growth", "Min", "Max"
    );
    println!("{}", "-".repeat(82));
    for (key, entry) in &view.data {
        let latest = entry.dates.last().map_or("-", String::as_str);
        let last = entry.values.last().copied().unwrap_or(f64::NAN);
        let min = entry.values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = entry.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        println!(
            "{:<12} {:<28} {:<10} {:>8.2}% {:>8.2}% {:>8.2}%",
            key,
            truncate(&entry.name, 28),
            latest,
            last,
            min,
            max
        );
    }
    println!();
}

fn date_range(row: &StoreStatus) -> String {
    match (row.first_date, row.last_date) {
        (Some(first), Some(last)) => format!("{first} to {last}"),
        _ => "(empty)".to_string(),
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let cut: String = s.chars().take(width - 1).collect();
        format!("{cut}…")
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
