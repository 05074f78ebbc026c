use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;
use std::path::PathBuf;
use tracing::info;

use ratechecker_loader::logging::{init_logging, LogFormat};
use ratechecker_loader::{
    setup_database, Loader, LoaderConfig, LogNotifier, ReportFileNotifier, SqliteStore,
};

/// Load the newest daily rate archive into the ratechecker tables
#[derive(Parser, Debug)]
#[command(name = "ratechecker-load", version)]
struct Cli {
    /// Directory holding <YYYYMMDD>.zip archives
    #[arg(env = "RATECHECKER_SOURCE_DIR")]
    source_dir: Option<PathBuf>,

    /// SQLite database with the product/adjustment/rate/region tables
    #[arg(long, env = "RATECHECKER_DATABASE", default_value = "ratechecker.db")]
    database: PathBuf,

    /// Write the JSON report of a failed run here instead of only logging it
    #[arg(long, env = "RATECHECKER_REPORT_FILE")]
    report_file: Option<PathBuf>,

    /// Call restore even when the archive could not be opened
    #[arg(long)]
    restore_unstaged: bool,

    /// Log output format: text or json
    #[arg(long, default_value = "text")]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format)?;

    let conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open database {}", cli.database.display()))?;
    setup_database(&conn)?;
    info!(database = %cli.database.display(), "database ready");

    let config = LoaderConfig {
        restore_unstaged: cli.restore_unstaged,
    };
    let loader = Loader::new(SqliteStore::new(&conn), config);
    let source_dir = cli.source_dir.as_deref();
    let report = match &cli.report_file {
        Some(path) => loader
            .with_notifier(ReportFileNotifier::new(path))
            .run(source_dir),
        None => loader.with_notifier(LogNotifier).run(source_dir),
    };

    for message in &report.messages {
        eprintln!("{}", message);
    }
    if report.is_success() {
        println!(
            "✓ Loaded {} products, {} adjustments, {} rates, {} regions",
            report.counts.products,
            report.counts.adjustments,
            report.counts.rates,
            report.counts.regions
        );
    } else if report.dataset_at_risk {
        eprintln!("❌ Restore failed: base tables may be empty");
    }

    drop(conn);
    std::process::exit(i32::from(report.status));
}
