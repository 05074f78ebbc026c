// Load Orchestrator - replaces the four base tables from the newest archive
//
//   Idle → ArchiveSelected → OldDataStaged → BaseTablesCleared → NewDataLoaded
//                 │                               │                  │
//                 └──────────── Failed ◄──────────┴──────────────────┘
//                                 │
//                 OldDataRestored / RestoreFailed
//
// Nothing is deleted before the previous data is staged. Any failure after
// that point restores the staged copy.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, info_span, warn};

use crate::archive::{list_archives, DailyArchive};
use crate::db::TableRecord;
use crate::entities::{Adjustment, Product, Rate, Region};
use crate::error::{ArchiveError, LoadError};
use crate::notify::Notifier;
use crate::parser::{parse_file, FileKind, RecordParser};
use crate::store::RateStore;

pub const RELOAD_WARNING: &str = "Warning: reloading \"yesterday\" data.";

// ============================================================================
// RUN REPORT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    ArchiveSelected,
    OldDataStaged,
    BaseTablesCleared,
    NewDataLoaded,
    Failed,
    OldDataRestored,
    /// Restoration itself failed; base tables may be empty
    RestoreFailed,
}

/// Rows inserted per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadCounts {
    pub products: usize,
    pub adjustments: usize,
    pub rates: usize,
    pub regions: usize,
}

impl LoadCounts {
    fn record(&mut self, kind: FileKind, rows: usize) {
        match kind {
            FileKind::Product => self.products = rows,
            FileKind::Adjustment => self.adjustments = rows,
            FileKind::Rate => self.rates = rows,
            FileKind::Region => self.regions = rows,
        }
    }
}

/// Outcome of one run: status code plus the ordered operator messages
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    /// 0 = success, 1 = failure
    pub status: u8,
    pub state: RunState,
    pub messages: Vec<String>,
    pub archive: Option<PathBuf>,
    pub archive_date: Option<NaiveDate>,
    /// Stamped on every row inserted by this run
    pub data_timestamp: DateTime<Utc>,
    pub counts: LoadCounts,
    /// Set when restoring the previous data failed
    pub dataset_at_risk: bool,
}

impl RunReport {
    pub fn new(data_timestamp: DateTime<Utc>) -> Self {
        RunReport {
            run_id: uuid::Uuid::new_v4().to_string(),
            status: 0,
            state: RunState::Idle,
            messages: Vec::new(),
            archive: None,
            archive_date: None,
            data_timestamp,
            counts: LoadCounts::default(),
            dataset_at_risk: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 0
    }

    fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message);
        self.messages.push(message);
    }

    fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!(%message);
        self.messages.push(message);
    }

    fn advance(&mut self, state: RunState) {
        info!(?state, "load state");
        self.state = state;
    }

    fn fail(&mut self, state: RunState) {
        self.advance(state);
        self.status = 1;
    }
}

// ============================================================================
// LOADER
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct LoaderConfig {
    /// Call restore even when the archive failed to open before anything was
    /// staged. Off by default: with nothing staged there is nothing to
    /// restore, and a mirror left by an earlier crashed run would be copied
    /// over the live tables.
    pub restore_unstaged: bool,
}

pub struct Loader<S: RateStore> {
    store: S,
    config: LoaderConfig,
    notifier: Option<Box<dyn Notifier>>,
}

impl<S: RateStore> Loader<S> {
    pub fn new(store: S, config: LoaderConfig) -> Self {
        Loader {
            store,
            config,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Some(Box::new(notifier));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replace the base tables from the newest archive in `source_dir`.
    /// Never panics or returns an error: every outcome is in the report.
    pub fn run(&self, source_dir: Option<&Path>) -> RunReport {
        let mut report = RunReport::new(Utc::now());
        let span = info_span!("daily_load", run_id = %report.run_id);
        let _guard = span.enter();

        self.execute(source_dir, &mut report);

        if report.is_success() {
            info!(counts = ?report.counts, "daily load complete");
        } else if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.notify(&report) {
                warn!(error = %format!("{:#}", e), "failed to notify operators");
            }
        }

        report
    }

    fn execute(&self, source_dir: Option<&Path>, report: &mut RunReport) {
        // ── select ────────────────────────────────────────────────────────
        let Some(dir) = source_dir else {
            report.error("Error: no source directory was given. Has a source directory been provided?");
            report.fail(RunState::Failed);
            return;
        };

        let archives = match list_archives(dir) {
            Ok(archives) => archives,
            Err(e) => {
                report.error(format!("Error: {}. Has a source directory been provided?", e));
                report.fail(RunState::Failed);
                return;
            }
        };

        let Some(entry) = archives.into_iter().next() else {
            report.error(format!("Error: no archive found in {}.", dir.display()));
            report.fail(RunState::Failed);
            return;
        };
        report.archive = Some(entry.path.clone());
        report.archive_date = Some(entry.date);
        report.advance(RunState::ArchiveSelected);

        // ── open ──────────────────────────────────────────────────────────
        let opened = DailyArchive::open(&entry).and_then(|archive| {
            archive.verify_members()?;
            Ok(archive)
        });
        let mut archive = match opened {
            Ok(archive) => archive,
            Err(e) => {
                match &e {
                    ArchiveError::NotAZip { .. } => report.warn(format!("Warning: {}.", e)),
                    _ => report.error(format!("Error: {}.", e)),
                }
                report.warn(RELOAD_WARNING);
                if self.config.restore_unstaged {
                    self.restore(report);
                } else {
                    info!("nothing was staged, base tables untouched");
                    report.fail(RunState::Failed);
                }
                return;
            }
        };

        // ── stage ─────────────────────────────────────────────────────────
        if let Err(e) = self.store.snapshot() {
            report.error(format!("Error: {}.", LoadError::Staging(e)));
            report.fail(RunState::Failed);
            return;
        }
        report.advance(RunState::OldDataStaged);

        // ── clear ─────────────────────────────────────────────────────────
        if let Err(e) = self.store.clear_base() {
            report.error(format!("Error: {}.", LoadError::Clear(e)));
            report.warn(RELOAD_WARNING);
            self.restore(report);
            return;
        }
        report.advance(RunState::BaseTablesCleared);

        // ── load ──────────────────────────────────────────────────────────
        match load_archive_data(&self.store, &mut archive, report.data_timestamp) {
            Ok(counts) => report.counts = counts,
            Err(e) => {
                report.error(format!("Error: {}.", e));
                report.warn(RELOAD_WARNING);
                self.restore(report);
                return;
            }
        }
        report.advance(RunState::NewDataLoaded);

        // The new data is in place; a leftover mirror is only untidy
        if let Err(e) = self.store.discard() {
            report.warn(format!("Warning: failed to drop mirror tables: {:#}.", e));
        }
    }

    fn restore(&self, report: &mut RunReport) {
        match self.store.restore() {
            Ok(()) => report.fail(RunState::OldDataRestored),
            Err(e) => {
                report.error(format!(
                    "Fatal: {}. Base tables may be empty until the next successful load.",
                    LoadError::Restore(e)
                ));
                report.dataset_at_risk = true;
                report.fail(RunState::RestoreFailed);
            }
        }
    }
}

/// Parse and insert all four files of an opened archive, in load order.
/// The caller is responsible for staging and clearing the base tables.
pub fn load_archive_data<S: RateStore>(
    store: &S,
    archive: &mut DailyArchive,
    data_timestamp: DateTime<Utc>,
) -> Result<LoadCounts, LoadError> {
    let mut counts = LoadCounts::default();

    for kind in FileKind::ALL {
        let rows = match kind {
            FileKind::Product => load_file::<Product, S>(store, archive, data_timestamp)?,
            FileKind::Adjustment => load_file::<Adjustment, S>(store, archive, data_timestamp)?,
            FileKind::Rate => load_file::<Rate, S>(store, archive, data_timestamp)?,
            FileKind::Region => load_file::<Region, S>(store, archive, data_timestamp)?,
        };
        counts.record(kind, rows);
    }

    Ok(counts)
}

fn load_file<T, S>(
    store: &S,
    archive: &mut DailyArchive,
    data_timestamp: DateTime<Utc>,
) -> Result<usize, LoadError>
where
    T: RecordParser + TableRecord,
    S: RateStore,
{
    let (name, contents) = archive.member(T::KIND)?;
    let rows = parse_file::<T, _>(contents.as_slice(), &name, data_timestamp)?;

    let inserted = store.insert(&rows).map_err(|failure| LoadError::Insert {
        file: name.clone(),
        line: failure.line,
        source: failure.error,
    })?;

    info!(file = %name, rows = inserted, "loaded file");
    Ok(inserted)
}

// ============================================================================
// TESTS
// ============================================================================
