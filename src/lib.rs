// Ratechecker Daily Loader - Core Library
// Replaces the product/adjustment/rate/region tables from the newest daily
// archive, restoring the previous data if any stage fails

pub mod coerce;
pub mod error;
pub mod parser;
pub mod entities;
pub mod db;
pub mod archive;
pub mod staging;
pub mod store;
pub mod loader;
pub mod notify;
pub mod logging;

// Re-export commonly used types
pub use coerce::{
    nullable_decimal, nullable_flag, nullable_float, nullable_int, nullable_string,
    string_to_boolean,
};
pub use error::{ArchiveError, FieldError, LoadError, ParseError};
pub use parser::{parse_file, FileKind, ParsedRow, RecordParser};
pub use entities::{Adjustment, Product, Rate, Region};
pub use db::{
    TableRecord, setup_database, insert_records, get_all_products, get_all_adjustments,
    get_all_rates, get_all_regions, count_rows, data_timestamps,
};
pub use archive::{list_archives, ArchiveEntry, DailyArchive};
pub use staging::{
    archive_data_to_temp_tables, delete_data_from_base_tables, delete_temp_tables,
    reload_old_data,
};
pub use store::{RateStore, SqliteStore};
pub use loader::{load_archive_data, LoadCounts, Loader, LoaderConfig, RunReport, RunState};
pub use notify::{LogNotifier, Notifier, ReportFileNotifier};
