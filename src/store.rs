// Record store seam used by the loader

use anyhow::Result;
use rusqlite::Connection;

use crate::db::{self, InsertFailure, TableRecord};
use crate::parser::ParsedRow;
use crate::staging;

/// RateStore - base tables plus the snapshot/restore/discard capability
pub trait RateStore {
    /// Copy the current base tables into the mirrors
    fn snapshot(&self) -> Result<()>;

    /// Delete every row of the base tables
    fn clear_base(&self) -> Result<()>;

    /// Put the mirrored rows back and drop the mirrors
    fn restore(&self) -> Result<()>;

    /// Drop the mirrors after a successful load
    fn discard(&self) -> Result<()>;

    /// Bulk insert one file's records
    fn insert<T: TableRecord>(&self, rows: &[ParsedRow<T>]) -> std::result::Result<usize, InsertFailure>;
}

/// SQLite-backed store. Every statement of a run goes through one connection.
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        SqliteStore { conn }
    }

    pub fn connection(&self) -> &'c Connection {
        self.conn
    }
}

impl RateStore for SqliteStore<'_> {
    fn snapshot(&self) -> Result<()> {
        staging::archive_data_to_temp_tables(self.conn)
    }

    fn clear_base(&self) -> Result<()> {
        staging::delete_data_from_base_tables(self.conn)
    }

    fn restore(&self) -> Result<()> {
        staging::reload_old_data(self.conn)
    }

    fn discard(&self) -> Result<()> {
        staging::delete_temp_tables(self.conn)
    }

    fn insert<T: TableRecord>(&self, rows: &[ParsedRow<T>]) -> std::result::Result<usize, InsertFailure> {
        db::insert_records(self.conn, rows)
    }
}
