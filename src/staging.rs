// Staging Manager - shadow copies of the base tables
//
// SQLite transactions cannot span the whole reload (parsing happens between
// statements and a failed run must still leave something to restore from),
// so the previous dataset is copied into `temporary_<table>` mirrors before
// anything is deleted, and copied back if the load fails.

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::db::{count_rows, table_exists, BASE_TABLES};

pub const MIRROR_PREFIX: &str = "temporary_";

pub fn mirror_name(table: &str) -> String {
    format!("{}{}", MIRROR_PREFIX, table)
}

/// Snapshot every base table into its mirror.
///
/// Mirrors are created when missing and emptied when present, so a mirror
/// left behind by an earlier run never leaks stale rows into this snapshot.
pub fn archive_data_to_temp_tables(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    for table in BASE_TABLES {
        let mirror = mirror_name(table);
        let leftover = staged_row_count(&tx, &mirror)?;
        if leftover > 0 {
            warn!(
                table,
                mirror = %mirror,
                rows = leftover,
                "mirror left by an interrupted run is being overwritten"
            );
        }
        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {mirror} AS SELECT * FROM {table} WHERE 0;
             DELETE FROM {mirror};
             INSERT INTO {mirror} SELECT * FROM {table};"
        ))
        .with_context(|| format!("Failed to snapshot {} into {}", table, mirror))?;
        debug!(table, mirror = %mirror, "staged base table");
    }

    tx.commit()?;
    info!("previous data staged in mirror tables");
    Ok(())
}

/// Rows currently held by a mirror, 0 when the mirror does not exist.
pub fn staged_row_count(conn: &Connection, mirror: &str) -> Result<i64> {
    if !table_exists(conn, mirror)? {
        return Ok(0);
    }
    count_rows(conn, mirror)
}

/// Remove every row from the base tables; the schema stays.
pub fn delete_data_from_base_tables(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    for table in BASE_TABLES {
        let deleted = tx
            .execute(&format!("DELETE FROM {}", table), [])
            .with_context(|| format!("Failed to clear {}", table))?;
        debug!(table, deleted, "cleared base table");
    }

    tx.commit()?;
    Ok(())
}

/// Drop the mirror tables. Missing mirrors are not an error.
pub fn delete_temp_tables(conn: &Connection) -> Result<()> {
    for table in BASE_TABLES {
        let mirror = mirror_name(table);
        conn.execute(&format!("DROP TABLE IF EXISTS {}", mirror), [])
            .with_context(|| format!("Failed to drop {}", mirror))?;
    }

    Ok(())
}

/// Put the staged rows back into the base tables, then drop the mirrors.
///
/// A base table whose mirror does not exist is left as it is.
pub fn reload_old_data(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    for table in BASE_TABLES {
        let mirror = mirror_name(table);
        if !table_exists(&tx, &mirror)? {
            warn!(table, mirror = %mirror, "no staged copy, base table left untouched");
            continue;
        }

        tx.execute_batch(&format!(
            "DELETE FROM {table};
             INSERT INTO {table} SELECT * FROM {mirror};
             DROP TABLE {mirror};"
        ))
        .with_context(|| format!("Failed to restore {} from {}", table, mirror))?;
        debug!(table, "restored base table");
    }

    tx.commit()?;
    info!("previous data restored from mirror tables");
    Ok(())
}
