use anyhow::{Context, Result};
use bigdecimal::BigDecimal;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection};
use std::str::FromStr;

use crate::entities::{Adjustment, Product, Rate, Region};
use crate::parser::ParsedRow;

/// Base tables in load order
pub const BASE_TABLES: [&str; 4] = ["product", "adjustment", "rate", "region"];

/// TableRecord - an entity stored in one base table
///
/// `COLUMNS` excludes surrogate keys, so the same list drives both
/// inserts and reads.
pub trait TableRecord: Sized {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    /// Column values in `COLUMNS` order
    fn to_values(&self) -> Vec<Value>;

    /// Build from a row selected with `COLUMNS`
    fn from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self>;
}

/// An insert that failed, with the position of the offending record
#[derive(Debug)]
pub struct InsertFailure {
    pub line: u64,
    pub error: anyhow::Error,
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL keeps readers on the old snapshot while a load rewrites the tables
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Products
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS product (
            plan_id INTEGER PRIMARY KEY,
            institution TEXT NOT NULL,
            loan_purpose TEXT NOT NULL,
            pmt_type TEXT NOT NULL,
            loan_type TEXT NOT NULL,
            loan_term INTEGER NOT NULL,
            int_adj_term INTEGER,
            adj_period INTEGER,
            io INTEGER,
            arm_index TEXT,
            int_adj_cap INTEGER,
            annual_cap INTEGER,
            loan_cap INTEGER,
            arm_margin TEXT,
            ai_value TEXT,
            min_ltv REAL NOT NULL,
            max_ltv REAL NOT NULL,
            min_fico INTEGER NOT NULL,
            max_fico INTEGER NOT NULL,
            min_loan_amt TEXT NOT NULL,
            max_loan_amt TEXT NOT NULL,
            single_family INTEGER,
            condo INTEGER,
            coop INTEGER,
            data_timestamp TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Adjustments (rule_id is not unique across products)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS adjustment (
            id INTEGER PRIMARY KEY,
            product_id INTEGER NOT NULL,
            rule_id INTEGER NOT NULL,
            affect_rate_type TEXT NOT NULL,
            adj_value TEXT NOT NULL,
            min_loan_amt TEXT,
            max_loan_amt TEXT,
            prop_type TEXT,
            min_fico INTEGER,
            max_fico INTEGER,
            min_ltv REAL,
            max_ltv REAL,
            state TEXT,
            data_timestamp TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Rates
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS rate (
            rate_id INTEGER PRIMARY KEY,
            product_id INTEGER NOT NULL,
            region_id INTEGER NOT NULL,
            lock INTEGER NOT NULL,
            base_rate TEXT NOT NULL,
            total_points TEXT NOT NULL,
            data_timestamp TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Regions (one row per state in a region)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS region (
            id INTEGER PRIMARY KEY,
            region_id INTEGER NOT NULL,
            state_id TEXT NOT NULL,
            is_primary INTEGER,
            data_timestamp TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_adjustment_product ON adjustment(product_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_rate_product ON rate(product_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_region_region ON region(region_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// VALUE CONVERSION
// ============================================================================

/// Decimals are stored as text so no precision is lost in REAL columns
pub fn decimal_value(value: &BigDecimal) -> Value {
    Value::Text(value.to_string())
}

pub fn opt_decimal_value(value: Option<&BigDecimal>) -> Value {
    value.map(decimal_value).unwrap_or(Value::Null)
}

pub fn timestamp_value(value: &DateTime<Utc>) -> Value {
    Value::Text(value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

pub fn read_opt_decimal(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<BigDecimal>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|s| {
        BigDecimal::from_str(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

pub fn read_decimal(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<BigDecimal> {
    read_opt_decimal(row, idx)?.ok_or(rusqlite::Error::InvalidColumnType(
        idx,
        "decimal".to_string(),
        Type::Null,
    ))
}

pub fn read_timestamp(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ============================================================================
// WRITES
// ============================================================================

/// Insert parsed records into their base table inside one SQLite transaction.
/// Nothing from the batch is kept if any row fails.
pub fn insert_records<T: TableRecord>(
    conn: &Connection,
    rows: &[ParsedRow<T>],
) -> std::result::Result<usize, InsertFailure> {
    let placeholders = (1..=T::COLUMNS.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        T::TABLE,
        T::COLUMNS.join(", "),
        placeholders
    );

    let batch_failure = |error: anyhow::Error| InsertFailure { line: 0, error };

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| batch_failure(e.into()))?;
    {
        let mut stmt = tx
            .prepare(&sql)
            .with_context(|| format!("Failed to prepare insert into {}", T::TABLE))
            .map_err(batch_failure)?;

        for row in rows {
            stmt.execute(params_from_iter(row.record.to_values()))
                .map_err(|e| InsertFailure {
                    line: row.line,
                    error: anyhow::Error::new(e)
                        .context(format!("Failed to insert into {}", T::TABLE)),
                })?;
        }
    }
    tx.commit().map_err(|e| batch_failure(e.into()))?;

    Ok(rows.len())
}

// ============================================================================
// READS
// ============================================================================

pub fn get_all<T: TableRecord>(conn: &Connection) -> Result<Vec<T>> {
    let sql = format!(
        "SELECT {} FROM {} ORDER BY rowid",
        T::COLUMNS.join(", "),
        T::TABLE
    );
    let mut stmt = conn.prepare(&sql)?;

    let records = stmt
        .query_map([], |row| T::from_sql(row))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read {}", T::TABLE))?;

    Ok(records)
}

pub fn get_all_products(conn: &Connection) -> Result<Vec<Product>> {
    get_all(conn)
}

pub fn get_all_adjustments(conn: &Connection) -> Result<Vec<Adjustment>> {
    get_all(conn)
}

pub fn get_all_rates(conn: &Connection) -> Result<Vec<Rate>> {
    get_all(conn)
}

pub fn get_all_regions(conn: &Connection) -> Result<Vec<Region>> {
    get_all(conn)
}

pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let count: i64 = conn
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .with_context(|| format!("Failed to count rows in {}", table))?;

    Ok(count)
}

pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![table],
        |row| row.get(0),
    )?;

    Ok(count > 0)
}

/// Distinct load timestamps across all four base tables.
/// A healthy dataset has exactly one.
pub fn data_timestamps(conn: &Connection) -> Result<Vec<DateTime<Utc>>> {
    let union = BASE_TABLES
        .iter()
        .map(|t| format!("SELECT data_timestamp FROM {}", t))
        .collect::<Vec<_>>()
        .join(" UNION ");
    let mut stmt = conn.prepare(&format!("{} ORDER BY data_timestamp", union))?;

    let timestamps = stmt
        .query_map([], |row| read_timestamp(row, 0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(timestamps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_file;

    fn sample_rates() -> Vec<ParsedRow<Rate>> {
        let data = "Is skipped\n\
                    592005635\t278474\t332\t30\t2.250\t1.250\n\
                    592005636\t278474\t332\t30\t2.375\t1.000\n";
        parse_file(data.as_bytes(), "rate.txt", Utc::now()).unwrap()
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();

        for table in BASE_TABLES {
            assert!(table_exists(&conn, table).unwrap());
            assert_eq!(count_rows(&conn, table).unwrap(), 0);
        }
    }

    #[test]
    fn test_insert_and_read_back_exact_decimals() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let rows = sample_rates();
        assert_eq!(insert_records(&conn, &rows).unwrap(), 2);

        let rates = get_all_rates(&conn).unwrap();
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0], rows[0].record);
        assert_eq!(rates[1].base_rate.to_string(), "2.375");
        assert_eq!(data_timestamps(&conn).unwrap(), vec![rows[0].record.data_timestamp]);
    }

    #[test]
    fn test_failed_insert_keeps_nothing_and_reports_line() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        // Same rate_id twice violates the primary key on the second row
        let mut rows = sample_rates();
        rows[1].record.rate_id = rows[0].record.rate_id;

        let failure = insert_records(&conn, &rows).unwrap_err();
        assert_eq!(failure.line, 3);
        assert_eq!(count_rows(&conn, "rate").unwrap(), 0);
    }

    #[test]
    fn test_table_exists() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!table_exists(&conn, "product").unwrap());
        setup_database(&conn).unwrap();
        assert!(table_exists(&conn, "product").unwrap());
    }
}
