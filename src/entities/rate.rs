// Rate - base rate and points for a product in a region and lock period

use crate::coerce::{nullable_decimal, nullable_int};
use crate::db::{self, TableRecord};
use crate::error::ParseError;
use crate::parser::{FileKind, RecordParser, Row};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rate {
    pub rate_id: i64,
    pub product_id: i64,
    pub region_id: i64,
    /// Lock period in days
    pub lock: i64,
    pub base_rate: BigDecimal,
    pub total_points: BigDecimal,
    pub data_timestamp: DateTime<Utc>,
}

impl RecordParser for Rate {
    const KIND: FileKind = FileKind::Rate;

    fn parse_row(row: &Row<'_>, data_timestamp: DateTime<Utc>) -> Result<Self, ParseError> {
        Ok(Rate {
            rate_id: row.required(0, "rate_id", nullable_int)?,
            product_id: row.required(1, "product_id", nullable_int)?,
            region_id: row.required(2, "region_id", nullable_int)?,
            lock: row.required(3, "lock", nullable_int)?,
            base_rate: row.required(4, "base_rate", nullable_decimal)?,
            total_points: row.required(5, "total_points", nullable_decimal)?,
            data_timestamp,
        })
    }
}

impl TableRecord for Rate {
    const TABLE: &'static str = "rate";
    const COLUMNS: &'static [&'static str] = &[
        "rate_id",
        "product_id",
        "region_id",
        "lock",
        "base_rate",
        "total_points",
        "data_timestamp",
    ];

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::from(self.rate_id),
            Value::from(self.product_id),
            Value::from(self.region_id),
            Value::from(self.lock),
            db::decimal_value(&self.base_rate),
            db::decimal_value(&self.total_points),
            db::timestamp_value(&self.data_timestamp),
        ]
    }

    fn from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Rate {
            rate_id: row.get(0)?,
            product_id: row.get(1)?,
            region_id: row.get(2)?,
            lock: row.get(3)?,
            base_rate: db::read_decimal(row, 4)?,
            total_points: db::read_decimal(row, 5)?,
            data_timestamp: db::read_timestamp(row, 6)?,
        })
    }
}
