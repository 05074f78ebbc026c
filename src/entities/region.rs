// Region - maps a pricing region to the states it covers

use crate::coerce::{nullable_int, string_to_boolean};
use crate::db::{self, TableRecord};
use crate::error::ParseError;
use crate::parser::{FileKind, RecordParser, Row};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    /// Not unique: one row per state in the region
    pub region_id: i64,
    pub state_id: String,
    pub is_primary: Option<bool>,
    pub data_timestamp: DateTime<Utc>,
}

impl RecordParser for Region {
    const KIND: FileKind = FileKind::Region;

    fn parse_row(row: &Row<'_>, data_timestamp: DateTime<Utc>) -> Result<Self, ParseError> {
        Ok(Region {
            region_id: row.required(0, "region_id", nullable_int)?,
            state_id: row.text(1, "state_id")?,
            is_primary: string_to_boolean(row.token(2)),
            data_timestamp,
        })
    }
}

impl TableRecord for Region {
    const TABLE: &'static str = "region";
    const COLUMNS: &'static [&'static str] =
        &["region_id", "state_id", "is_primary", "data_timestamp"];

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::from(self.region_id),
            Value::from(self.state_id.clone()),
            Value::from(self.is_primary),
            db::timestamp_value(&self.data_timestamp),
        ]
    }

    fn from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Region {
            region_id: row.get(0)?,
            state_id: row.get(1)?,
            is_primary: row.get(2)?,
            data_timestamp: db::read_timestamp(row, 3)?,
        })
    }
}
