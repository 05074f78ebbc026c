// Adjustment - a rate/price delta that applies to a product within bounds

use crate::coerce::{nullable_decimal, nullable_float, nullable_int, nullable_string};
use crate::db::{self, TableRecord};
use crate::error::ParseError;
use crate::parser::{FileKind, RecordParser, Row};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Adjustment {
    pub product_id: i64,
    pub rule_id: i64,
    /// `P` adjusts points, `R` adjusts the rate
    pub affect_rate_type: String,
    pub adj_value: BigDecimal,

    // Bounds; null means unbounded on that side
    pub min_loan_amt: Option<BigDecimal>,
    pub max_loan_amt: Option<BigDecimal>,
    pub prop_type: Option<String>,
    pub min_fico: Option<i64>,
    pub max_fico: Option<i64>,
    pub min_ltv: Option<f64>,
    pub max_ltv: Option<f64>,
    pub state: Option<String>,

    pub data_timestamp: DateTime<Utc>,
}

impl RecordParser for Adjustment {
    const KIND: FileKind = FileKind::Adjustment;

    fn parse_row(row: &Row<'_>, data_timestamp: DateTime<Utc>) -> Result<Self, ParseError> {
        Ok(Adjustment {
            product_id: row.required(0, "product_id", nullable_int)?,
            rule_id: row.required(1, "rule_id", nullable_int)?,
            affect_rate_type: row.text(2, "affect_rate_type")?,
            adj_value: row.required(3, "adj_value", nullable_decimal)?,
            min_loan_amt: row.nullable(4, "min_loan_amt", nullable_decimal)?,
            max_loan_amt: row.nullable(5, "max_loan_amt", nullable_decimal)?,
            prop_type: nullable_string(row.token(6)),
            min_fico: row.nullable(7, "min_fico", nullable_int)?,
            max_fico: row.nullable(8, "max_fico", nullable_int)?,
            min_ltv: row.nullable(9, "min_ltv", nullable_float)?,
            max_ltv: row.nullable(10, "max_ltv", nullable_float)?,
            state: nullable_string(row.token(11)),
            data_timestamp,
        })
    }
}

impl TableRecord for Adjustment {
    const TABLE: &'static str = "adjustment";
    const COLUMNS: &'static [&'static str] = &[
        "product_id",
        "rule_id",
        "affect_rate_type",
        "adj_value",
        "min_loan_amt",
        "max_loan_amt",
        "prop_type",
        "min_fico",
        "max_fico",
        "min_ltv",
        "max_ltv",
        "state",
        "data_timestamp",
    ];

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::from(self.product_id),
            Value::from(self.rule_id),
            Value::from(self.affect_rate_type.clone()),
            db::decimal_value(&self.adj_value),
            db::opt_decimal_value(self.min_loan_amt.as_ref()),
            db::opt_decimal_value(self.max_loan_amt.as_ref()),
            Value::from(self.prop_type.clone()),
            Value::from(self.min_fico),
            Value::from(self.max_fico),
            Value::from(self.min_ltv),
            Value::from(self.max_ltv),
            Value::from(self.state.clone()),
            db::timestamp_value(&self.data_timestamp),
        ]
    }

    fn from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Adjustment {
            product_id: row.get(0)?,
            rule_id: row.get(1)?,
            affect_rate_type: row.get(2)?,
            adj_value: db::read_decimal(row, 3)?,
            min_loan_amt: db::read_opt_decimal(row, 4)?,
            max_loan_amt: db::read_opt_decimal(row, 5)?,
            prop_type: row.get(6)?,
            min_fico: row.get(7)?,
            max_fico: row.get(8)?,
            min_ltv: row.get(9)?,
            max_ltv: row.get(10)?,
            state: row.get(11)?,
            data_timestamp: db::read_timestamp(row, 12)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_file;
    use std::str::FromStr;

    #[test]
    fn test_parse_adjustments() {
        let data = "Is skipped anyway\n\
                    7487\t67600\tP\t-0.25\t\t\t\t720\t739\t1\t60\t\n\
                    7488\t73779\tP\t0\t850001.000\t1000000.000\t\t\t\t\t\t\n";
        let rows = parse_file::<Adjustment, _>(data.as_bytes(), "a.txt", Utc::now()).unwrap();

        assert_eq!(rows.len(), 2);
        let first = &rows[0].record;
        assert_eq!(first.product_id, 7487);
        assert_eq!(first.rule_id, 67600);
        assert_eq!(first.adj_value, BigDecimal::from_str("-0.25").unwrap());
        assert_eq!(first.min_loan_amt, None);
        assert_eq!(first.min_fico, Some(720));
        assert_eq!(first.max_ltv, Some(60.0));
        assert_eq!(first.state, None);

        let second = &rows[1].record;
        assert_eq!(second.min_loan_amt, Some(BigDecimal::from(850_001)));
        assert_eq!(second.min_fico, None);
    }

    #[test]
    fn test_bad_adj_value_fails() {
        let data = "h\n7487\t67600\tP\tabc\t\t\t\t\t\t\t\t\n";
        let err = parse_file::<Adjustment, _>(data.as_bytes(), "a.txt", Utc::now()).unwrap_err();
        assert!(err.to_string().contains("adj_value"));
    }
}
