// Product - one mortgage plan offered by an institution
//
// Source columns (tab-delimited, header skipped):
//   plan_id institution loan_purpose pmt_type loan_type loan_term
//   int_adj_term adj_period io arm_index int_adj_cap annual_cap loan_cap
//   arm_margin ai_value min_ltv max_ltv min_fico max_fico
//   min_loan_amt max_loan_amt [single_family condo coop]

use crate::coerce::{
    nullable_decimal, nullable_flag, nullable_float, nullable_int, nullable_string,
    string_to_boolean,
};
use crate::db::{self, TableRecord};
use crate::error::ParseError;
use crate::parser::{FileKind, RecordParser, Row};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub plan_id: i64,
    pub institution: String,
    pub loan_purpose: String,
    pub pmt_type: String,
    pub loan_type: String,
    /// Term as published by the feed (30, 15, ...)
    pub loan_term: i64,

    // ARM-only fields, null for fixed-rate plans
    pub int_adj_term: Option<i64>,
    pub adj_period: Option<i64>,
    pub io: Option<bool>,
    pub arm_index: Option<String>,
    pub int_adj_cap: Option<i64>,
    pub annual_cap: Option<i64>,
    pub loan_cap: Option<i64>,
    pub arm_margin: Option<BigDecimal>,
    pub ai_value: Option<BigDecimal>,

    pub min_ltv: f64,
    pub max_ltv: f64,
    pub min_fico: i64,
    pub max_fico: i64,
    pub min_loan_amt: BigDecimal,
    pub max_loan_amt: BigDecimal,

    // Property types the plan applies to
    pub single_family: Option<bool>,
    pub condo: Option<bool>,
    pub coop: Option<bool>,

    pub data_timestamp: DateTime<Utc>,
}

impl RecordParser for Product {
    const KIND: FileKind = FileKind::Product;

    fn parse_row(row: &Row<'_>, data_timestamp: DateTime<Utc>) -> Result<Self, ParseError> {
        Ok(Product {
            plan_id: row.required(0, "plan_id", nullable_int)?,
            institution: row.text(1, "institution")?,
            loan_purpose: row.text(2, "loan_purpose")?,
            pmt_type: row.text(3, "pmt_type")?,
            loan_type: row.text(4, "loan_type")?,
            loan_term: row.required(5, "loan_term", nullable_int)?,
            int_adj_term: row.nullable(6, "int_adj_term", nullable_int)?,
            adj_period: row.nullable(7, "adj_period", nullable_int)?,
            io: string_to_boolean(row.token(8)),
            arm_index: nullable_string(row.token(9)),
            int_adj_cap: row.nullable(10, "int_adj_cap", nullable_int)?,
            annual_cap: row.nullable(11, "annual_cap", nullable_int)?,
            loan_cap: row.nullable(12, "loan_cap", nullable_int)?,
            arm_margin: row.nullable(13, "arm_margin", nullable_decimal)?,
            ai_value: row.nullable(14, "ai_value", nullable_decimal)?,
            min_ltv: row.required(15, "min_ltv", nullable_float)?,
            max_ltv: row.required(16, "max_ltv", nullable_float)?,
            min_fico: row.required(17, "min_fico", nullable_int)?,
            max_fico: row.required(18, "max_fico", nullable_int)?,
            min_loan_amt: row.required(19, "min_loan_amt", nullable_decimal)?,
            max_loan_amt: row.required(20, "max_loan_amt", nullable_decimal)?,
            single_family: row.nullable(21, "single_family", nullable_flag)?,
            condo: row.nullable(22, "condo", nullable_flag)?,
            coop: row.nullable(23, "coop", nullable_flag)?,
            data_timestamp,
        })
    }
}

impl TableRecord for Product {
    const TABLE: &'static str = "product";
    const COLUMNS: &'static [&'static str] = &[
        "plan_id",
        "institution",
        "loan_purpose",
        "pmt_type",
        "loan_type",
        "loan_term",
        "int_adj_term",
        "adj_period",
        "io",
        "arm_index",
        "int_adj_cap",
        "annual_cap",
        "loan_cap",
        "arm_margin",
        "ai_value",
        "min_ltv",
        "max_ltv",
        "min_fico",
        "max_fico",
        "min_loan_amt",
        "max_loan_amt",
        "single_family",
        "condo",
        "coop",
        "data_timestamp",
    ];

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::from(self.plan_id),
            Value::from(self.institution.clone()),
            Value::from(self.loan_purpose.clone()),
            Value::from(self.pmt_type.clone()),
            Value::from(self.loan_type.clone()),
            Value::from(self.loan_term),
            Value::from(self.int_adj_term),
            Value::from(self.adj_period),
            Value::from(self.io),
            Value::from(self.arm_index.clone()),
            Value::from(self.int_adj_cap),
            Value::from(self.annual_cap),
            Value::from(self.loan_cap),
            db::opt_decimal_value(self.arm_margin.as_ref()),
            db::opt_decimal_value(self.ai_value.as_ref()),
            Value::from(self.min_ltv),
            Value::from(self.max_ltv),
            Value::from(self.min_fico),
            Value::from(self.max_fico),
            db::decimal_value(&self.min_loan_amt),
            db::decimal_value(&self.max_loan_amt),
            Value::from(self.single_family),
            Value::from(self.condo),
            Value::from(self.coop),
            db::timestamp_value(&self.data_timestamp),
        ]
    }

    fn from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Product {
            plan_id: row.get(0)?,
            institution: row.get(1)?,
            loan_purpose: row.get(2)?,
            pmt_type: row.get(3)?,
            loan_type: row.get(4)?,
            loan_term: row.get(5)?,
            int_adj_term: row.get(6)?,
            adj_period: row.get(7)?,
            io: row.get(8)?,
            arm_index: row.get(9)?,
            int_adj_cap: row.get(10)?,
            annual_cap: row.get(11)?,
            loan_cap: row.get(12)?,
            arm_margin: db::read_opt_decimal(row, 13)?,
            ai_value: db::read_opt_decimal(row, 14)?,
            min_ltv: row.get(15)?,
            max_ltv: row.get(16)?,
            min_fico: row.get(17)?,
            max_fico: row.get(18)?,
            min_loan_amt: db::read_decimal(row, 19)?,
            max_loan_amt: db::read_decimal(row, 20)?,
            single_family: row.get(21)?,
            condo: row.get(22)?,
            coop: row.get(23)?,
            data_timestamp: db::read_timestamp(row, 24)?,
        })
    }
}
