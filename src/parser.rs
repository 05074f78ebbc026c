// Record parsers for the four tab-delimited daily files
// One parser per entity, all driven by the same csv reader setup

use crate::coerce::Coerced;
use crate::error::{FieldError, ParseError};
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::io::Read;

// ============================================================================
// FILE KINDS
// ============================================================================

/// FileKind - which of the four daily files a member holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    Product,
    Adjustment,
    Rate,
    Region,
}

impl FileKind {
    /// Load order inside a run
    pub const ALL: [FileKind; 4] = [
        FileKind::Product,
        FileKind::Adjustment,
        FileKind::Rate,
        FileKind::Region,
    ];

    /// Suffix used in member names (`<date>_<suffix>.txt`)
    pub fn suffix(&self) -> &'static str {
        match self {
            FileKind::Product => "product",
            FileKind::Adjustment => "adjustment",
            FileKind::Rate => "rate",
            FileKind::Region => "region",
        }
    }

    /// Member name inside the archive for a given date stem
    pub fn member_name(&self, date_stem: &str) -> String {
        format!("{}_{}.txt", date_stem, self.suffix())
    }
}

// ============================================================================
// ROW ACCESS
// ============================================================================

/// One data row plus where it came from, for error reporting
pub struct Row<'r> {
    record: &'r StringRecord,
    file: &'r str,
    line: u64,
}

impl<'r> Row<'r> {
    pub fn new(record: &'r StringRecord, file: &'r str, line: u64) -> Self {
        Row { record, file, line }
    }

    /// Raw token; a column past the end of the row reads as empty
    pub fn token(&self, index: usize) -> &'r str {
        self.record.get(index).unwrap_or("")
    }

    /// Coerce a nullable column, tagging failures with file/line/column
    pub fn nullable<T>(
        &self,
        index: usize,
        column: &'static str,
        coerce: impl Fn(&str) -> Coerced<T>,
    ) -> Result<Option<T>, ParseError> {
        coerce(self.token(index)).map_err(|source| self.field_error(column, source))
    }

    /// Coerce a required column; blank is an error
    pub fn required<T>(
        &self,
        index: usize,
        column: &'static str,
        coerce: impl Fn(&str) -> Coerced<T>,
    ) -> Result<T, ParseError> {
        self.nullable(index, column, coerce)?
            .ok_or_else(|| self.field_error(column, FieldError::Missing))
    }

    /// Required text column
    pub fn text(&self, index: usize, column: &'static str) -> Result<String, ParseError> {
        self.required(index, column, |t| Ok(crate::coerce::nullable_string(t)))
    }

    fn field_error(&self, column: &'static str, source: FieldError) -> ParseError {
        ParseError::Field {
            file: self.file.to_string(),
            line: self.line,
            column,
            source,
        }
    }
}

// ============================================================================
// PARSER TRAIT
// ============================================================================

/// RecordParser - implemented by each entity type
pub trait RecordParser: Sized {
    /// Which daily file this entity is read from
    const KIND: FileKind;

    /// Build one record from a data row, stamped with the run timestamp
    fn parse_row(row: &Row<'_>, data_timestamp: DateTime<Utc>) -> Result<Self, ParseError>;
}

/// A parsed record and the line it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow<T> {
    pub line: u64,
    pub record: T,
}

/// Parse every data row of one file. The first line is always a header.
pub fn parse_file<T: RecordParser, R: Read>(
    reader: R,
    file_name: &str,
    data_timestamp: DateTime<Utc>,
) -> Result<Vec<ParsedRow<T>>, ParseError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut rows = Vec::new();
    let mut record = StringRecord::new();

    loop {
        let more = reader.read_record(&mut record).map_err(|e| ParseError::Malformed {
            file: file_name.to_string(),
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;
        if !more {
            break;
        }

        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let row = Row::new(&record, file_name, line);
        let parsed = T::parse_row(&row, data_timestamp)?;
        rows.push(ParsedRow { line, record: parsed });
    }

    Ok(rows)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Rate, Region};

    #[test]
    fn test_file_kind_member_names() {
        assert_eq!(FileKind::Product.member_name("20140101"), "20140101_product.txt");
        assert_eq!(FileKind::Region.member_name("20140101"), "20140101_region.txt");
        assert_eq!(
            FileKind::ALL.iter().map(|k| k.suffix()).collect::<Vec<_>>(),
            vec!["product", "adjustment", "rate", "region"]
        );
    }

    #[test]
    fn test_header_is_skipped() {
        let data = "Is skipped\n12\tAK\tTrue\n12\tAL\tFalse\n";
        let now = Utc::now();
        let rows: Vec<ParsedRow<Region>> = parse_file(data.as_bytes(), "r.txt", now).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].record.state_id, "AK");
        assert_eq!(rows[1].line, 3);
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let rows: Vec<ParsedRow<Rate>> =
            parse_file("rate_id\tproduct_id\n".as_bytes(), "rate.txt", Utc::now()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_parse_error_names_file_line_and_column() {
        let data = "header\n1\t12\t200\t40\t3.125\t3\n2\tX\t200\t40\t3.125\t3\n";
        let err = parse_file::<Rate, _>(data.as_bytes(), "20140101_rate.txt", Utc::now())
            .unwrap_err();

        assert_eq!(
            err,
            ParseError::Field {
                file: "20140101_rate.txt".to_string(),
                line: 3,
                column: "product_id",
                source: FieldError::InvalidInt("X".to_string()),
            }
        );
        assert!(err.to_string().contains("20140101_rate.txt line 3"));
    }
}
