//! Error types for the daily loader

use std::path::PathBuf;
use thiserror::Error;

/// Failure to coerce a single raw token
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("invalid integer {0:?}")]
    InvalidInt(String),

    #[error("invalid decimal {0:?}")]
    InvalidDecimal(String),

    #[error("invalid float {0:?}")]
    InvalidFloat(String),

    #[error("invalid flag {0:?}")]
    InvalidFlag(String),

    #[error("missing required value")]
    Missing,
}

/// A row of a source file that could not be turned into a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{file} line {line}: column `{column}`: {source}")]
    Field {
        file: String,
        line: u64,
        column: &'static str,
        #[source]
        source: FieldError,
    },

    #[error("{file} line {line}: malformed record: {message}")]
    Malformed {
        file: String,
        line: u64,
        message: String,
    },
}

/// Problems locating or reading the daily archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("cannot read source directory {path}: {source}")]
    SourceDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File is not a zip file")]
    NotAZip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("archive {archive} has no member {member}")]
    MissingMember { archive: String, member: String },

    #[error("failed to read {member} from {archive}: {source}")]
    Read {
        archive: String,
        member: String,
        #[source]
        source: std::io::Error,
    },
}

/// Stage-tagged failure inside a load run
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{file} line {line}: insert failed: {source}")]
    Insert {
        file: String,
        line: u64,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to stage previous data: {0:#}")]
    Staging(anyhow::Error),

    #[error("failed to clear base tables: {0:#}")]
    Clear(anyhow::Error),

    #[error("failed to restore previous data: {0:#}")]
    Restore(anyhow::Error),
}
