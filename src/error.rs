//! Error taxonomy for metadata reading and schema emission

use std::io;
use thiserror::Error;

/// Errors produced while reading metadata or writing the XSD document.
///
/// Every variant is fatal: a run either produces a complete schema file or
/// nothing at all.
#[derive(Debug, Error)]
pub enum Error {
    /// The metadata source could not be reached, opened or authenticated against
    #[error("cannot connect to {target}: {source}")]
    Connectivity {
        target: String,
        #[source]
        source: tiberius::error::Error,
    },

    /// A metadata query failed after the connection was established
    #[error("metadata query `{query}` failed: {source}")]
    MetadataQuery {
        query: &'static str,
        #[source]
        source: tiberius::error::Error,
    },

    /// A metadata row is missing a field or has an unexpected shape
    #[error("malformed metadata for `{table}`: {detail}")]
    MalformedMetadata { table: String, detail: String },

    /// The same table name was reported twice
    #[error("table `{0}` was reported more than once")]
    DuplicateTable(String),

    /// A key references a table or column that is not part of the schema
    #[error("{constraint} references unknown {target}")]
    DanglingReference { constraint: String, target: String },

    /// The output sink could not be created or written
    #[error("failed to write schema: {0}")]
    Write(#[from] io::Error),
}

impl Error {
    pub(crate) fn malformed(table: &str, detail: impl Into<String>) -> Self {
        Error::MalformedMetadata {
            table: table.to_string(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
