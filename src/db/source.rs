//! Metadata source abstraction
//!
//! Defines the reads the schema assembler needs from a database, plus the raw
//! row shapes they return. Rows keep every field optional so that a missing
//! value surfaces as malformed metadata instead of a panic.

use crate::error::Result;
use async_trait::async_trait;

/// Row from the base-table listing
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawTable {
    pub name: Option<String>,
}

/// Row from the column listing of one table
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawColumn {
    pub name: Option<String>,
    pub data_type: Option<String>,
    /// `IS_NULLABLE` text; only `"NO"` means not nullable
    pub is_nullable: Option<String>,
    /// `CHARACTER_MAXIMUM_LENGTH`; `-1` for `MAX` types
    pub max_length: Option<i32>,
    pub is_identity: Option<bool>,
}

/// One member column of a primary key constraint
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawPrimaryKey {
    pub constraint_name: Option<String>,
    pub column_name: Option<String>,
}

/// One column pair of a foreign key relationship
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawForeignKey {
    pub name: Option<String>,
    pub primary_key_table: Option<String>,
    pub primary_key_column: Option<String>,
    pub foreign_key_table: Option<String>,
    pub foreign_key_column: Option<String>,
}

/// Trait that every metadata backend must implement.
///
/// Calls are issued one at a time and each is awaited before the next, so
/// implementations take `&mut self` and need no interior locking.
#[async_trait]
pub trait MetadataSource: Send {
    /// Human-readable description of the target, for logs
    fn describe(&self) -> String;

    /// List base tables
    async fn tables(&mut self) -> Result<Vec<RawTable>>;

    /// List the columns of a table in ordinal order
    async fn columns(&mut self, table: &str) -> Result<Vec<RawColumn>>;

    /// List primary key member rows of a table, one row per column
    async fn primary_keys(&mut self, table: &str) -> Result<Vec<RawPrimaryKey>>;

    /// List foreign keys for which `table` is the parent (primary key) side
    async fn foreign_keys(&mut self, table: &str) -> Result<Vec<RawForeignKey>>;
}
