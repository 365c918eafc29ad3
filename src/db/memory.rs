//! In-memory metadata source
//!
//! Serves pre-recorded raw rows. Used for fixtures and for exercising the
//! assembler without a live server.

use crate::db::source::{MetadataSource, RawColumn, RawForeignKey, RawPrimaryKey, RawTable};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Raw rows recorded for one table
#[derive(Clone, Debug, Default)]
pub struct MemoryTable {
    pub columns: Vec<RawColumn>,
    pub primary_keys: Vec<RawPrimaryKey>,
    pub foreign_keys: Vec<RawForeignKey>,
}

/// Metadata source backed by in-memory rows
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    tables: Vec<RawTable>,
    rows: HashMap<String, MemoryTable>,
    /// Number of `foreign_keys` calls served
    pub foreign_key_reads: usize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table with its rows; listing order follows insertion order
    pub fn with_table(mut self, name: &str, table: MemoryTable) -> Self {
        self.tables.push(RawTable {
            name: Some(name.to_string()),
        });
        self.rows.insert(name.to_string(), table);
        self
    }

    /// Register a raw table row as-is, without any per-table rows
    pub fn with_raw_table(mut self, table: RawTable) -> Self {
        self.tables.push(table);
        self
    }
}

impl MemoryTable {
    pub fn column(mut self, name: &str, data_type: &str, is_nullable: &str, max_length: Option<i32>) -> Self {
        self.columns.push(RawColumn {
            name: Some(name.to_string()),
            data_type: Some(data_type.to_string()),
            is_nullable: Some(is_nullable.to_string()),
            max_length,
            is_identity: Some(false),
        });
        self
    }

    pub fn identity(mut self, name: &str, data_type: &str) -> Self {
        self.columns.push(RawColumn {
            name: Some(name.to_string()),
            data_type: Some(data_type.to_string()),
            is_nullable: Some("NO".to_string()),
            max_length: None,
            is_identity: Some(true),
        });
        self
    }

    pub fn primary_key(mut self, constraint: &str, column: &str) -> Self {
        self.primary_keys.push(RawPrimaryKey {
            constraint_name: Some(constraint.to_string()),
            column_name: Some(column.to_string()),
        });
        self
    }

    pub fn foreign_key(mut self, name: &str, parent: (&str, &str), child: (&str, &str)) -> Self {
        self.foreign_keys.push(RawForeignKey {
            name: Some(name.to_string()),
            primary_key_table: Some(parent.0.to_string()),
            primary_key_column: Some(parent.1.to_string()),
            foreign_key_table: Some(child.0.to_string()),
            foreign_key_column: Some(child.1.to_string()),
        });
        self
    }
}

#[async_trait]
impl MetadataSource for MemorySource {
    fn describe(&self) -> String {
        format!("in-memory metadata ({} tables)", self.tables.len())
    }

    async fn tables(&mut self) -> Result<Vec<RawTable>> {
        Ok(self.tables.clone())
    }

    async fn columns(&mut self, table: &str) -> Result<Vec<RawColumn>> {
        Ok(self.rows.get(table).map(|t| t.columns.clone()).unwrap_or_default())
    }

    async fn primary_keys(&mut self, table: &str) -> Result<Vec<RawPrimaryKey>> {
        Ok(self
            .rows
            .get(table)
            .map(|t| t.primary_keys.clone())
            .unwrap_or_default())
    }

    async fn foreign_keys(&mut self, table: &str) -> Result<Vec<RawForeignKey>> {
        self.foreign_key_reads += 1;
        Ok(self
            .rows
            .get(table)
            .map(|t| t.foreign_keys.clone())
            .unwrap_or_default())
    }
}
