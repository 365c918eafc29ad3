//! Normalized schema model handed from the assembler to the emitter

use crate::schema::types::{convert_data_type, SqlType, XsdType};

/// Whole database schema
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schema {
    pub tables: Vec<Table>,
    pub primary_keys: Vec<PrimaryKey>,
    /// Empty unless relationships were requested
    pub foreign_keys: Vec<ForeignKey>,
}

impl Schema {
    /// Find a table by name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Base table with its columns in source order
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Column definition
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    /// SQL Server type name, e.g. `nvarchar`
    pub data_type: String,
    pub nullable: bool,
    /// Length restriction; `None` for unbounded or non-character types
    pub max_length: Option<u32>,
    pub is_identity: bool,
}

impl Column {
    /// Known SQL Server type, if the name is part of the mapping table
    pub fn sql_type(&self) -> Option<SqlType> {
        SqlType::from_name(&self.data_type)
    }

    /// XSD primitive for this column's values
    pub fn xsd_type(&self) -> XsdType {
        convert_data_type(&self.data_type)
    }

    pub fn is_guid(&self) -> bool {
        self.sql_type() == Some(SqlType::UniqueIdentifier)
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}, {}", self.name, self.data_type, self.nullable)?;
        if let Some(len) = self.max_length {
            write!(f, ", {}", len)?;
        }
        Ok(())
    }
}

/// Primary key constraint, possibly spanning several columns
#[derive(Clone, Debug, PartialEq)]
pub struct PrimaryKey {
    pub name: String,
    /// Owning table
    pub table: String,
    /// Member columns in key order, without duplicates
    pub columns: Vec<String>,
}

impl std::fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}, [{}]", self.name, self.table, self.columns.join(","))
    }
}

/// Single-column relationship edge between a parent and a child table
#[derive(Clone, Debug, PartialEq)]
pub struct ForeignKey {
    pub name: String,
    pub primary_key_table: String,
    pub primary_key_column: String,
    pub foreign_key_table: String,
    pub foreign_key_column: String,
}
