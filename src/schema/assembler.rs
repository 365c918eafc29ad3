//! Schema model assembly
//!
//! Folds raw metadata rows into a [`Schema`]. Primary key rows arrive one per
//! member column and are coalesced by constraint name.

use crate::db::MetadataSource;
use crate::db::RawColumn;
use crate::error::{Error, Result};
use crate::schema::model::{Column, ForeignKey, PrimaryKey, Schema, Table};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Options controlling how much metadata is read and how it is checked
#[derive(Clone, Copy, Debug)]
pub struct ReadOptions {
    /// Read foreign keys as relationships
    pub include_relationships: bool,
    /// Reject keys that reference unknown tables or columns
    pub strict_references: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            include_relationships: false,
            strict_references: true,
        }
    }
}

/// Incrementally built schema.
///
/// Consumed by [`SchemaBuilder::finish`], after which the model is never
/// touched again.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    tables: Vec<Table>,
    table_index: HashMap<String, usize>,
    primary_keys: Vec<PrimaryKey>,
    key_index: HashMap<String, usize>,
    foreign_keys: Vec<ForeignKey>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a table with no columns
    pub fn add_table(&mut self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::malformed(name, "empty table name"));
        }
        if self.table_index.contains_key(name) {
            return Err(Error::DuplicateTable(name.to_string()));
        }
        self.table_index.insert(name.to_string(), self.tables.len());
        self.tables.push(Table::new(name));
        Ok(())
    }

    /// Replace the columns of a table with the given rows, in order
    pub fn set_columns(&mut self, table: &str, rows: Vec<RawColumn>) -> Result<()> {
        let columns = rows
            .into_iter()
            .map(|row| column_from_row(table, row))
            .collect::<Result<Vec<_>>>()?;

        for column in columns.iter().filter(|c| c.sql_type().is_none()) {
            warn!(table, %column, "unmapped SQL type, falling back to xs:string");
        }

        let index = self.table_position(table)?;
        self.tables[index].columns = columns;
        Ok(())
    }

    /// Record one member column of a primary key constraint.
    ///
    /// Rows sharing a constraint name are merged into a single key; a column
    /// already present is ignored.
    pub fn add_primary_key_row(&mut self, table: &str, constraint: &str, column: &str) -> Result<()> {
        self.table_position(table)?;

        match self.key_index.get(constraint) {
            Some(&index) => {
                let key = &mut self.primary_keys[index];
                if key.table != table {
                    return Err(Error::malformed(
                        table,
                        format!("primary key {} is already owned by {}", constraint, key.table),
                    ));
                }
                if !key.columns.iter().any(|c| c == column) {
                    key.columns.push(column.to_string());
                }
            }
            None => {
                self.key_index
                    .insert(constraint.to_string(), self.primary_keys.len());
                self.primary_keys.push(PrimaryKey {
                    name: constraint.to_string(),
                    table: table.to_string(),
                    columns: vec![column.to_string()],
                });
            }
        }
        Ok(())
    }

    /// Record one foreign key edge
    pub fn add_foreign_key_row(&mut self, foreign_key: ForeignKey) {
        self.foreign_keys.push(foreign_key);
    }

    /// Freeze the model.
    ///
    /// With `strict_references` every key must point at existing tables and
    /// columns; otherwise violations are logged and kept.
    pub fn finish(self, strict_references: bool) -> Result<Schema> {
        let schema = Schema {
            tables: self.tables,
            primary_keys: self.primary_keys,
            foreign_keys: self.foreign_keys,
        };

        for violation in dangling_references(&schema) {
            if strict_references {
                return Err(violation);
            }
            warn!(%violation, "keeping dangling key reference");
        }
        Ok(schema)
    }

    fn table_position(&self, table: &str) -> Result<usize> {
        self.table_index
            .get(table)
            .copied()
            .ok_or_else(|| Error::malformed(table, "table was not listed"))
    }
}

/// Read the whole schema from a metadata source.
///
/// Reads are issued one after another: the table list, then per table its
/// columns, primary key rows and (optionally) foreign key rows.
pub async fn read_schema<S>(source: &mut S, options: ReadOptions) -> Result<Schema>
where
    S: MetadataSource + ?Sized,
{
    info!(source = %source.describe(), "reading schema");

    let names = source
        .tables()
        .await?
        .into_iter()
        .map(|row| required("INFORMATION_SCHEMA.TABLES", "table name", row.name))
        .collect::<Result<Vec<_>>>()?;

    let mut builder = SchemaBuilder::new();
    for name in &names {
        builder.add_table(name)?;
    }

    for name in &names {
        let columns = source.columns(name).await?;
        debug!(table = %name, columns = columns.len(), "columns read");
        builder.set_columns(name, columns)?;

        for row in source.primary_keys(name).await? {
            let constraint = required(name, "primary key name", row.constraint_name)?;
            let column = required(name, "primary key column", row.column_name)?;
            builder.add_primary_key_row(name, &constraint, &column)?;
        }

        if options.include_relationships {
            for row in source.foreign_keys(name).await? {
                builder.add_foreign_key_row(ForeignKey {
                    name: required(name, "foreign key name", row.name)?,
                    primary_key_table: required(name, "parent table", row.primary_key_table)?,
                    primary_key_column: required(name, "parent column", row.primary_key_column)?,
                    foreign_key_table: required(name, "child table", row.foreign_key_table)?,
                    foreign_key_column: required(name, "child column", row.foreign_key_column)?,
                });
            }
        }
    }

    let schema = builder.finish(options.strict_references)?;
    for key in &schema.primary_keys {
        debug!(%key, "primary key");
    }
    info!(
        tables = schema.tables.len(),
        primary_keys = schema.primary_keys.len(),
        foreign_keys = schema.foreign_keys.len(),
        "schema assembled"
    );
    Ok(schema)
}

// ---- row normalization ----

fn required(table: &str, field: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::malformed(table, format!("missing {}", field))),
    }
}

fn column_from_row(table: &str, row: RawColumn) -> Result<Column> {
    let name = required(table, "column name", row.name)?;
    let data_type = required(table, &format!("data type of {}", name), row.data_type)?;
    let nullable = required(table, &format!("nullability of {}", name), row.is_nullable)? != "NO";

    let max_length = match row.max_length {
        None | Some(-1) => None,
        Some(len) if len > 0 => Some(len as u32),
        Some(len) => {
            return Err(Error::malformed(
                table,
                format!("invalid max length {} for {}", len, name),
            ))
        }
    };

    Ok(Column {
        name,
        data_type,
        nullable,
        max_length,
        is_identity: row.is_identity.unwrap_or(false),
    })
}

fn dangling_references(schema: &Schema) -> Vec<Error> {
    let mut violations = Vec::new();
    let mut check = |constraint: &str, table: &str, column: &str| match schema.table(table) {
        None => violations.push(Error::DanglingReference {
            constraint: constraint.to_string(),
            target: format!("table {}", table),
        }),
        Some(t) if t.column(column).is_none() => violations.push(Error::DanglingReference {
            constraint: constraint.to_string(),
            target: format!("column {}.{}", table, column),
        }),
        Some(_) => {}
    };

    for key in &schema.primary_keys {
        for column in &key.columns {
            check(&key.name, &key.table, column);
        }
    }
    for key in &schema.foreign_keys {
        check(&key.name, &key.primary_key_table, &key.primary_key_column);
        check(&key.name, &key.foreign_key_table, &key.foreign_key_column);
    }
    violations
}
