//! SQL Server metadata source using tiberius
//!
//! Reads tables and columns from `INFORMATION_SCHEMA` and keys from the
//! `sp_pkeys` / `sp_fkeys` catalog procedures.

use crate::db::source::{MetadataSource, RawColumn, RawForeignKey, RawPrimaryKey, RawTable};
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use tiberius::{Client, Config, Row, SqlBrowser, ToSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

const TABLES_QUERY: &str = "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES \
     WHERE TABLE_TYPE = 'BASE TABLE' \
     ORDER BY TABLE_SCHEMA, TABLE_NAME";

const COLUMNS_QUERY: &str = "SELECT COLUMN_NAME, DATA_TYPE, IS_NULLABLE, CHARACTER_MAXIMUM_LENGTH, \
     COLUMNPROPERTY(OBJECT_ID(QUOTENAME(TABLE_SCHEMA) + '.' + QUOTENAME(TABLE_NAME)), COLUMN_NAME, 'IsIdentity') AS IS_IDENTITY \
     FROM INFORMATION_SCHEMA.COLUMNS \
     WHERE TABLE_NAME = @P1 \
     ORDER BY ORDINAL_POSITION";

const PRIMARY_KEYS_QUERY: &str = "EXEC sp_pkeys @table_name = @P1";

const FOREIGN_KEYS_QUERY: &str = "EXEC sp_fkeys @pktable_name = @P1";

/// SQL Server metadata source
pub struct SqlServerSource {
    client: Client<Compat<TcpStream>>,
    database: String,
}

impl SqlServerSource {
    /// Connect using an ADO.NET style connection string,
    /// e.g. `server=tcp:localhost,1433;database=Sales;user=sa;password=...`
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let config = Config::from_ado_string(connection_string).map_err(|source| {
            Error::Connectivity {
                target: "connection string".to_string(),
                source,
            }
        })?;
        let target = config.get_addr();
        let connectivity = |source: tiberius::error::Error| Error::Connectivity {
            target: target.clone(),
            source,
        };

        // Resolves named instances through the SQL Browser, plain TCP otherwise
        let database = database_name(connection_string);
        let tcp = TcpStream::connect_named(&config).await.map_err(connectivity)?;
        tcp.set_nodelay(true).map_err(|e| connectivity(e.into()))?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(connectivity)?;

        info!(addr = %target, database = %database, "connected to SQL Server");
        Ok(Self { client, database })
    }

    /// Run a query and map every row of every result set
    async fn fetch<T: Send>(
        &mut self,
        label: &'static str,
        sql: &'static str,
        table: Option<&str>,
        map: impl Fn(&Row) -> Result<T> + Send,
    ) -> Result<Vec<T>> {
        let params: Vec<&dyn ToSql> = table.iter().map(|t| t as &dyn ToSql).collect();
        let query_error = |source: tiberius::error::Error| Error::MetadataQuery { query: label, source };

        let stream = self
            .client
            .query(sql, &params[..])
            .await
            .map_err(query_error)?;
        let mut rows = stream.into_row_stream();

        let mut out = Vec::new();
        while let Some(row) = rows.try_next().await.map_err(query_error)? {
            out.push(map(&row)?);
        }
        debug!(query = label, table = table.unwrap_or("-"), rows = out.len(), "metadata read");
        Ok(out)
    }
}

#[async_trait]
impl MetadataSource for SqlServerSource {
    fn describe(&self) -> String {
        format!("SQL Server database `{}`", self.database)
    }

    async fn tables(&mut self) -> Result<Vec<RawTable>> {
        self.fetch("INFORMATION_SCHEMA.TABLES", TABLES_QUERY, None, |row| {
            Ok(RawTable {
                name: text(row, "TABLE_NAME", "INFORMATION_SCHEMA.TABLES")?,
            })
        })
        .await
    }

    async fn columns(&mut self, table: &str) -> Result<Vec<RawColumn>> {
        self.fetch("INFORMATION_SCHEMA.COLUMNS", COLUMNS_QUERY, Some(table), |row| {
            Ok(RawColumn {
                name: text(row, "COLUMN_NAME", table)?,
                data_type: text(row, "DATA_TYPE", table)?,
                is_nullable: text(row, "IS_NULLABLE", table)?,
                max_length: int(row, "CHARACTER_MAXIMUM_LENGTH", table)?,
                is_identity: int(row, "IS_IDENTITY", table)?.map(|v| v == 1),
            })
        })
        .await
    }

    async fn primary_keys(&mut self, table: &str) -> Result<Vec<RawPrimaryKey>> {
        self.fetch("sp_pkeys", PRIMARY_KEYS_QUERY, Some(table), |row| {
            Ok(RawPrimaryKey {
                constraint_name: text(row, "PK_NAME", table)?,
                column_name: text(row, "COLUMN_NAME", table)?,
            })
        })
        .await
    }

    async fn foreign_keys(&mut self, table: &str) -> Result<Vec<RawForeignKey>> {
        self.fetch("sp_fkeys", FOREIGN_KEYS_QUERY, Some(table), |row| {
            Ok(RawForeignKey {
                name: text(row, "FK_NAME", table)?,
                primary_key_table: text(row, "PKTABLE_NAME", table)?,
                primary_key_column: text(row, "PKCOLUMN_NAME", table)?,
                foreign_key_table: text(row, "FKTABLE_NAME", table)?,
                foreign_key_column: text(row, "FKCOLUMN_NAME", table)?,
            })
        })
        .await
    }
}

// ---- row helpers ----

fn text(row: &Row, column: &str, table: &str) -> Result<Option<String>> {
    row.try_get::<&str, _>(column)
        .map(|v| v.map(str::to_string))
        .map_err(|e| Error::malformed(table, format!("{}: {}", column, e)))
}

fn int(row: &Row, column: &str, table: &str) -> Result<Option<i32>> {
    row.try_get::<i32, _>(column)
        .map_err(|e| Error::malformed(table, format!("{}: {}", column, e)))
}

/// Pull the database name out of a connection string for log output
fn database_name(connection_string: &str) -> String {
    connection_string
        .split(';')
        .filter_map(|part| part.split_once('='))
        .find(|(key, _)| {
            let key = key.trim();
            key.eq_ignore_ascii_case("database") || key.eq_ignore_ascii_case("initial catalog")
        })
        .map(|(_, value)| value.trim().to_string())
        .unwrap_or_else(|| "master".to_string())
}
