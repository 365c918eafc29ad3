//! Database module — metadata source abstraction + SQL Server and in-memory backends

mod memory;
mod source;
pub mod sqlserver;

pub use memory::*;
pub use source::*;
pub use sqlserver::SqlServerSource;
