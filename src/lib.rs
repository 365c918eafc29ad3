//! SQL Server to XSD - Library
//! Reads database metadata and writes an equivalent typed dataset schema

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod schema;
pub mod xsd;

pub use error::{Error, Result};
