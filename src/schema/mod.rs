//! Schema model, type mapping and assembly from raw metadata

mod assembler;
mod model;
pub mod types;

pub use assembler::*;
pub use model::*;
pub use types::{convert_data_type, SqlType, XsdType};
