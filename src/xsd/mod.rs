//! XSD generation — scoped XML writer and dataset schema emitter

mod emitter;
pub mod writer;

pub use emitter::*;
