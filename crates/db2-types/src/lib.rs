//! # db2-types
//!
//! FDOCA wire data types, the tagged [`SqlValue`] variant, column
//! descriptors, row-area decoding (including packed-decimal arithmetic),
//! and typed parameter encoding for the DB2 driver.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod decode;
pub mod encode;
pub mod error;
pub mod fdoca;
pub mod value;

pub use decode::{ColumnDescriptor, RowDecoder, decode_descriptors};
pub use encode::encode_params;
pub use error::TypeError;
pub use fdoca::FdocaType;
pub use value::SqlValue;
