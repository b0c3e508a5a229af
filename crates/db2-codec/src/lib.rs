//! # db2-codec
//!
//! Async DSS frame framing and the request/reply connection driver for the
//! DB2 driver. Built on tokio-util's codec machinery: [`DssCodec`] turns a
//! byte stream into whole frames, [`ChainAssembler`] groups chained frames
//! into one logical reply, and [`Connection`] enforces the protocol's
//! strictly half-duplex request/reply discipline with per-read deadlines.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod chain;
pub mod codec;
pub mod connection;
pub mod error;

pub use chain::{ChainAssembler, Reply};
pub use codec::{DssCodec, Frame, MAX_FRAME_SIZE};
pub use connection::Connection;
pub use error::CodecError;
