//! # drda-protocol
//!
//! Pure implementation of the DRDA (Distributed Relational Database
//! Architecture) wire protocol spoken by DB2-family servers.
//!
//! DRDA messages are DSS (Data Stream Structure) frames carrying trees of
//! length-prefixed, code-point-tagged DDM objects. This crate provides the
//! frame header, the recursive object codec, request builders for the
//! handshake and SQL operations, and the SQLCA status decoder.
//!
//! ## Design Philosophy
//!
//! This crate is intentionally IO-agnostic. It contains no networking logic
//! and makes no assumptions about the async runtime. Higher-level crates
//! build upon this foundation to provide async I/O capabilities.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod codepoint;
pub mod dss;
pub mod error;
pub mod object;
pub mod request;
pub mod sqlca;

pub use dss::{DSS_HEADER_SIZE, DSS_MAGIC, DssFlags, DssHeader, DssKind, chain_complete};
pub use error::ProtocolError;
pub use object::{Object, Param, parse_objects};
pub use request::{PackageRef, Request};
pub use sqlca::{SQL_NO_DATA, Sqlca, security_check_reason};
