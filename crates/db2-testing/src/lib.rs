//! Testing utilities for the DB2 client workspace.
//!
//! Provides wire-format fixtures (column descriptors, row blocks, packed
//! decimals) and a scriptable in-process mock server that speaks enough of
//! the protocol to exercise the client end to end.
//!
//! This crate is for testing only and is never published.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod fixtures;
pub mod mock_server;

pub use mock_server::{
    MockCall, MockDrdaServer, MockResponse, MockResultSet, MockServerBuilder, MockServerError,
};
