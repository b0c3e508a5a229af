//! # db2-client
//!
//! High-level async DB2 client speaking the DRDA wire protocol directly.
//!
//! This is the primary public API surface for the rust-db2-driver project.
//! A [`Client`] holds one authenticated connection and runs one statement
//! at a time; each invocation is connect, operate, disconnect.
//!
//! ## Example
//!
//! ```rust,ignore
//! use db2_client::{Client, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::new()
//!         .host("localhost")
//!         .database("SAMPLE")
//!         .credentials("db2inst1", "secret");
//!
//!     let mut client = Client::connect(config).await?;
//!
//!     let result = client.query("SELECT ID, NAME FROM USERS").await?;
//!     for row in &result.rows {
//!         println!("{:?} {:?}", row.get("ID"), row.get("NAME"));
//!     }
//!
//!     let affected = client.execute("DELETE FROM SESSIONS").await?;
//!     println!("deleted {affected} rows");
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod handshake;
pub mod query;
pub mod row;

// Re-export commonly used types
pub use client::Client;
pub use config::Config;
pub use error::{Error, Result};
pub use handshake::Session;
pub use query::{CallResult, PreparedStatement, QueryResult};
pub use row::{Column, Row};

// Value types surface directly in results and parameters.
pub use db2_types::SqlValue;
