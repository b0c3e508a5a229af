//! Query and stored-procedure result types.

use std::sync::Arc;

use db2_types::decode::ColumnDescriptor;

use crate::row::{Column, Row};

/// The outcome of one query: columns, decoded rows, and whether the row
/// cap cut the fetch short.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Column metadata in result order.
    pub columns: Arc<[Column]>,
    /// Decoded rows.
    pub rows: Vec<Row>,
    /// True when the configured row cap stopped the fetch before the
    /// cursor was exhausted. Not an error.
    pub truncated: bool,
}

impl QueryResult {
    /// Number of rows fetched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows were fetched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The outcome of a stored-procedure invocation.
#[derive(Debug, Clone)]
pub struct CallResult {
    /// Result sets in the order the procedure opened them.
    pub result_sets: Vec<QueryResult>,
    /// Rows affected by the procedure's own statements, when reported.
    pub rows_affected: Option<u32>,
}

/// A prepared statement: descriptors returned by the server plus the
/// section number the statement was prepared under.
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    pub(crate) section: u16,
    /// Result column descriptors, empty for non-query statements.
    pub columns: Vec<ColumnDescriptor>,
    /// Parameter marker descriptors, empty when the statement has none.
    pub parameters: Vec<ColumnDescriptor>,
}

impl PreparedStatement {
    /// The section number this statement occupies within the package.
    #[must_use]
    pub fn section(&self) -> u16 {
        self.section
    }
}
