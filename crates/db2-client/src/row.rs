//! Row and column representation for query results.

use std::sync::Arc;

use db2_types::decode::ColumnDescriptor;
use db2_types::SqlValue;

/// Column metadata describing a result set column.
#[derive(Debug, Clone)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column index (0-based).
    pub index: usize,
    /// SQL type name (e.g. `INTEGER`, `VARCHAR`).
    pub type_name: &'static str,
    /// Whether the column allows NULL values.
    pub nullable: bool,
    /// Precision for numeric types.
    pub precision: u8,
    /// Scale for numeric types.
    pub scale: u8,
}

impl Column {
    pub(crate) fn from_descriptor(descriptor: &ColumnDescriptor, index: usize) -> Self {
        Self {
            name: descriptor.name.clone(),
            index,
            type_name: descriptor.fdoca.type_name(),
            nullable: descriptor.nullable,
            precision: descriptor.precision,
            scale: descriptor.scale,
        }
    }
}

/// One decoded result row.
///
/// Columns are shared across every row of a result set.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<[Column]>,
    values: Vec<SqlValue>,
}

impl Row {
    pub(crate) fn new(columns: Arc<[Column]>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Number of columns in this row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column metadata for this row.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Value at a 0-based column index.
    #[must_use]
    pub fn get_value(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Value of the named column (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        let index = self
            .columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))?;
        self.values.get(index)
    }

    /// All values in column order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use db2_types::FdocaType;

    fn row() -> Row {
        let columns: Arc<[Column]> = Arc::from(vec![
            Column {
                name: "ID".to_owned(),
                index: 0,
                type_name: "INTEGER",
                nullable: false,
                precision: 0,
                scale: 0,
            },
            Column {
                name: "NAME".to_owned(),
                index: 1,
                type_name: "VARCHAR",
                nullable: true,
                precision: 0,
                scale: 0,
            },
        ]);
        Row::new(
            columns,
            vec![SqlValue::Int(7), SqlValue::String("alice".to_owned())],
        )
    }

    #[test]
    fn test_get_by_index_and_name() {
        let row = row();
        assert_eq!(row.get_value(0).unwrap().as_i32(), Some(7));
        assert_eq!(row.get("name").unwrap().as_str(), Some("alice"));
        assert!(row.get("MISSING").is_none());
        assert!(row.get_value(2).is_none());
    }

    #[test]
    fn test_column_from_descriptor() {
        let descriptor = ColumnDescriptor {
            name: "PRICE".to_owned(),
            fdoca: FdocaType::Decimal,
            nullable: true,
            length: 5,
            precision: 9,
            scale: 2,
        };
        let column = Column::from_descriptor(&descriptor, 3);
        assert_eq!(column.name, "PRICE");
        assert_eq!(column.index, 3);
        assert_eq!(column.type_name, "DECIMAL");
        assert!(column.nullable);
        assert_eq!(column.scale, 2);
    }
}
