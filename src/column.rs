use allocative::Allocative;
use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data_type::ColumnType;
use crate::operator::{self, EqualityOperator};
use std::cmp::Ordering;

/// A named, typed column of a table.
///
/// Values are kept as text whatever the declared type; numeric columns are
/// parsed on demand when compared. The serialized form is the per-column
/// entry of a table file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Allocative)]
pub struct Column {
    /// The name of the column.
    #[serde(rename = "column")]
    pub name: String,
    /// The declared type of the column.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// The stored values, one per row.
    pub values: Vec<String>,
}

impl Column {
    /// Creates a new, empty column with the specified name and type.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            values: Vec::new(),
        }
    }

    /// Appends a value to the end of the column.
    ///
    /// # Example
    /// ```
    /// # use minisql::column::Column;
    /// # use minisql::data_type::ColumnType;
    /// let mut col = Column::new("age", ColumnType::Int);
    /// col.push("30");
    /// col.push_default();
    ///
    /// assert_eq!(col.len(), 2);
    /// assert_eq!(col.get(1), Some("0"));
    /// ```
    pub fn push(&mut self, value: impl Into<String>) {
        self.values.push(value.into());
    }

    /// Appends the default value of the column type.
    pub fn push_default(&mut self) {
        self.push(self.column_type.default_value());
    }

    /// Returns the number of rows currently stored in the column.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there is no row in the column, else false.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieves the value at the specified row index, `None` if out of bounds.
    pub fn get(&self, row_idx: usize) -> Option<&str> {
        self.values.get(row_idx).map(String::as_str)
    }

    /// Replaces the value at `row_idx`.
    ///
    /// Returns `Err` if the index is out of bounds.
    pub fn set(&mut self, row_idx: usize, value: &str) -> Result<(), String> {
        let slot = self
            .values
            .get_mut(row_idx)
            .ok_or_else(|| format!("row index {row_idx} is too high"))?;
        value.clone_into(slot);
        Ok(())
    }

    /// Removes every row whose bit is set in `mask` in one pass over the
    /// values. Rows past the end of the mask are kept.
    pub fn remove_rows(&mut self, mask: &BitSlice) {
        let mut row_idx = 0;
        self.values.retain(|_| {
            let removed = mask.get(row_idx).is_some_and(|bit| *bit);
            row_idx += 1;
            !removed
        });
    }

    /// Whether the value at `row_idx` satisfies `value <op> compare_value`.
    pub fn matches(&self, row_idx: usize, op: EqualityOperator, compare_value: &str) -> bool {
        self.get(row_idx)
            .is_some_and(|value| op.matches(self.column_type, value, compare_value))
    }

    /// Orders two rows of this column by their values.
    pub fn compare_rows(&self, a: usize, b: usize) -> Ordering {
        operator::compare(
            self.column_type,
            self.get(a).unwrap_or_default(),
            self.get(b).unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────
    // Test 1 : Creation
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_column_new() {
        let col = Column::new("age", ColumnType::Int);

        assert_eq!(col.name, "age");
        assert_eq!(col.column_type, ColumnType::Int);
        assert_eq!(col.len(), 0);
        assert!(col.is_empty());
    }

    // ─────────────────────────────────────────────────────────────
    // Test 2 : Push & Get
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_push_and_get() {
        let mut col = Column::new("name", ColumnType::Varchar);

        col.push("Alice");
        col.push_default();

        assert_eq!(col.len(), 2);
        assert_eq!(col.get(0), Some("Alice"));
        assert_eq!(col.get(1), Some(""));
        assert_eq!(col.get(2), None);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 3 : Set
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_column_set() {
        let mut col = Column::new("age", ColumnType::Int);
        col.push("30");

        col.set(0, "31").unwrap();
        assert_eq!(col.get(0), Some("31"));

        assert!(col.set(10, "42").is_err());
    }

    // ─────────────────────────────────────────────────────────────
    // Test 4 : Remove with a mask
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_remove_rows() {
        let mut col = Column::new("id", ColumnType::Int);
        for i in 0..5 {
            col.push(i.to_string());
        }

        let mask = bitvec![0, 1, 1, 0, 1];
        col.remove_rows(&mask);

        assert_eq!(col.values, vec!["0", "3"]);
    }

    #[test]
    fn test_remove_scattered_rows_keeps_order() {
        let mut col = Column::new("id", ColumnType::Int);
        for i in 0..1000 {
            col.push(i.to_string());
        }

        let mut mask = bitvec![0; 1000];
        for i in (0..1000).step_by(3) {
            mask.set(i, true);
        }
        col.remove_rows(&mask);

        assert_eq!(col.len(), 666);
        assert_eq!(col.get(0), Some("1"));
        assert_eq!(col.get(1), Some("2"));
        assert_eq!(col.get(2), Some("4"));
        assert_eq!(col.get(665), Some("998"));
    }

    #[test]
    fn test_remove_rows_short_mask_keeps_tail() {
        let mut col = Column::new("id", ColumnType::Int);
        for i in 0..4 {
            col.push(i.to_string());
        }

        col.remove_rows(&bitvec![1, 0]);
        assert_eq!(col.values, vec!["1", "2", "3"]);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 5 : Typed comparison
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_matches_and_compare_rows() {
        let mut col = Column::new("n", ColumnType::Int);
        col.push("10");
        col.push("9");

        assert!(col.matches(0, EqualityOperator::GREATER, "9"));
        assert!(!col.matches(5, EqualityOperator::EQUAL, "0"));
        assert_eq!(col.compare_rows(0, 1), Ordering::Greater);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 6 : File representation
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_serde_field_names() {
        let mut col = Column::new("age", ColumnType::Int);
        col.push("1");

        let json = serde_json::to_value(&col).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"column": "age", "type": "INT", "values": ["1"]})
        );
    }
}
