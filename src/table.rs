use std::cmp::Ordering;

use allocative::Allocative;
use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ast::{ColumnDef, Filter, RowValue, SortDirection, Sorter};
use crate::column::Column;
use crate::error::{Error, Result};
use crate::operator::EqualityOperator;

/// A column-oriented table: every column holds its own value sequence and a
/// row is the set of values sharing one index.
///
/// All columns always have the same length. Structural changes (insert and
/// delete) are validated first and then applied to every column through
/// [Table::commit], so a failure never leaves columns of different lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Allocative)]
pub struct Table {
    #[serde(rename = "table")]
    pub name: String,
    pub columns: Vec<Column>,
}

/// Result of a select: the projected column names and the matching rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableData {
    pub columns: Vec<String>,
    #[serde(rename = "data")]
    pub rows: Vec<Vec<String>>,
}

/// A filter resolved against the columns of a table.
struct BoundFilter<'a> {
    column: &'a Column,
    operator: EqualityOperator,
    value: &'a str,
}

impl Table {
    pub fn new(name: impl Into<String>, defs: &[ColumnDef]) -> Self {
        let columns = defs
            .iter()
            .map(|def| Column::new(def.name.clone(), def.column_type))
            .collect();
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|col| col.name == name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|col| col.name == name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Applies `f` to every column. Callers validate before committing.
    fn commit<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Column),
    {
        for column in &mut self.columns {
            f(column);
        }
        debug_assert!(self.validate().is_ok(), "columns of {} diverged", self.name);
    }

    /// Checks that every column has the same number of values.
    pub fn validate(&self) -> Result<()> {
        let expected = self.row_count();
        match self.columns.iter().find(|col| col.len() != expected) {
            Some(col) => Err(Error::Corrupted(format!(
                "column {} of table {} has {} values, expected {}",
                col.name,
                self.name,
                col.len(),
                expected
            ))),
            None => Ok(()),
        }
    }

    /// Bytes owned by the table, including every stored value.
    pub fn memory_footprint(&self) -> usize {
        allocative::size_of_unique(self)
    }

    /// Appends one row. Columns missing from `row` get their type's default.
    ///
    /// # Errors
    /// Returns [Error::ColumnNotFound] if `row` names an unknown column; in
    /// that case nothing is appended.
    pub fn insert(&mut self, row: &[RowValue]) -> Result<()> {
        self.check_columns(row)?;
        self.commit(|column| match row.iter().find(|v| v.column == column.name) {
            Some(provided) => column.push(provided.value.as_str()),
            None => column.push_default(),
        });
        Ok(())
    }

    /// Returns the projected, filtered and sorted content of the table.
    ///
    /// - `columns`: a single `*` selects every column; unknown names are
    ///   silently dropped.
    /// - `filters`: a row is kept only if it satisfies all of them.
    /// - `sorters`: applied in order, each breaking the ties of the previous
    ///   one. The sort is stable, so rows left equal keep their table order.
    ///
    /// # Errors
    /// Returns [Error::ColumnNotFound] if a filter or sorter names a column
    /// that does not exist.
    pub fn get(
        &self,
        columns: &[String],
        filters: &[Filter],
        sorters: &[Sorter],
    ) -> Result<TableData> {
        let projection = self.projection(columns);
        let mask = self.matching_rows(filters)?;

        let keys = sorters
            .iter()
            .map(|sorter| {
                let idx = self.column_index(&sorter.column)?;
                Ok((&self.columns[idx], sorter.direction))
            })
            .collect::<Result<Vec<(&Column, SortDirection)>>>()?;

        let mut row_ids: Vec<usize> = mask.iter_ones().collect();
        if !keys.is_empty() {
            row_ids.sort_by(|a, b| {
                for (column, direction) in &keys {
                    let mut ord = column.compare_rows(*a, *b);
                    if *direction == SortDirection::Descending {
                        ord = ord.reverse();
                    }
                    // if it's not equal no need to compare more
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        let rows = row_ids
            .into_iter()
            .map(|row| {
                projection
                    .iter()
                    .map(|col| col.get(row).unwrap_or_default().to_string())
                    .collect()
            })
            .collect();

        Ok(TableData {
            columns: projection.iter().map(|col| col.name.clone()).collect(),
            rows,
        })
    }

    /// Overwrites the columns named in `row` on every row matching `filters`.
    /// Returns the number of updated rows.
    pub fn update(&mut self, row: &[RowValue], filters: &[Filter]) -> Result<usize> {
        self.check_columns(row)?;
        let mask = self.matching_rows(filters)?;

        for assignment in row {
            let idx = self.column_index(&assignment.column)?;
            let column = &mut self.columns[idx];
            for row_idx in mask.iter_ones() {
                column
                    .set(row_idx, &assignment.value)
                    .map_err(Error::Corrupted)?;
            }
        }
        Ok(mask.count_ones())
    }

    /// Removes every row matching `filters` and returns how many were removed.
    pub fn delete(&mut self, filters: &[Filter]) -> Result<usize> {
        let mask = self.matching_rows(filters)?;
        self.commit(|column| column.remove_rows(&mask));
        Ok(mask.count_ones())
    }

    /// Builds a mask with one bit per row, set when the row satisfies every
    /// filter.
    pub fn matching_rows(&self, filters: &[Filter]) -> Result<BitVec> {
        let bound = filters
            .iter()
            .map(|filter| self.bind(filter))
            .collect::<Result<Vec<_>>>()?;

        Ok((0..self.row_count())
            .map(|row| {
                bound
                    .iter()
                    .all(|f| f.column.matches(row, f.operator, f.value))
            })
            .collect())
    }

    /// Resolves the column a filter applies to.
    ///
    /// An ambiguous filter whose subject is not a column but whose compare
    /// value is gets turned around. A filter with a known subject never is,
    /// so a literal that happens to match a column name stays a literal.
    fn bind<'a>(&'a self, filter: &'a Filter) -> Result<BoundFilter<'a>> {
        if let Ok(column) = self.column(&filter.column) {
            return Ok(BoundFilter {
                column,
                operator: filter.operator,
                value: &filter.value,
            });
        }
        if !filter.subject_known {
            if let Ok(column) = self.column(&filter.value) {
                return Ok(BoundFilter {
                    column,
                    operator: filter.operator.inverse(),
                    value: &filter.column,
                });
            }
        }
        Err(Error::ColumnNotFound(filter.column.clone()))
    }

    fn projection(&self, names: &[String]) -> Vec<&Column> {
        if names.len() == 1 && names[0] == "*" {
            return self.columns.iter().collect();
        }
        names
            .iter()
            .filter_map(|name| self.column(name).ok())
            .collect()
    }

    fn check_columns(&self, row: &[RowValue]) -> Result<()> {
        for value in row {
            self.column(&value.column)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::ColumnType;

    fn defs() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("a", ColumnType::Int),
            ColumnDef::new("b", ColumnType::Varchar),
        ]
    }

    fn int_table(values: &[&str]) -> Table {
        let mut table = Table::new("t", &[ColumnDef::new("x", ColumnType::Int)]);
        for v in values {
            table.insert(&[RowValue::new("x", *v)]).unwrap();
        }
        table
    }

    fn filter(column: &str, operator: EqualityOperator, value: &str) -> Filter {
        Filter::new(column, operator, value)
    }

    fn all(table: &Table) -> Vec<Vec<String>> {
        table.get(&["*".to_string()], &[], &[]).unwrap().rows
    }

    #[test]
    fn test_table_creation() {
        let table = Table::new("users", &defs());
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_insert_uses_default_for_missing_columns() {
        let mut table = Table::new("t", &defs());
        table.insert(&[RowValue::new("a", "5")]).unwrap();
        table.insert(&[RowValue::new("b", "x")]).unwrap();

        assert_eq!(all(&table), vec![vec!["5", ""], vec!["0", "x"]]);
    }

    #[test]
    fn test_insert_unknown_column_appends_nothing() {
        let mut table = Table::new("t", &defs());
        let err = table
            .insert(&[RowValue::new("a", "1"), RowValue::new("zzz", "2")])
            .unwrap_err();

        assert!(matches!(err, Error::ColumnNotFound(name) if name == "zzz"));
        assert_eq!(table.row_count(), 0);
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_get_projection() {
        let mut table = Table::new("t", &defs());
        table
            .insert(&[RowValue::new("a", "1"), RowValue::new("b", "one")])
            .unwrap();

        let data = table
            .get(&["b".into(), "missing".into(), "a".into()], &[], &[])
            .unwrap();
        assert_eq!(data.columns, vec!["b", "a"]);
        assert_eq!(data.rows, vec![vec!["one", "1"]]);
    }

    #[test]
    fn test_two_sided_range() {
        let table = int_table(&["-1", "0", "1", "5", "10", "11"]);
        let filters = [
            filter("x", EqualityOperator::GREATER, "0"),
            filter("x", EqualityOperator::LESS, "10"),
        ];

        let data = table.get(&["x".into()], &filters, &[]).unwrap();
        assert_eq!(data.rows, vec![vec!["1"], vec!["5"]]);
    }

    #[test]
    fn test_filter_is_flipped_when_subject_is_a_value() {
        let table = int_table(&["1", "7", "9"]);
        // `x > 5` parses with the literal as the subject
        let flipped = [Filter::ambiguous("5", EqualityOperator::LESS, "x")];

        let data = table.get(&["x".into()], &flipped, &[]).unwrap();
        assert_eq!(data.rows, vec![vec!["7"], vec!["9"]]);

        // a known subject is never swapped with its value
        let known = [filter("5", EqualityOperator::LESS, "x")];
        assert!(matches!(
            table.get(&["x".into()], &known, &[]),
            Err(Error::ColumnNotFound(name)) if name == "5"
        ));
    }

    #[test]
    fn test_literal_named_like_a_column_stays_a_literal() {
        let mut table = Table::new(
            "t",
            &[
                ColumnDef::new("name", ColumnType::Varchar),
                ColumnDef::new("nick", ColumnType::Varchar),
            ],
        );
        for (name, nick) in [("nick", "a"), ("b", "name")] {
            table
                .insert(&[RowValue::new("name", name), RowValue::new("nick", nick)])
                .unwrap();
        }

        let data = table
            .get(
                &["name".into()],
                &[filter("name", EqualityOperator::EQUAL, "nick")],
                &[],
            )
            .unwrap();
        assert_eq!(data.rows, vec![vec!["nick"]]);
    }

    #[test]
    fn test_filter_on_unknown_column() {
        let table = int_table(&["1"]);
        let err = table
            .get(&["x".into()], &[filter("y", EqualityOperator::EQUAL, "1")], &[])
            .unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound(_)));
    }

    #[test]
    fn test_sort_ascending_descending_and_stable() {
        for column_type in [ColumnType::Int, ColumnType::Varchar] {
            let mut table = Table::new(
                "t",
                &[
                    ColumnDef::new("x", column_type),
                    ColumnDef::new("id", ColumnType::Int),
                ],
            );
            for (x, id) in [("3", "0"), ("1", "1"), ("2", "2"), ("1", "3")] {
                table
                    .insert(&[RowValue::new("x", x), RowValue::new("id", id)])
                    .unwrap();
            }

            let asc = table
                .get(&["id".into()], &[], &[Sorter::new("x", SortDirection::Ascending)])
                .unwrap();
            assert_eq!(asc.rows, vec![vec!["1"], vec!["3"], vec!["2"], vec!["0"]]);

            let desc = table
                .get(&["id".into()], &[], &[Sorter::new("x", SortDirection::Descending)])
                .unwrap();
            assert_eq!(desc.rows, vec![vec!["0"], vec!["2"], vec!["1"], vec!["3"]]);
        }
    }

    #[test]
    fn test_sort_multiple_keys() {
        let mut table = Table::new("t", &defs());
        for (a, b) in [("1", "b"), ("2", "a"), ("1", "a")] {
            table
                .insert(&[RowValue::new("a", a), RowValue::new("b", b)])
                .unwrap();
        }

        let data = table
            .get(
                &["*".into()],
                &[],
                &[
                    Sorter::new("a", SortDirection::Descending),
                    Sorter::new("b", SortDirection::Ascending),
                ],
            )
            .unwrap();
        assert_eq!(data.rows, vec![vec!["2", "a"], vec!["1", "a"], vec!["1", "b"]]);
    }

    #[test]
    fn test_sort_unknown_column() {
        let table = int_table(&["1"]);
        assert!(
            table
                .get(&["x".into()], &[], &[Sorter::new("nope", SortDirection::Ascending)])
                .is_err()
        );
    }

    #[test]
    fn test_update_only_touches_named_columns_of_matching_rows() {
        let mut table = Table::new("t", &defs());
        for (a, b) in [("1", "x"), ("2", "y"), ("3", "z")] {
            table
                .insert(&[RowValue::new("a", a), RowValue::new("b", b)])
                .unwrap();
        }

        let updated = table
            .update(
                &[RowValue::new("b", "new")],
                &[filter("a", EqualityOperator::GREATER_OR_EQUAL, "2")],
            )
            .unwrap();

        assert_eq!(updated, 2);
        assert_eq!(
            all(&table),
            vec![vec!["1", "x"], vec!["2", "new"], vec!["3", "new"]]
        );
    }

    #[test]
    fn test_update_unknown_column() {
        let mut table = Table::new("t", &defs());
        table.insert(&[RowValue::new("a", "1")]).unwrap();
        assert!(table.update(&[RowValue::new("c", "1")], &[]).is_err());
        assert_eq!(all(&table), vec![vec!["1", ""]]);
    }

    #[test]
    fn test_delete_keeps_complement() {
        let mut table = int_table(&["4", "1", "8", "3", "9"]);
        let filters = [filter("x", EqualityOperator::GREATER, "3")];

        let before = table.row_count();
        let removed = table.delete(&filters).unwrap();

        assert_eq!(removed, 3);
        assert_eq!(table.row_count(), before - removed);
        assert_eq!(all(&table), vec![vec!["1"], vec!["3"]]);
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_delete_without_filters_empties_table() {
        let mut table = int_table(&["1", "2", "3"]);
        assert_eq!(table.delete(&[]).unwrap(), 3);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_validate_detects_mismatched_columns() {
        let mut table = Table::new("t", &defs());
        table.columns[0].push("1");

        assert!(matches!(table.validate(), Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_memory_footprint_grows_with_rows() {
        let mut table = int_table(&[]);
        let empty = table.memory_footprint();
        table
            .insert(&[RowValue::new("x", "a fairly long value to store")])
            .unwrap();

        assert!(table.memory_footprint() > empty);
    }
}
