use std::str::FromStr;

use tracing::debug;

use crate::data_type::ColumnType;
use crate::database::Database;
use crate::error::{Error, Result};
use crate::operator::EqualityOperator;

/// Column definition of a `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// A value given for one column by an `INSERT` or an `UPDATE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowValue {
    pub column: String,
    pub value: String,
}

impl RowValue {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// A single comparison `column <operator> value` applied row by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub operator: EqualityOperator,
    pub value: String,
    /// `false` when both operands were bare words, so either of them may be
    /// the column. The table then decides which side to filter on.
    pub subject_known: bool,
}

impl Filter {
    pub fn new(
        column: impl Into<String>,
        operator: EqualityOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
            subject_known: true,
        }
    }

    /// A filter whose operands may be swapped (`x = 5` versus `5 = x`).
    pub fn ambiguous(
        column: impl Into<String>,
        operator: EqualityOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            subject_known: false,
            ..Self::new(column, operator, value)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Ascending),
            "DESC" => Ok(Self::Descending),
            _ => Err(Error::Syntax(format!("invalid sort direction {s}"))),
        }
    }
}

/// One key of an `ORDER BY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sorter {
    pub column: String,
    pub direction: SortDirection,
}

impl Sorter {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertInto {
    pub table: String,
    pub values: Vec<RowValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    /// Requested column names; `["*"]` selects all of them.
    pub columns: Vec<String>,
    pub table: String,
    pub filters: Vec<Filter>,
    pub sorters: Vec<Sorter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: String,
    pub values: Vec<RowValue>,
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: String,
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTable {
    pub name: String,
}

/// A parsed, executable command.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    CreateTable(CreateTable),
    InsertInto(InsertInto),
    Select(Select),
    Update(Update),
    Delete(Delete),
    DropTable(DropTable),
}

impl Operation {
    /// Applies the operation to `database`.
    ///
    /// Only a select produces result bytes: its [TableData](crate::table::TableData)
    /// serialized as JSON. Every other operation returns `None` on success.
    ///
    /// # Errors
    /// Lookup failures of the target table or of a column are returned
    /// unchanged.
    pub fn execute(self, database: &mut Database) -> Result<Option<Vec<u8>>> {
        match self {
            Self::CreateTable(create) => create.execute(database).map(|_| None),
            Self::InsertInto(insert) => insert.execute(database).map(|_| None),
            Self::Select(select) => select.execute(database).map(Some),
            Self::Update(update) => update.execute(database).map(|_| None),
            Self::Delete(delete) => delete.execute(database).map(|_| None),
            Self::DropTable(drop) => drop.execute(database).map(|_| None),
        }
    }
}

impl CreateTable {
    fn execute(self, database: &mut Database) -> Result<()> {
        database.create_table(&self.name, &self.columns)
    }
}

impl InsertInto {
    fn execute(self, database: &mut Database) -> Result<()> {
        database.get_table_mut(&self.table)?.insert(&self.values)
    }
}

impl Select {
    fn execute(self, database: &Database) -> Result<Vec<u8>> {
        let table = database.get_table(&self.table)?;
        let data = table.get(&self.columns, &self.filters, &self.sorters)?;
        debug!(table = %self.table, rows = data.rows.len(), "select");
        Ok(serde_json::to_vec(&data)?)
    }
}

impl Update {
    fn execute(self, database: &mut Database) -> Result<()> {
        let updated = database
            .get_table_mut(&self.table)?
            .update(&self.values, &self.filters)?;
        debug!(table = %self.table, rows = updated, "update");
        Ok(())
    }
}

impl Delete {
    fn execute(self, database: &mut Database) -> Result<()> {
        let removed = database.get_table_mut(&self.table)?.delete(&self.filters)?;
        debug!(table = %self.table, rows = removed, "delete");
        Ok(())
    }
}

impl DropTable {
    fn execute(self, database: &mut Database) -> Result<()> {
        database.drop_table(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableData;

    fn users() -> Database {
        let mut db = Database::new("");
        Operation::CreateTable(CreateTable {
            name: "users".into(),
            columns: vec![
                ColumnDef::new("id", ColumnType::Int),
                ColumnDef::new("name", ColumnType::Varchar),
            ],
        })
        .execute(&mut db)
        .unwrap();
        db
    }

    #[test]
    fn test_sort_direction_from_str() {
        assert_eq!("asc".parse::<SortDirection>().unwrap(), SortDirection::Ascending);
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Descending);
        assert!("UP".parse::<SortDirection>().is_err());
    }

    #[test]
    fn test_only_select_returns_bytes() {
        let mut db = users();

        let insert = Operation::InsertInto(InsertInto {
            table: "users".into(),
            values: vec![RowValue::new("id", "1"), RowValue::new("name", "Alice")],
        });
        assert_eq!(insert.execute(&mut db).unwrap(), None);

        let select = Operation::Select(Select {
            columns: vec!["*".into()],
            table: "users".into(),
            filters: vec![],
            sorters: vec![],
        });
        let bytes = select.execute(&mut db).unwrap().unwrap();
        let data: TableData = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(data.columns, vec!["id", "name"]);
        assert_eq!(data.rows, vec![vec!["1", "Alice"]]);
    }

    #[test]
    fn test_missing_table_is_propagated() {
        let mut db = users();
        let operations = [
            Operation::InsertInto(InsertInto {
                table: "nope".into(),
                values: vec![],
            }),
            Operation::Update(Update {
                table: "nope".into(),
                values: vec![],
                filters: vec![],
            }),
            Operation::Delete(Delete {
                table: "nope".into(),
                filters: vec![],
            }),
            Operation::DropTable(DropTable {
                name: "nope".into(),
            }),
        ];

        for op in operations {
            let err = op.execute(&mut db).unwrap_err();
            assert!(matches!(err, Error::TableNotFound(name) if name == "nope"));
        }
    }
}
