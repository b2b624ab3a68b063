use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::ast::{ColumnDef, Operation};
use crate::error::{Error, Result};
use crate::parser::Parser;
use crate::storage;
use crate::table::{Table, TableData};
use crate::tokenizer::Tokenizer;

/// The main entry point of the engine: a named collection of tables rooted
/// at a directory used for persistence.
///
/// A `Database` is not synchronized; share it through
/// [SharedDatabase](crate::shared::SharedDatabase).
#[derive(Debug, Default)]
pub struct Database {
    root_path: PathBuf,
    /// A map of table names to their respective [Table] structures.
    tables: HashMap<String, Table>,
}

/// Metadata served next to the query endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub tables: Vec<String>,
}

impl Database {
    /// Creates an empty database persisted under `root_path`.
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            tables: HashMap::new(),
        }
    }

    /// Creates a database preloaded with `tables`; a later table replaces an
    /// earlier one of the same name.
    pub fn with_tables(root_path: impl Into<PathBuf>, tables: Vec<Table>) -> Self {
        let mut db = Self::new(root_path);
        for table in tables {
            db.tables.insert(table.name.clone(), table);
        }
        db
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Creates a new, empty table.
    ///
    /// # Errors
    /// Returns an error if a table with the same name already exists, or if
    /// the name cannot be used as a file name.
    pub fn create_table(&mut self, name: &str, columns: &[ColumnDef]) -> Result<()> {
        if self.tables.contains_key(name) {
            return Err(Error::TableExists(name.to_string()));
        }
        if !storage::is_valid_table_name(name) {
            return Err(Error::InvalidName(name.to_string()));
        }
        self.tables
            .insert(name.to_string(), Table::new(name, columns));
        Ok(())
    }

    /// Removes a table from the database by its name.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        match self.tables.remove(name) {
            Some(_) => Ok(()),
            None => Err(Error::TableNotFound(name.to_string())),
        }
    }

    pub fn get_table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    pub fn get_table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Returns the names of all tables, sorted.
    pub fn list_tables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn metadata(&self) -> Metadata {
        Metadata {
            tables: self.list_tables().into_iter().map(str::to_string).collect(),
        }
    }

    /// Runs one query: tokenize, parse, execute.
    ///
    /// Returns the JSON result of a select, `None` for any other operation.
    ///
    /// # Example
    /// ```
    /// use minisql::Database;
    /// let mut db = Database::new("");
    /// db.execute(b"CREATE TABLE users (id INT)").unwrap();
    /// db.execute(b"INSERT INTO users (id) VALUES (1)").unwrap();
    ///
    /// let json = db.execute(b"SELECT * FROM users").unwrap().unwrap();
    /// assert_eq!(json, br#"{"columns":["id"],"data":[["1"]]}"#);
    /// ```
    pub fn execute(&mut self, query: &[u8]) -> Result<Option<Vec<u8>>> {
        self.parse(query)?.execute(self)
    }

    /// Runs a `SELECT` and returns its rows without serializing them.
    ///
    /// # Example
    ///
    /// ```
    /// use minisql::Database;
    ///
    /// let mut db = Database::new("");
    /// db.execute(b"CREATE TABLE products (name VARCHAR, price INT)").unwrap();
    /// db.execute(b"INSERT INTO products (name, price) VALUES ('Laptop', 1200)").unwrap();
    /// db.execute(b"INSERT INTO products (name, price) VALUES ('Mouse', 25)").unwrap();
    ///
    /// let result = db.query("SELECT name FROM products WHERE price < 100").unwrap();
    /// assert_eq!(result.columns, vec!["name"]);
    /// assert_eq!(result.rows, vec![vec!["Mouse"]]);
    /// ```
    pub fn query(&self, sql: &str) -> Result<TableData> {
        match self.parse(sql.as_bytes())? {
            Operation::Select(select) => self.get_table(&select.table)?.get(
                &select.columns,
                &select.filters,
                &select.sorters,
            ),
            other => Err(Error::Syntax(format!(
                "statement {other:?} is not a queryable statement"
            ))),
        }
    }

    fn parse(&self, query: &[u8]) -> Result<Operation> {
        let tokens = Tokenizer::new(query).tokenize();
        debug!(tokens = tokens.len(), "tokenized query");
        Parser::new(tokens).parse()
    }

    /// Writes every table to its own file under the root directory.
    ///
    /// Existing table files are deleted first. This is not atomic: a failure
    /// part way leaves some old files deleted and some new ones unwritten.
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.root_path)?;

        for path in storage::table_files(&self.root_path)? {
            fs::remove_file(&path)?;
        }

        for table in self.tables.values() {
            storage::write_table(&self.root_path, table)?;
            debug!(
                table = %table.name,
                rows = table.row_count(),
                bytes = table.memory_footprint(),
                "table saved"
            );
        }

        info!(
            path = %self.root_path.display(),
            tables = self.tables.len(),
            "database saved"
        );
        Ok(())
    }

    /// Reads every table file under the root directory into the database.
    ///
    /// Loaded tables replace in-memory tables of the same name. A malformed
    /// file, a table name unusable as a file name, or a name stored in two
    /// files aborts the whole load and leaves the database unchanged.
    pub fn load(&mut self) -> Result<()> {
        let loaded = storage::table_files(&self.root_path)?
            .iter()
            .map(|path| storage::read_table(path))
            .collect::<Result<Vec<Table>>>()?;

        let mut seen = HashSet::new();
        if let Some(dup) = loaded.iter().find(|table| !seen.insert(table.name.as_str())) {
            return Err(Error::Corrupted(format!(
                "table {} is stored in more than one file",
                dup.name
            )));
        }

        for table in &loaded {
            debug!(
                table = %table.name,
                rows = table.row_count(),
                bytes = table.memory_footprint(),
                "table loaded"
            );
        }
        info!(
            path = %self.root_path.display(),
            tables = loaded.len(),
            "database loaded"
        );

        for table in loaded {
            self.tables.insert(table.name.clone(), table);
        }
        Ok(())
    }
}
