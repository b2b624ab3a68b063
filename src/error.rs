use thiserror::Error;

/// Every failure the engine can report, from parsing down to persistence.
#[derive(Error, Debug)]
pub enum Error {
    /// The token sequence does not match the grammar of its leading keyword.
    #[error("syntax error: {0}")]
    Syntax(String),
    /// A column type name that is neither `INT` nor `VARCHAR`.
    #[error("invalid column type [{0}]")]
    UnknownType(String),
    #[error("table [{0}] not found")]
    TableNotFound(String),
    #[error("no column was found: {0}")]
    ColumnNotFound(String),
    #[error("table [{0}] already exists")]
    TableExists(String),
    /// The table name cannot be used as a file name inside the database root.
    #[error("invalid table name [{0}]")]
    InvalidName(String),
    /// A persisted table whose columns disagree on the row count.
    #[error("corrupted table file: {0}")]
    Corrupted(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn syntax(msg: impl Into<String>) -> Self {
        Self::Syntax(msg.into())
    }
}
