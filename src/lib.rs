pub mod ast;
pub mod column;
pub mod config;
pub mod data_type;
pub mod database;
pub mod error;
pub mod operator;
pub mod parser;
pub mod server;
pub mod shared;
pub mod storage;
pub mod table;
pub mod tokenizer;

pub use ast::{ColumnDef, Filter, Operation, RowValue, SortDirection, Sorter};
pub use column::Column;
pub use data_type::ColumnType;
pub use database::{Database, Metadata};
pub use error::{Error, Result};
pub use operator::EqualityOperator;
pub use server::Server;
pub use shared::SharedDatabase;
pub use table::{Table, TableData};
