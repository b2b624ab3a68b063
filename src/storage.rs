//! On-disk layout of a database: one JSON file per table inside the root
//! directory, named after the table.
//!
//! ```text
//! <root>/users.json
//! {"table":"users","columns":[{"column":"id","type":"INT","values":["1","2"]}]}
//! ```

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::table::Table;

pub const TABLE_FILE_EXTENSION: &str = "json";

/// Whether `name` can be used as a file name inside the root directory.
pub fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

pub fn table_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{name}.{TABLE_FILE_EXTENSION}"))
}

/// Lists the table files of `root`, sorted by path. A missing directory has
/// no table files.
pub fn table_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(vec![]);
    }

    let mut files = vec![];
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == TABLE_FILE_EXTENSION)
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn write_table(root: &Path, table: &Table) -> Result<()> {
    let mut writer = BufWriter::new(File::create(table_path(root, &table.name))?);
    serde_json::to_writer(&mut writer, table)?;
    writer.flush()?;
    Ok(())
}

/// Reads one table file and checks that its columns have equal lengths and
/// that its name can be written back as a file name.
pub fn read_table(path: &Path) -> Result<Table> {
    let reader = BufReader::new(File::open(path)?);
    let table: Table = serde_json::from_reader(reader)?;
    if !is_valid_table_name(&table.name) {
        return Err(Error::InvalidName(table.name));
    }
    table.validate()?;
    Ok(table)
}
