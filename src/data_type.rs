use std::fmt;
use std::str::FromStr;

use allocative::Allocative;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The supported column types.
///
/// Values are always stored as text; the type only decides the default value
/// of a column and how its values are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Allocative)]
#[serde(rename_all = "UPPERCASE", try_from = "StoredType")]
pub enum ColumnType {
    /// A signed integer, parsed leniently when compared.
    Int,
    /// A variable-length string.
    Varchar,
}

impl ColumnType {
    /// Value given to a column when an insert does not provide one.
    pub fn default_value(self) -> &'static str {
        match self {
            Self::Int => "0",
            Self::Varchar => "",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int => "INT",
            Self::Varchar => "VARCHAR",
        }
    }

    /// Legacy numeric code of the type, accepted when reading table files.
    fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Int),
            1 => Some(Self::Varchar),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INT" => Ok(Self::Int),
            "VARCHAR" => Ok(Self::Varchar),
            _ => Err(Error::UnknownType(s.to_string())),
        }
    }
}

/// On-disk form of a type: its name, or the legacy numeric code.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredType {
    Name(String),
    Code(u64),
}

impl TryFrom<StoredType> for ColumnType {
    type Error = Error;

    fn try_from(stored: StoredType) -> Result<Self, Error> {
        match stored {
            StoredType::Name(name) => name.parse(),
            StoredType::Code(code) => {
                Self::from_code(code).ok_or_else(|| Error::UnknownType(code.to_string()))
            }
        }
    }
}
