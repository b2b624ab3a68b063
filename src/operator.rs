use std::cmp::Ordering;
use std::fmt;
use std::ops::BitOr;

use crate::data_type::ColumnType;

/// A comparison operator stored as a set of flags.
///
/// `<=` and `>=` are unions of their one-character parts, which is how the
/// parser builds them from two adjacent operator tokens.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EqualityOperator(u8);

impl EqualityOperator {
    pub const LESS: Self = Self(1);
    pub const GREATER: Self = Self(2);
    pub const EQUAL: Self = Self(4);
    pub const LESS_OR_EQUAL: Self = Self(1 | 4);
    pub const GREATER_OR_EQUAL: Self = Self(2 | 4);

    /// Operator for a single `<`, `>` or `=`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(Self::LESS),
            ">" => Some(Self::GREATER),
            "=" => Some(Self::EQUAL),
            _ => None,
        }
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Operator obtained when both operands swap sides: `a < b` is `b > a`.
    pub fn inverse(self) -> Self {
        let mut bits = self.0 & Self::EQUAL.0;
        if self.contains(Self::LESS) {
            bits |= Self::GREATER.0;
        }
        if self.contains(Self::GREATER) {
            bits |= Self::LESS.0;
        }
        Self(bits)
    }

    /// Whether the set is one of `<`, `>`, `=`, `<=` or `>=`. Other
    /// combinations such as `<>` match nothing.
    pub fn is_supported(self) -> bool {
        [
            Self::LESS,
            Self::GREATER,
            Self::EQUAL,
            Self::LESS_OR_EQUAL,
            Self::GREATER_OR_EQUAL,
        ]
        .contains(&self)
    }

    /// Evaluates `a <op> b` for values of a column of type `column_type`.
    ///
    /// Only `=` is meaningful on `VARCHAR`: every other operator is false.
    pub fn matches(self, column_type: ColumnType, a: &str, b: &str) -> bool {
        match column_type {
            ColumnType::Int if !self.is_supported() => false,
            ColumnType::Int => {
                let flag = match compare(column_type, a, b) {
                    Ordering::Less => Self::LESS,
                    Ordering::Greater => Self::GREATER,
                    Ordering::Equal => Self::EQUAL,
                };
                self.contains(flag)
            }
            ColumnType::Varchar => self == Self::EQUAL && a == b,
        }
    }
}

impl BitOr for EqualityOperator {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for EqualityOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut symbol = String::new();
        if self.contains(Self::LESS) {
            symbol.push('<');
        }
        if self.contains(Self::GREATER) {
            symbol.push('>');
        }
        if self.contains(Self::EQUAL) {
            symbol.push('=');
        }
        write!(f, "EqualityOperator({symbol})")
    }
}

/// Orders two stored values according to the column type.
///
/// Integers are parsed leniently: text that is not a valid `i64` counts as 0.
pub fn compare(column_type: ColumnType, a: &str, b: &str) -> Ordering {
    match column_type {
        ColumnType::Int => parse_int(a).cmp(&parse_int(b)),
        ColumnType::Varchar => a.cmp(b),
    }
}

fn parse_int(value: &str) -> i64 {
    value.parse().unwrap_or(0)
}
