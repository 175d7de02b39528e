// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Core type definitions
//!
//! This module defines the SQL type tags and the comparison operators.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::error::Error;

/// SQL data types
///

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum DataType {
    /// Type of an untyped NULL literal or an unbound parameter

    #[default]
    Null = 0,

    /// 16-bit signed integer
    SmallInt = 1,

    /// 32-bit signed integer
    Integer = 2,

    /// 64-bit signed integer
    BigInt = 3,

    /// Exact numeric (DECIMAL / NUMERIC)
    Decimal = 4,

    /// Single precision floating point
    Real = 5,

    /// Double precision floating point
    Double = 6,

    /// Fixed-length character string
    Char = 7,

    /// Variable-length character string
    Varchar = 8,

    /// LONG VARCHAR
    LongVarchar = 9,

    /// Character large object
    Clob = 10,

    /// Fixed-length binary string (CHAR FOR BIT DATA)
    Binary = 11,

    /// Variable-length binary string
    VarBinary = 12,

    /// Calendar date
    Date = 13,

    /// Time of day
    Time = 14,

    /// Date and time without zone
    Timestamp = 15,

    /// Boolean true/false
    Boolean = 16,
}

impl DataType {
    /// Returns true for exact and approximate numeric types
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::SmallInt
                | DataType::Integer
                | DataType::BigInt
                | DataType::Decimal
                | DataType::Real
                | DataType::Double
        )
    }

    /// Returns true for REAL and DOUBLE
    pub fn is_approximate(&self) -> bool {
        matches!(self, DataType::Real | DataType::Double)
    }

    /// Returns true for integer types
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::SmallInt | DataType::Integer | DataType::BigInt
        )
    }

    /// Returns true for character string types
    pub fn is_string(&self) -> bool {
        matches!(
            self,
            DataType::Char | DataType::Varchar | DataType::LongVarchar | DataType::Clob
        )
    }

    /// Returns true for binary string types
    pub fn is_binary(&self) -> bool {
        matches!(self, DataType::Binary | DataType::VarBinary)
    }

    /// Returns true for DATE, TIME and TIMESTAMP
    pub fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date | DataType::Time | DataType::Timestamp)
    }

    /// Precedence used to pick the dominant type of mixed operands
    ///
    /// Within the numeric family a higher precedence can hold every value of
    /// a lower one without truncation of the integral part.
    pub fn precedence(&self) -> u8 {
        match self {
            DataType::Null => 0,
            DataType::SmallInt => 10,
            DataType::Integer => 20,
            DataType::BigInt => 30,
            DataType::Decimal => 40,
            DataType::Real => 50,
            DataType::Double => 60,
            DataType::Char => 10,
            DataType::Varchar => 20,
            DataType::LongVarchar => 30,
            DataType::Clob => 40,
            DataType::Binary => 10,
            DataType::VarBinary => 20,
            DataType::Date | DataType::Time | DataType::Timestamp => 10,
            DataType::Boolean => 10,
        }
    }

    /// Returns the type ID as u8 for serialization
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Create DataType from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(DataType::Null),
            1 => Some(DataType::SmallInt),
            2 => Some(DataType::Integer),
            3 => Some(DataType::BigInt),
            4 => Some(DataType::Decimal),
            5 => Some(DataType::Real),
            6 => Some(DataType::Double),
            7 => Some(DataType::Char),
            8 => Some(DataType::Varchar),
            9 => Some(DataType::LongVarchar),
            10 => Some(DataType::Clob),
            11 => Some(DataType::Binary),
            12 => Some(DataType::VarBinary),
            13 => Some(DataType::Date),
            14 => Some(DataType::Time),
            15 => Some(DataType::Timestamp),
            16 => Some(DataType::Boolean),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Null => "NULL",
            DataType::SmallInt => "SMALLINT",
            DataType::Integer => "INTEGER",
            DataType::BigInt => "BIGINT",
            DataType::Decimal => "DECIMAL",
            DataType::Real => "REAL",
            DataType::Double => "DOUBLE",
            DataType::Char => "CHAR",
            DataType::Varchar => "VARCHAR",
            DataType::LongVarchar => "LONG VARCHAR",
            DataType::Clob => "CLOB",
            DataType::Binary => "CHAR FOR BIT DATA",
            DataType::VarBinary => "VARCHAR FOR BIT DATA",
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Boolean => "BOOLEAN",
        };
        f.write_str(name)
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_uppercase().as_str() {
            "NULL" => Ok(DataType::Null),
            "SMALLINT" => Ok(DataType::SmallInt),
            "INTEGER" | "INT" => Ok(DataType::Integer),
            "BIGINT" => Ok(DataType::BigInt),
            "DECIMAL" | "DEC" | "NUMERIC" => Ok(DataType::Decimal),
            "REAL" => Ok(DataType::Real),
            "DOUBLE" | "DOUBLE PRECISION" | "FLOAT" => Ok(DataType::Double),
            "CHAR" | "CHARACTER" => Ok(DataType::Char),
            "VARCHAR" | "CHAR VARYING" | "CHARACTER VARYING" => Ok(DataType::Varchar),
            "LONG VARCHAR" => Ok(DataType::LongVarchar),
            "CLOB" => Ok(DataType::Clob),
            "CHAR FOR BIT DATA" => Ok(DataType::Binary),
            "VARCHAR FOR BIT DATA" => Ok(DataType::VarBinary),
            "DATE" => Ok(DataType::Date),
            "TIME" => Ok(DataType::Time),
            "TIMESTAMP" => Ok(DataType::Timestamp),
            "BOOLEAN" => Ok(DataType::Boolean),
            _ => Err(Error::parse(format!("unknown data type: {}", s))),
        }
    }
}

/// Comparison operators
///

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CompareOp {
    /// Equality (=)
    Eq = 0,

    /// Inequality (<>)
    Ne = 1,

    /// Greater than (>)
    Gt = 2,

    /// Greater than or equal (>=)
    Gte = 3,

    /// Less than (<)
    Lt = 4,

    /// Less than or equal (<=)
    Lte = 5,
}

impl CompareOp {
    /// Returns the operator whose result is the boolean negation of this one
    ///
    /// Only valid for non-NULL operands; NULL operands make both UNKNOWN.
    pub fn negate(&self) -> Self {
        match self {
            CompareOp::Eq => CompareOp::Ne,
            CompareOp::Ne => CompareOp::Eq,
            CompareOp::Gt => CompareOp::Lte,
            CompareOp::Gte => CompareOp::Lt,
            CompareOp::Lt => CompareOp::Gte,
            CompareOp::Lte => CompareOp::Gt,
        }
    }

    /// Returns the operator to use when the operands are swapped
    pub fn flip(&self) -> Self {
        match self {
            CompareOp::Eq => CompareOp::Eq,
            CompareOp::Ne => CompareOp::Ne,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Gte => CompareOp::Lte,
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Lte => CompareOp::Gte,
        }
    }

    /// Returns true if this operator needs an ordering, not just equality
    pub fn is_ordering(&self) -> bool {
        !matches!(self, CompareOp::Eq | CompareOp::Ne)
    }

    /// Apply the operator to an already computed ordering
    pub fn matches(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Gte => ordering != Ordering::Less,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Lte => ordering != Ordering::Greater,
        }
    }

    /// Returns the type ID as u8 for serialization
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "="),
            CompareOp::Ne => write!(f, "<>"),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
        }
    }
}

impl FromStr for CompareOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" => Ok(CompareOp::Eq),
            "<>" | "!=" => Ok(CompareOp::Ne),
            ">" => Ok(CompareOp::Gt),
            ">=" => Ok(CompareOp::Gte),
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::Lte),
            _ => Err(Error::parse(format!("unknown operator: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TYPES: [DataType; 17] = [
        DataType::Null,
        DataType::SmallInt,
        DataType::Integer,
        DataType::BigInt,
        DataType::Decimal,
        DataType::Real,
        DataType::Double,
        DataType::Char,
        DataType::Varchar,
        DataType::LongVarchar,
        DataType::Clob,
        DataType::Binary,
        DataType::VarBinary,
        DataType::Date,
        DataType::Time,
        DataType::Timestamp,
        DataType::Boolean,
    ];

    const ALL_OPS: [CompareOp; 6] = [
        CompareOp::Eq,
        CompareOp::Ne,
        CompareOp::Gt,
        CompareOp::Gte,
        CompareOp::Lt,
        CompareOp::Lte,
    ];

    // =========================================================================
    // DataType tests
    // =========================================================================

    #[test]
    fn test_datatype_display_round_trip() {
        for dt in ALL_TYPES {
            assert_eq!(dt.to_string().parse::<DataType>().unwrap(), dt);
        }
    }

    #[test]
    fn test_datatype_from_str_aliases() {
        assert_eq!("int".parse::<DataType>().unwrap(), DataType::Integer);
        assert_eq!("NUMERIC".parse::<DataType>().unwrap(), DataType::Decimal);
        assert_eq!(
            "double   precision".parse::<DataType>().unwrap(),
            DataType::Double
        );
        assert_eq!(
            "long varchar".parse::<DataType>().unwrap(),
            DataType::LongVarchar
        );
        assert!("JSON".parse::<DataType>().is_err());
    }

    #[test]
    fn test_datatype_families() {
        assert!(DataType::Decimal.is_numeric());
        assert!(!DataType::Decimal.is_integer());
        assert!(DataType::BigInt.is_integer());
        assert!(DataType::Clob.is_string());
        assert!(DataType::VarBinary.is_binary());
        assert!(DataType::Time.is_temporal());
        assert!(!DataType::Boolean.is_numeric());
        assert!(!DataType::Null.is_string());
    }

    #[test]
    fn test_numeric_precedence_is_monotone() {
        let chain = [
            DataType::SmallInt,
            DataType::Integer,
            DataType::BigInt,
            DataType::Decimal,
            DataType::Real,
            DataType::Double,
        ];
        for pair in chain.windows(2) {
            assert!(pair[0].precedence() < pair[1].precedence());
        }
    }

    #[test]
    fn test_datatype_u8_conversion() {
        for (i, dt) in ALL_TYPES.iter().enumerate() {
            assert_eq!(dt.as_u8(), i as u8);
            assert_eq!(DataType::from_u8(i as u8), Some(*dt));
        }
        assert_eq!(DataType::from_u8(100), None);
    }

    // =========================================================================
    // CompareOp tests
    // =========================================================================

    #[test]
    fn test_operator_negate_is_involution() {
        for op in ALL_OPS {
            assert_eq!(op.negate().negate(), op);
            for ord in [Ordering::Less, Ordering::Equal, Ordering::Greater] {
                assert_ne!(op.matches(ord), op.negate().matches(ord));
            }
        }
    }

    #[test]
    fn test_operator_flip() {
        for op in ALL_OPS {
            assert_eq!(op.flip().flip(), op);
            for ord in [Ordering::Less, Ordering::Equal, Ordering::Greater] {
                assert_eq!(op.matches(ord), op.flip().matches(ord.reverse()));
            }
        }
    }

    #[test]
    fn test_operator_from_str() {
        assert_eq!("=".parse::<CompareOp>().unwrap(), CompareOp::Eq);
        assert_eq!("!=".parse::<CompareOp>().unwrap(), CompareOp::Ne);
        assert_eq!("<>".parse::<CompareOp>().unwrap(), CompareOp::Ne);
        assert_eq!(">=".parse::<CompareOp>().unwrap(), CompareOp::Gte);
        assert!("LIKE".parse::<CompareOp>().is_err());
        for op in ALL_OPS {
            assert_eq!(op.to_string().parse::<CompareOp>().unwrap(), op);
        }
    }
}
