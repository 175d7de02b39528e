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

//! Type coercion and comparability
//!
//! Every type belongs to exactly one [`ComparabilityClass`]. Values may be
//! compared, unioned or assigned only within a class; anything else is a
//! compile-time error. An untyped NULL (or an unbound parameter) belongs to
//! no class and takes the type of whatever it meets.
//!
//! DATE, TIME and TIMESTAMP are three separate classes, and BOOLEAN mixes
//! with nothing.

pub mod cast;

use std::fmt;

use crate::catalog::SchemaColumn;
use crate::core::{DataType, Error, Result};

pub use cast::{boolean_to_string, cast_literal, cast_value, check_cast, parse_boolean_literal};

/// Equivalence classes of mutually comparable types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparabilityClass {
    /// Untyped NULL or unbound parameter
    Untyped,
    /// SMALLINT, INTEGER, BIGINT, DECIMAL, REAL and DOUBLE
    Numeric,
    /// CHAR, VARCHAR, LONG VARCHAR and CLOB
    CharString,
    /// BINARY and VARBINARY
    BinaryString,
    /// DATE
    Date,
    /// TIME
    Time,
    /// TIMESTAMP
    Timestamp,
    /// BOOLEAN
    Boolean,
}

impl fmt::Display for ComparabilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComparabilityClass::Untyped => "untyped",
            ComparabilityClass::Numeric => "numeric",
            ComparabilityClass::CharString => "character string",
            ComparabilityClass::BinaryString => "binary string",
            ComparabilityClass::Date => "date",
            ComparabilityClass::Time => "time",
            ComparabilityClass::Timestamp => "timestamp",
            ComparabilityClass::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// The comparability class of a type
pub fn comparability_class(data_type: DataType) -> ComparabilityClass {
    match data_type {
        DataType::Null => ComparabilityClass::Untyped,
        DataType::SmallInt
        | DataType::Integer
        | DataType::BigInt
        | DataType::Decimal
        | DataType::Real
        | DataType::Double => ComparabilityClass::Numeric,
        DataType::Char | DataType::Varchar | DataType::LongVarchar | DataType::Clob => {
            ComparabilityClass::CharString
        }
        DataType::Binary | DataType::VarBinary => ComparabilityClass::BinaryString,
        DataType::Date => ComparabilityClass::Date,
        DataType::Time => ComparabilityClass::Time,
        DataType::Timestamp => ComparabilityClass::Timestamp,
        DataType::Boolean => ComparabilityClass::Boolean,
    }
}

/// Whether values of the two classes may be compared directly
pub fn can_compare(left: ComparabilityClass, right: ComparabilityClass) -> bool {
    left == right || left == ComparabilityClass::Untyped || right == ComparabilityClass::Untyped
}

/// Fail with TypeMismatch unless the two types may be compared
pub fn check_comparable(left: DataType, right: DataType) -> Result<()> {
    if can_compare(comparability_class(left), comparability_class(right)) {
        Ok(())
    } else {
        Err(Error::type_mismatch(left, right))
    }
}

/// The type every operand of a mixed list is compared in
///
/// All typed members must share a class. Within a class the member with the
/// highest precedence wins, so `INTEGER, DECIMAL` compares in DECIMAL and
/// nothing is truncated. A list of untyped members stays untyped.
pub fn dominant_type(types: &[DataType]) -> Result<DataType> {
    let mut dominant = DataType::Null;
    for &candidate in types {
        if candidate == DataType::Null {
            continue;
        }
        check_comparable(dominant, candidate)?;
        if candidate.precedence() > dominant.precedence() {
            dominant = candidate;
        }
    }
    Ok(dominant)
}

/// Result type of `<left> UNION <right>`
pub fn check_union(left: DataType, right: DataType) -> Result<DataType> {
    if !can_compare(comparability_class(left), comparability_class(right)) {
        return Err(Error::union_mismatch(left, right));
    }
    dominant_type(&[left, right])
}

/// Check that a value of type `source` may be stored into `target`
///
/// Character strings may also be stored into date/time columns, where they
/// are parsed. An untyped NULL fits any nullable column.
pub fn check_assignment(target: &SchemaColumn, source: DataType) -> Result<()> {
    let target_type = target.data_type;
    if source == DataType::Null {
        return if target.nullable {
            Ok(())
        } else {
            Err(Error::assignment_mismatch(
                format!("{} NOT NULL", target_type),
                source,
            ))
        };
    }
    let target_class = comparability_class(target_type);
    let source_class = comparability_class(source);
    let ok = target_class == source_class
        || (target_type.is_temporal() && source_class == ComparabilityClass::CharString);
    if ok {
        Ok(())
    } else {
        Err(Error::assignment_mismatch(target_type, source))
    }
}
