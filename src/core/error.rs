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

//! Error types for predicate compilation and evaluation
//!
//! Errors fall into two families. Compile-time errors (type mismatches,
//! illegal casts, malformed BETWEEN/IN operands) abort compilation before a
//! plan exists. Runtime errors (malformed strings read from a column, a scalar
//! subquery returning several rows) abort the statement that raised them.
//! Every error carries the SQLSTATE a client would see.

use std::fmt;

use thiserror::Error;

/// Result type alias for compilation and evaluation
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Type errors (compile time)
    // =========================================================================
    /// Two operands of a comparison belong to different comparability classes
    #[error("Comparisons between '{left}' and '{right}' are not supported")]
    TypeMismatch { left: String, right: String },

    /// Two branches of a UNION have incompatible types
    #[error("Types '{left}' and '{right}' are not UNION compatible")]
    UnionTypeMismatch { left: String, right: String },

    /// A value cannot be stored into a column of the target type
    #[error("Columns of type '{target}' cannot hold values of type '{source_type}'")]
    AssignmentMismatch { target: String, source_type: String },

    // =========================================================================
    // Cast errors
    // =========================================================================
    /// Explicit CAST between disallowed type classes
    #[error("Cannot convert types '{from}' to '{to}'")]
    InvalidCast { from: String, to: String },

    /// A string literal cannot be cast to the target type
    #[error("Invalid character string format for type {to}: '{literal}'")]
    InvalidCastLiteral { literal: String, to: String },

    /// A string read at execution time cannot be cast to the target type
    #[error("Invalid character string format for type {target}: '{value}'")]
    MalformedStringLiteral { value: String, target: String },

    // =========================================================================
    // Predicate shape errors (compile time)
    // =========================================================================
    /// BETWEEN whose operands are all parameters, or a bare NULL operand
    #[error("illegal BETWEEN: {message}")]
    IllegalBetween { message: String, sql_state: SqlState },

    /// Empty IN list, bare NULL candidate, or all-parameter IN
    #[error("illegal IN list: {message}")]
    IllegalInList { message: String, sql_state: SqlState },

    // =========================================================================
    // Runtime errors
    // =========================================================================
    /// Scalar subquery produced more than one row
    #[error("Scalar subquery is only allowed to return a single row, got {rows}")]
    CardinalityViolation { rows: usize },

    /// Numeric value does not fit the target type
    #[error("The resulting value is outside the range for the data type {target}: {value}")]
    OutOfRange { value: String, target: String },

    /// Parameter has no bound value
    #[error("parameter ?{0} is not bound")]
    UnboundParameter(usize),

    // =========================================================================
    // Binding errors
    // =========================================================================
    /// Table not found in the catalog snapshot
    #[error("table '{0}' not found")]
    TableNotFound(String),

    /// Column not found in table schema
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    /// Column reference does not point into the current join tree
    #[error("invalid column reference #{result_set}.{column}")]
    InvalidColumnReference { result_set: u32, column: usize },

    /// Unknown type or operator name
    #[error("parse error: {0}")]
    Parse(String),

    // =========================================================================
    // Wrapping
    // =========================================================================
    /// Error annotated with the sub-tree that caused it
    #[error("{inner} (at {location})")]
    Located {
        location: Location,
        inner: Box<Error>,
    },

    /// Internal invariant violated
    #[error("internal error: {message}")]
    Internal { message: String },
}

/// SQLSTATE codes reported to clients
///
/// Values follow the codes clients of the original product observe, so
/// regression suites written against that product keep matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlState {
    /// 42818
    ComparisonMismatch,
    /// 42X61
    UnionMismatch,
    /// 42821
    AssignmentMismatch,
    /// 42846
    InvalidCast,
    /// 22018
    InvalidCharacterFormat,
    /// 42X35
    AllParameterOperands,
    /// 42X01
    SyntaxError,
    /// 21000
    CardinalityViolation,
    /// 22003
    NumericOutOfRange,
    /// 07000
    UnboundParameter,
    /// 42X05
    TableNotFound,
    /// 42X04
    ColumnNotFound,
    /// XJ001
    Internal,
}

impl SqlState {
    /// The five-character code
    pub fn code(&self) -> &'static str {
        match self {
            SqlState::ComparisonMismatch => "42818",
            SqlState::UnionMismatch => "42X61",
            SqlState::AssignmentMismatch => "42821",
            SqlState::InvalidCast => "42846",
            SqlState::InvalidCharacterFormat => "22018",
            SqlState::AllParameterOperands => "42X35",
            SqlState::SyntaxError => "42X01",
            SqlState::CardinalityViolation => "21000",
            SqlState::NumericOutOfRange => "22003",
            SqlState::UnboundParameter => "07000",
            SqlState::TableNotFound => "42X05",
            SqlState::ColumnNotFound => "42X04",
            SqlState::Internal => "XJ001",
        }
    }
}

impl fmt::Display for SqlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The clause a diagnostic points into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clause {
    Where,
    /// ON clause of the join with this result-set number
    On(u32),
    Projection,
}

/// Offending sub-tree: clause plus child-index path from the clause root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub clause: Clause,
    pub path: Vec<usize>,
}

impl Location {
    pub fn new(clause: Clause) -> Self {
        Self {
            clause,
            path: Vec::new(),
        }
    }

    /// Location of the `index`-th child below this one
    pub fn child(&self, index: usize) -> Self {
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend_from_slice(&self.path);
        path.push(index);
        Self {
            clause: self.clause,
            path,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.clause {
            Clause::Where => write!(f, "WHERE")?,
            Clause::On(rs) => write!(f, "ON #{}", rs)?,
            Clause::Projection => write!(f, "SELECT list")?,
        }
        for step in &self.path {
            write!(f, "/{}", step)?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new TypeMismatch error
    pub fn type_mismatch(left: impl fmt::Display, right: impl fmt::Display) -> Self {
        Error::TypeMismatch {
            left: left.to_string(),
            right: right.to_string(),
        }
    }

    /// Create a new UnionTypeMismatch error
    pub fn union_mismatch(left: impl fmt::Display, right: impl fmt::Display) -> Self {
        Error::UnionTypeMismatch {
            left: left.to_string(),
            right: right.to_string(),
        }
    }

    /// Create a new AssignmentMismatch error
    pub fn assignment_mismatch(target: impl fmt::Display, source: impl fmt::Display) -> Self {
        Error::AssignmentMismatch {
            target: target.to_string(),
            source_type: source.to_string(),
        }
    }

    /// Create a new InvalidCast error
    pub fn invalid_cast(from: impl fmt::Display, to: impl fmt::Display) -> Self {
        Error::InvalidCast {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Create a new InvalidCastLiteral error
    pub fn invalid_cast_literal(literal: impl Into<String>, to: impl fmt::Display) -> Self {
        Error::InvalidCastLiteral {
            literal: literal.into(),
            to: to.to_string(),
        }
    }

    /// Create a new MalformedStringLiteral error
    pub fn malformed_string(value: impl Into<String>, target: impl fmt::Display) -> Self {
        Error::MalformedStringLiteral {
            value: value.into(),
            target: target.to_string(),
        }
    }

    /// Create a new OutOfRange error
    pub fn out_of_range(value: impl fmt::Display, target: impl fmt::Display) -> Self {
        Error::OutOfRange {
            value: value.to_string(),
            target: target.to_string(),
        }
    }

    /// BETWEEN with every operand a `?` parameter
    pub fn between_all_parameters() -> Self {
        Error::IllegalBetween {
            message: "all the operands of BETWEEN are '?' parameters".to_string(),
            sql_state: SqlState::AllParameterOperands,
        }
    }

    /// BETWEEN with a bare NULL operand
    pub fn between_null_operand() -> Self {
        Error::IllegalBetween {
            message: "NULL is not allowed as a BETWEEN operand".to_string(),
            sql_state: SqlState::SyntaxError,
        }
    }

    /// IN with no candidates or with a bare NULL candidate
    pub fn in_list_syntax(message: impl Into<String>) -> Self {
        Error::IllegalInList {
            message: message.into(),
            sql_state: SqlState::SyntaxError,
        }
    }

    /// IN whose target and candidates are all `?` parameters
    pub fn in_list_all_parameters() -> Self {
        Error::IllegalInList {
            message: "all the operands of IN are '?' parameters".to_string(),
            sql_state: SqlState::AllParameterOperands,
        }
    }

    /// Create a new Parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse(message.into())
    }

    /// Create a new Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Attach a location, keeping the innermost one if already located
    pub fn at(self, location: Location) -> Self {
        match self {
            located @ Error::Located { .. } => located,
            other => Error::Located {
                location,
                inner: Box::new(other),
            },
        }
    }

    /// The error without its location wrapper
    pub fn kind(&self) -> &Error {
        match self {
            Error::Located { inner, .. } => inner.kind(),
            other => other,
        }
    }

    /// The location of the offending sub-tree, if known
    pub fn location(&self) -> Option<&Location> {
        match self {
            Error::Located { location, .. } => Some(location),
            _ => None,
        }
    }

    /// SQLSTATE reported for this error
    pub fn sql_state(&self) -> SqlState {
        match self.kind() {
            Error::TypeMismatch { .. } => SqlState::ComparisonMismatch,
            Error::UnionTypeMismatch { .. } => SqlState::UnionMismatch,
            Error::AssignmentMismatch { .. } => SqlState::AssignmentMismatch,
            Error::InvalidCast { .. } => SqlState::InvalidCast,
            Error::InvalidCastLiteral { .. } | Error::MalformedStringLiteral { .. } => {
                SqlState::InvalidCharacterFormat
            }
            Error::IllegalBetween { sql_state, .. } | Error::IllegalInList { sql_state, .. } => {
                *sql_state
            }
            Error::CardinalityViolation { .. } => SqlState::CardinalityViolation,
            Error::OutOfRange { .. } => SqlState::NumericOutOfRange,
            Error::UnboundParameter(_) => SqlState::UnboundParameter,
            Error::TableNotFound(_) => SqlState::TableNotFound,
            Error::ColumnNotFound(_) => SqlState::ColumnNotFound,
            Error::Parse(_) => SqlState::SyntaxError,
            Error::InvalidColumnReference { .. } | Error::Internal { .. } => SqlState::Internal,
            Error::Located { .. } => SqlState::Internal,
        }
    }

    /// Check if this error is raised while compiling a statement
    pub fn is_compile_time(&self) -> bool {
        matches!(
            self.kind(),
            Error::TypeMismatch { .. }
                | Error::UnionTypeMismatch { .. }
                | Error::AssignmentMismatch { .. }
                | Error::InvalidCast { .. }
                | Error::InvalidCastLiteral { .. }
                | Error::IllegalBetween { .. }
                | Error::IllegalInList { .. }
                | Error::TableNotFound(_)
                | Error::ColumnNotFound(_)
                | Error::Parse(_)
        )
    }

    /// Check if this error is raised while executing a statement
    pub fn is_runtime(&self) -> bool {
        matches!(
            self.kind(),
            Error::MalformedStringLiteral { .. }
                | Error::CardinalityViolation { .. }
                | Error::OutOfRange { .. }
                | Error::UnboundParameter(_)
        )
    }

    /// Check if this is a type error
    pub fn is_type_error(&self) -> bool {
        matches!(
            self.kind(),
            Error::TypeMismatch { .. }
                | Error::UnionTypeMismatch { .. }
                | Error::AssignmentMismatch { .. }
        )
    }
}
