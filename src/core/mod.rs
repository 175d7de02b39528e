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

//! Core types and definitions
//!
//! - [`DataType`] - SQL type tags (INTEGER, DECIMAL, VARCHAR, DATE, ...)
//! - [`CompareOp`] - Comparison operators (=, <>, <, ...)
//! - [`Value`] - Runtime values with type information
//! - [`TriBool`] - Three-valued truth values and [`EvalMode`]
//! - [`Row`] - A row of values
//! - [`Error`] - Error taxonomy with SQLSTATEs and locations

pub mod error;
pub mod row;
pub mod tribool;
pub mod types;
pub mod value;

// Re-export main types for convenience
pub use error::{Clause, Error, Location, Result, SqlState};
pub use row::Row;
pub use tribool::{EvalMode, TriBool};
pub use types::{CompareOp, DataType};
pub use value::{parse_date, parse_time, parse_timestamp, Value};
