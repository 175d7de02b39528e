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

//! Row type - a collection of column values

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Deref, Index};

use super::error::{Error, Result};
use super::types::DataType;
use super::value::Value;

/// A row of values, as produced by a table scan or a join
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Create a new empty row
    #[inline]
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Create a row from a vector of values
    #[inline]
    pub fn from_values(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Create a row by combining two rows (for JOINs)
    pub fn from_combined(left: &Row, right: &Row) -> Self {
        let mut values = Vec::with_capacity(left.len() + right.len());
        values.extend(left.values.iter().cloned());
        values.extend(right.values.iter().cloned());
        Self { values }
    }

    /// Create the NULL extension of a row for the null-producing side
    pub fn null_row(types: &[DataType]) -> Self {
        Self {
            values: types.iter().map(|dt| Value::null(*dt)).collect(),
        }
    }

    /// Get the number of values in the row
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value by index
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Consume the row and return its values
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Select specific columns by index, failing on an out-of-range index
    pub fn select_columns(&self, indices: &[usize]) -> Result<Row> {
        let mut values = Vec::with_capacity(indices.len());
        for &i in indices {
            let value = self
                .values
                .get(i)
                .ok_or_else(|| Error::internal(format!("row has no column {}", i)))?;
            values.push(value.clone());
        }
        Ok(Row::from_values(values))
    }

    /// Returns true if every value in the row is NULL
    pub fn is_all_null(&self) -> bool {
        self.values.iter().all(Value::is_null)
    }
}

impl Ord for Row {
    fn cmp(&self, other: &Self) -> Ordering {
        self.values.cmp(&other.values)
    }
}

impl PartialOrd for Row {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Implement Deref to allow using Row like a slice
impl Deref for Row {
    type Target = [Value];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl Index<usize> for Row {
    type Output = Value;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}

impl FromIterator<Value> for Row {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Row::from_values(iter.into_iter().collect())
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::from_values(values)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, ")")
    }
}

/// Macro for creating rows conveniently
#[macro_export]
macro_rules! row {
    () => {
        $crate::core::Row::new()
    };
    ($($val:expr),+ $(,)?) => {
        $crate::core::Row::from_values(vec![$($crate::core::Value::from($val)),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_and_null_row() {
        let left = Row::from_values(vec![Value::integer(1), Value::text("a")]);
        let nulls = Row::null_row(&[DataType::Integer, DataType::Varchar]);
        assert!(nulls.is_all_null());
        let joined = Row::from_combined(&left, &nulls);
        assert_eq!(joined.len(), 4);
        assert_eq!(joined[0], Value::integer(1));
        assert!(joined[3].is_null());
        assert!(!joined.is_all_null());
    }

    #[test]
    fn test_select_columns() {
        let row = crate::row![1i64, "x", true];
        let picked = row.select_columns(&[2, 0]).unwrap();
        assert_eq!(picked, crate::row![true, 1i64]);
        assert!(row.select_columns(&[3]).is_err());
    }

    #[test]
    fn test_rows_sort_as_multisets() {
        let mut rows = vec![crate::row![2i64], crate::row![1i64], crate::row![2i64]];
        rows.sort();
        assert_eq!(
            rows,
            vec![crate::row![1i64], crate::row![2i64], crate::row![2i64]]
        );
        assert_eq!(crate::row![1i64, "b"].to_string(), "(1, b)");
    }
}
