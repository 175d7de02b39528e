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

//! Typed runtime values
//!
//! `Value` is the tagged union every predicate operand evaluates to. NULL is
//! a state carrying its type tag, not a member of any domain.
//!
//! Numeric values compare exactly across representations: `Integer(4)`,
//! `Decimal(4.00)` and `Float(4.0)` are equal, while `Integer(4)` and
//! `Decimal(4.23)` are not, so no operand is ever truncated to the other's
//! type before comparing.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::error::{Error, Result};
use super::types::DataType;

/// Timestamp formats accepted when casting strings
/// Order matters - more specific formats first
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d-%H.%M.%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H.%M.%S", "%H:%M"];

/// A runtime value with type information
///
/// Text and Binary use Arc for cheap cloning during row operations.
#[derive(Debug, Clone)]
pub enum Value {
    /// NULL value with its type tag
    Null(DataType),

    /// Any integer type (SMALLINT, INTEGER, BIGINT)
    Integer(i64),

    /// Exact numeric
    Decimal(Decimal),

    /// REAL or DOUBLE
    Float(f64),

    /// Character string
    Text(Arc<str>),

    /// Binary string
    Binary(Arc<[u8]>),

    Date(NaiveDate),

    Time(NaiveTime),

    Timestamp(NaiveDateTime),

    Boolean(bool),
}

impl Value {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a NULL value with a type tag
    pub fn null(data_type: DataType) -> Self {
        Value::Null(data_type)
    }

    /// Create an untyped NULL
    pub fn null_unknown() -> Self {
        Value::Null(DataType::Null)
    }

    /// Create an integer value
    pub fn integer(value: i64) -> Self {
        Value::Integer(value)
    }

    /// Create a decimal value from a mantissa and scale (`423, 2` is 4.23)
    pub fn decimal(mantissa: i64, scale: u32) -> Self {
        Value::Decimal(Decimal::new(mantissa, scale))
    }

    /// Create a float value
    pub fn float(value: f64) -> Self {
        Value::Float(value)
    }

    /// Create a text value
    pub fn text(value: impl AsRef<str>) -> Self {
        Value::Text(Arc::from(value.as_ref()))
    }

    /// Create a binary value
    pub fn binary(value: impl AsRef<[u8]>) -> Self {
        Value::Binary(Arc::from(value.as_ref()))
    }

    /// Create a boolean value
    pub fn boolean(value: bool) -> Self {
        Value::Boolean(value)
    }

    // =========================================================================
    // Type accessors
    // =========================================================================

    /// The type tag of this value
    ///
    /// Integers report INTEGER when they fit in 32 bits, like an integer
    /// literal would, and BIGINT otherwise.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null(dt) => *dt,
            Value::Integer(v) => {
                if i32::try_from(*v).is_ok() {
                    DataType::Integer
                } else {
                    DataType::BigInt
                }
            }
            Value::Decimal(_) => DataType::Decimal,
            Value::Float(_) => DataType::Double,
            Value::Text(_) => DataType::Varchar,
            Value::Binary(_) => DataType::VarBinary,
            Value::Date(_) => DataType::Date,
            Value::Time(_) => DataType::Time,
            Value::Timestamp(_) => DataType::Timestamp,
            Value::Boolean(_) => DataType::Boolean,
        }
    }

    /// Returns true if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    /// Returns the boolean content, if any
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer content, if any
    pub fn as_int64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the text content, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Exact decimal form of a numeric value
    ///
    /// Floats convert with every bit of their binary fraction retained, so
    /// `0.1f64` does not become `Decimal(0.1)`.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Integer(v) => Some(Decimal::from(*v)),
            Value::Decimal(d) => Some(*d),
            Value::Float(f) => Decimal::from_f64_retain(*f),
            _ => None,
        }
    }

    /// Returns true if the value is a number with no fractional part
    pub fn is_integral(&self) -> bool {
        match self {
            Value::Integer(_) => true,
            Value::Decimal(d) => d.fract().is_zero(),
            Value::Float(f) => f.is_finite() && f.fract() == 0.0,
            _ => false,
        }
    }

    /// Returns true if a column of type `target` can hold this value exactly
    ///
    /// Used to drop IN-list candidates that can never equal the target.
    pub fn is_representable_as(&self, target: DataType) -> bool {
        if self.is_null() {
            return true;
        }
        match target {
            DataType::SmallInt | DataType::Integer | DataType::BigInt => {
                if !self.is_integral() {
                    return false;
                }
                let Some(as_int) = self.to_decimal().and_then(|d| d.to_i64()) else {
                    return false;
                };
                match target {
                    DataType::SmallInt => i16::try_from(as_int).is_ok(),
                    DataType::Integer => i32::try_from(as_int).is_ok(),
                    _ => true,
                }
            }
            DataType::Decimal => self.to_decimal().is_some(),
            // Compared in DOUBLE, so anything that converts can match
            DataType::Real | DataType::Double => match self {
                Value::Integer(_) | Value::Float(_) => true,
                Value::Decimal(d) => d.to_f64().is_some(),
                _ => false,
            },
            other => self.data_type() == other || same_family(self.data_type(), other),
        }
    }

    // =========================================================================
    // Comparison
    // =========================================================================

    /// SQL comparison
    ///
    /// Numerics compare in their dominant type: exactly when both sides are
    /// exact, and as DOUBLE when either side is approximate.
    ///
    /// Returns:
    /// - Ok(None) if either side is NULL (the comparison is UNKNOWN)
    /// - Ok(Some(ordering)) for two comparable non-NULL values
    /// - Err(TypeMismatch) if the values belong to different type families
    pub fn compare(&self, other: &Value) -> Result<Option<Ordering>> {
        if self.is_null() || other.is_null() {
            return Ok(None);
        }
        if family(self) != family(other) {
            return Err(Error::type_mismatch(self.data_type(), other.data_type()));
        }
        if self.is_approximate() || other.is_approximate() {
            return Ok(Some(compare_floats(self.as_f64_lossy(), other.as_f64_lossy())));
        }
        Ok(Some(self.cmp(other)))
    }

    /// Returns true for a REAL or DOUBLE value
    pub fn is_approximate(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    /// The value as compared in a REAL/DOUBLE dominant type
    ///
    /// Exact numerics convert to the nearest double; every other value is
    /// returned unchanged.
    pub fn to_approximate(&self) -> Value {
        match self {
            Value::Integer(_) | Value::Decimal(_) => Value::Float(self.as_f64_lossy()),
            other => other.clone(),
        }
    }

    /// Compare two numeric values exactly
    ///
    /// Backs `Ord`, which must stay transitive across representations. SQL
    /// comparison goes through [`Value::compare`].
    fn compare_numeric(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => compare_floats(*a, *b),
            _ => match (self.to_decimal(), other.to_decimal()) {
                (Some(a), Some(b)) => a.cmp(&b),
                // A float outside the decimal range or NaN
                _ => compare_floats(self.as_f64_lossy(), other.as_f64_lossy()),
            },
        }
    }

    fn as_f64_lossy(&self) -> f64 {
        match self {
            Value::Integer(v) => *v as f64,
            Value::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
            Value::Float(f) => *f,
            _ => f64::NAN,
        }
    }
}

/// Type family used for ordering and hashing
fn family(v: &Value) -> u8 {
    match v {
        Value::Null(_) => 0,
        Value::Boolean(_) => 1,
        Value::Integer(_) | Value::Decimal(_) | Value::Float(_) => 2,
        Value::Text(_) => 3,
        Value::Binary(_) => 4,
        Value::Date(_) => 5,
        Value::Time(_) => 6,
        Value::Timestamp(_) => 7,
    }
}

fn same_family(a: DataType, b: DataType) -> bool {
    (a.is_string() && b.is_string()) || (a.is_binary() && b.is_binary())
}

fn compare_floats(a: f64, b: f64) -> Ordering {
    // NaN is ordered last
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Compare strings as if the shorter were padded with blanks
fn compare_blank_padded(a: &str, b: &str) -> Ordering {
    let (mut left, mut right) = (a.chars(), b.chars());
    loop {
        match (left.next(), right.next()) {
            (Some(x), Some(y)) if x == y => continue,
            (Some(x), Some(y)) => return x.cmp(&y),
            (None, None) => return Ordering::Equal,
            (Some(x), None) => {
                return std::iter::once(x)
                    .chain(left)
                    .find(|&c| c != ' ')
                    .map_or(Ordering::Equal, |c| c.cmp(&' '))
            }
            (None, Some(y)) => {
                return std::iter::once(y)
                    .chain(right)
                    .find(|&c| c != ' ')
                    .map_or(Ordering::Equal, |c| ' '.cmp(&c))
            }
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null(DataType::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null(_) => write!(f, "NULL"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Text(s) => write!(f, "{}", s),
            Value::Binary(b) => {
                write!(f, "X'")?;
                for byte in b.iter() {
                    write!(f, "{:02x}", byte)?;
                }
                write!(f, "'")
            }
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Equal values must hash the same. Integer(5), Decimal(5.0) and
        // Float(5.0) are equal, so numerics hash through one canonical form.
        family(self).hash(state);
        match self {
            Value::Null(_) => {}
            Value::Integer(_) | Value::Decimal(_) | Value::Float(_) => {
                match self.to_decimal() {
                    Some(d) if d.fract().is_zero() && d.to_i64().is_some() => {
                        0u8.hash(state);
                        d.to_i64().hash(state);
                    }
                    Some(d) => {
                        1u8.hash(state);
                        d.normalize().hash(state);
                    }
                    None => {
                        2u8.hash(state);
                        self.as_f64_lossy().to_bits().hash(state);
                    }
                }
            }
            // Trailing blanks do not take part in equality
            Value::Text(s) => s.trim_end_matches(' ').hash(state),
            Value::Binary(b) => b.hash(state),
            Value::Date(d) => d.hash(state),
            Value::Time(t) => t.hash(state),
            Value::Timestamp(ts) => ts.hash(state),
            Value::Boolean(b) => b.hash(state),
        }
    }
}

#[allow(clippy::non_canonical_partial_ord_impl)]
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        // SQL semantics: NULL and cross-family comparisons have no order
        self.compare(other).ok().flatten()
    }
}

/// Total ordering for sorting and deduplicating candidate lists
///
/// 1. NULLs are ordered first
/// 2. Values of different families are ordered by family
/// 3. Numerics compare by exact numeric value, consistent with PartialEq
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        let (fa, fb) = (family(self), family(other));
        if fa != fb {
            return fa.cmp(&fb);
        }
        match (self, other) {
            (Value::Null(_), Value::Null(_)) => Ordering::Equal,
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => compare_blank_padded(a, b),
            (Value::Binary(a), Value::Binary(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Time(a), Value::Time(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            _ => self.compare_numeric(other),
        }
    }
}

// =========================================================================
// From implementations for convenient construction
// =========================================================================

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(Arc::from(v.as_str()))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null(DataType::Null),
        }
    }
}

// =========================================================================
// Helper functions
// =========================================================================

/// Parse a DATE literal (`yyyy-mm-dd`)
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Parse a TIME literal
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(s, format).ok())
}

/// Parse a TIMESTAMP literal, accepting a bare date as midnight
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0)))
}
