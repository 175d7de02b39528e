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

//! Explicit CAST rules
//!
//! [`check_cast`] decides at compile time whether `CAST(x AS T)` is legal
//! for the static type of `x`. [`cast_literal`] folds a cast of a constant
//! and reports bad string content as a compile-time error, while
//! [`cast_value`] converts values read at execution time and reports the
//! same bad content as a runtime error.
//!
//! BOOLEAN only converts to and from character strings, and only the
//! strings `true`, `false` and `unknown` (any case, surrounding blanks
//! ignored) are accepted. `unknown` casts to NULL.

use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::core::{
    parse_date, parse_time, parse_timestamp, DataType, Error, Result, TriBool, Value,
};

/// Check that `CAST(<from> AS <to>)` is legal
pub fn check_cast(from: DataType, to: DataType) -> Result<()> {
    if from == DataType::Null || from == to {
        return Ok(());
    }
    let allowed = match to {
        DataType::Boolean => from.is_string(),
        _ if to.is_numeric() => from.is_numeric() || from.is_string(),
        _ if to.is_string() => {
            from.is_numeric() || from.is_string() || from.is_temporal() || from == DataType::Boolean
        }
        _ if to.is_binary() => from.is_binary(),
        DataType::Date | DataType::Time => {
            from.is_string() || from == DataType::Timestamp || from == to
        }
        DataType::Timestamp => from.is_string() || from == DataType::Date,
        _ => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(Error::invalid_cast(from, to))
    }
}

/// Parse the string form of a boolean
///
/// Returns `None` for anything other than `true`, `false` or `unknown`.
pub fn parse_boolean_literal(s: &str) -> Option<TriBool> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(TriBool::True)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(TriBool::False)
    } else if trimmed.eq_ignore_ascii_case("unknown") {
        Some(TriBool::Unknown)
    } else {
        None
    }
}

/// Canonical string form of a boolean; UNKNOWN becomes a NULL string
pub fn boolean_to_string(value: TriBool) -> Value {
    match value {
        TriBool::True => Value::text("true"),
        TriBool::False => Value::text("false"),
        TriBool::Unknown => Value::null(DataType::Varchar),
    }
}

/// Fold `CAST(<literal> AS <to>)` at compile time
///
/// Malformed string content is a compile-time `InvalidCastLiteral`.
pub fn cast_literal(value: &Value, to: DataType) -> Result<Value> {
    check_cast(value.data_type(), to)?;
    convert(value, to).map_err(|err| match err {
        Error::MalformedStringLiteral { value, target } => Error::InvalidCastLiteral {
            literal: value,
            to: target,
        },
        other => other,
    })
}

/// Convert a value read at execution time
///
/// Malformed string content is a runtime `MalformedStringLiteral`; the
/// statement fails rather than skipping the row.
pub fn cast_value(value: &Value, to: DataType) -> Result<Value> {
    check_cast(value.data_type(), to)?;
    convert(value, to)
}

fn convert(value: &Value, to: DataType) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::null(to));
    }
    match to {
        DataType::Boolean => to_boolean(value),
        DataType::SmallInt | DataType::Integer | DataType::BigInt => to_integer(value, to),
        DataType::Decimal => to_decimal(value),
        DataType::Real | DataType::Double => to_float(value, to),
        DataType::Char | DataType::Varchar | DataType::LongVarchar | DataType::Clob => {
            Ok(to_text(value))
        }
        DataType::Binary | DataType::VarBinary => match value {
            Value::Binary(_) => Ok(value.clone()),
            _ => Err(Error::invalid_cast(value.data_type(), to)),
        },
        DataType::Date => match value {
            Value::Date(_) => Ok(value.clone()),
            Value::Timestamp(ts) => Ok(Value::Date(ts.date())),
            Value::Text(s) => parse_date(s)
                .map(Value::Date)
                .ok_or_else(|| Error::malformed_string(s.as_ref(), to)),
            _ => Err(Error::invalid_cast(value.data_type(), to)),
        },
        DataType::Time => match value {
            Value::Time(_) => Ok(value.clone()),
            Value::Timestamp(ts) => Ok(Value::Time(ts.time())),
            Value::Text(s) => parse_time(s)
                .map(Value::Time)
                .ok_or_else(|| Error::malformed_string(s.as_ref(), to)),
            _ => Err(Error::invalid_cast(value.data_type(), to)),
        },
        DataType::Timestamp => match value {
            Value::Timestamp(_) => Ok(value.clone()),
            Value::Date(d) => d
                .and_hms_opt(0, 0, 0)
                .map(Value::Timestamp)
                .ok_or_else(|| Error::invalid_cast(DataType::Date, to)),
            Value::Text(s) => parse_timestamp(s)
                .map(Value::Timestamp)
                .ok_or_else(|| Error::malformed_string(s.as_ref(), to)),
            _ => Err(Error::invalid_cast(value.data_type(), to)),
        },
        DataType::Null => Ok(Value::null(DataType::Null)),
    }
}

fn to_boolean(value: &Value) -> Result<Value> {
    match value {
        Value::Boolean(_) => Ok(value.clone()),
        Value::Text(s) => parse_boolean_literal(s)
            .map(TriBool::to_value)
            .ok_or_else(|| Error::malformed_string(s.as_ref(), DataType::Boolean)),
        _ => Err(Error::invalid_cast(value.data_type(), DataType::Boolean)),
    }
}

fn to_integer(value: &Value, to: DataType) -> Result<Value> {
    let wide = match value {
        Value::Integer(v) => *v,
        // CAST truncates toward zero
        Value::Decimal(d) => d.trunc().to_i64().ok_or_else(|| Error::out_of_range(d, to))?,
        Value::Float(f) => {
            let t = f.trunc();
            if !t.is_finite() || t < i64::MIN as f64 || t >= i64::MAX as f64 {
                return Err(Error::out_of_range(f, to));
            }
            t as i64
        }
        Value::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::malformed_string(s.as_ref(), to))?,
        _ => return Err(Error::invalid_cast(value.data_type(), to)),
    };
    let fits = match to {
        DataType::SmallInt => i16::try_from(wide).is_ok(),
        DataType::Integer => i32::try_from(wide).is_ok(),
        _ => true,
    };
    if fits {
        Ok(Value::Integer(wide))
    } else {
        Err(Error::out_of_range(wide, to))
    }
}

fn to_decimal(value: &Value) -> Result<Value> {
    let d = match value {
        Value::Integer(v) => Decimal::from(*v),
        Value::Decimal(d) => *d,
        Value::Float(f) => {
            Decimal::from_f64(*f).ok_or_else(|| Error::out_of_range(f, DataType::Decimal))?
        }
        Value::Text(s) => Decimal::from_str(s.trim())
            .or_else(|_| Decimal::from_scientific(s.trim()))
            .map_err(|_| Error::malformed_string(s.as_ref(), DataType::Decimal))?,
        _ => return Err(Error::invalid_cast(value.data_type(), DataType::Decimal)),
    };
    Ok(Value::Decimal(d))
}

fn to_float(value: &Value, to: DataType) -> Result<Value> {
    let f = match value {
        Value::Integer(v) => *v as f64,
        Value::Decimal(d) => d.to_f64().ok_or_else(|| Error::out_of_range(d, to))?,
        Value::Float(f) => *f,
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::malformed_string(s.as_ref(), to))?,
        _ => return Err(Error::invalid_cast(value.data_type(), to)),
    };
    if to == DataType::Real {
        Ok(Value::Float(f as f32 as f64))
    } else {
        Ok(Value::Float(f))
    }
}

fn to_text(value: &Value) -> Value {
    match value {
        Value::Text(_) => value.clone(),
        other => Value::text(other.to_string()),
    }
}
