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

//! Three-valued logic
//!
//! Every predicate evaluates to a [`TriBool`]. The connectives follow the
//! Kleene tables: FALSE dominates AND, TRUE dominates OR, and UNKNOWN
//! dominates whatever is left.

use std::fmt;
use std::ops::Not;

use super::value::Value;

/// TRUE, FALSE or UNKNOWN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TriBool {
    True,
    False,
    #[default]
    Unknown,
}

impl TriBool {
    pub const ALL: [TriBool; 3] = [TriBool::True, TriBool::False, TriBool::Unknown];

    #[inline]
    pub fn from_bool(b: bool) -> Self {
        if b {
            TriBool::True
        } else {
            TriBool::False
        }
    }

    /// Map `None` (a NULL operand) to UNKNOWN
    #[inline]
    pub fn from_option(b: Option<bool>) -> Self {
        b.map_or(TriBool::Unknown, TriBool::from_bool)
    }

    /// Kleene AND
    #[inline]
    pub fn and(self, other: TriBool) -> TriBool {
        match (self, other) {
            (TriBool::False, _) | (_, TriBool::False) => TriBool::False,
            (TriBool::True, TriBool::True) => TriBool::True,
            _ => TriBool::Unknown,
        }
    }

    /// Kleene OR
    #[inline]
    pub fn or(self, other: TriBool) -> TriBool {
        match (self, other) {
            (TriBool::True, _) | (_, TriBool::True) => TriBool::True,
            (TriBool::False, TriBool::False) => TriBool::False,
            _ => TriBool::Unknown,
        }
    }

    #[inline]
    pub fn is_true(self) -> bool {
        self == TriBool::True
    }

    #[inline]
    pub fn is_false(self) -> bool {
        self == TriBool::False
    }

    #[inline]
    pub fn is_unknown(self) -> bool {
        self == TriBool::Unknown
    }

    /// The SQL BOOLEAN value of this truth value (UNKNOWN is NULL)
    pub fn to_value(self) -> Value {
        match self {
            TriBool::True => Value::Boolean(true),
            TriBool::False => Value::Boolean(false),
            TriBool::Unknown => Value::null(super::types::DataType::Boolean),
        }
    }

    /// Interpret a BOOLEAN value; NULL is UNKNOWN, other types are `None`
    pub fn from_value(value: &Value) -> Option<TriBool> {
        match value {
            Value::Boolean(b) => Some(TriBool::from_bool(*b)),
            Value::Null(_) => Some(TriBool::Unknown),
            _ => None,
        }
    }

    /// AND over any number of operands; the empty conjunction is TRUE
    pub fn all<I: IntoIterator<Item = TriBool>>(iter: I) -> TriBool {
        let mut acc = TriBool::True;
        for t in iter {
            acc = acc.and(t);
            if acc.is_false() {
                break;
            }
        }
        acc
    }

    /// OR over any number of operands; the empty disjunction is FALSE
    pub fn any<I: IntoIterator<Item = TriBool>>(iter: I) -> TriBool {
        let mut acc = TriBool::False;
        for t in iter {
            acc = acc.or(t);
            if acc.is_true() {
                break;
            }
        }
        acc
    }
}

impl Not for TriBool {
    type Output = TriBool;

    #[inline]
    fn not(self) -> TriBool {
        match self {
            TriBool::True => TriBool::False,
            TriBool::False => TriBool::True,
            TriBool::Unknown => TriBool::Unknown,
        }
    }
}

impl From<bool> for TriBool {
    fn from(b: bool) -> Self {
        TriBool::from_bool(b)
    }
}

impl fmt::Display for TriBool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriBool::True => write!(f, "TRUE"),
            TriBool::False => write!(f, "FALSE"),
            TriBool::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// How a predicate result decides whether a row is accepted
///
/// WHERE and ON filters keep a row only when the predicate is TRUE. CHECK
/// constraints reject a row only when the predicate is FALSE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EvalMode {
    #[default]
    Filter,
    Constraint,
}

impl EvalMode {
    #[inline]
    pub fn accepts(self, result: TriBool) -> bool {
        match self {
            EvalMode::Filter => result.is_true(),
            EvalMode::Constraint => !result.is_false(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TriBool::*;

    #[test]
    fn test_and_table() {
        let expected = [
            // (a, b, a AND b)
            (True, True, True),
            (True, False, False),
            (True, Unknown, Unknown),
            (False, True, False),
            (False, False, False),
            (False, Unknown, False),
            (Unknown, True, Unknown),
            (Unknown, False, False),
            (Unknown, Unknown, Unknown),
        ];
        for (a, b, r) in expected {
            assert_eq!(a.and(b), r, "{} AND {}", a, b);
        }
    }

    #[test]
    fn test_or_table() {
        let expected = [
            (True, True, True),
            (True, False, True),
            (True, Unknown, True),
            (False, True, True),
            (False, False, False),
            (False, Unknown, Unknown),
            (Unknown, True, True),
            (Unknown, False, Unknown),
            (Unknown, Unknown, Unknown),
        ];
        for (a, b, r) in expected {
            assert_eq!(a.or(b), r, "{} OR {}", a, b);
        }
    }

    #[test]
    fn test_not() {
        assert_eq!(!True, False);
        assert_eq!(!False, True);
        assert_eq!(!Unknown, Unknown);
    }

    #[test]
    fn test_folds() {
        assert_eq!(TriBool::all([]), True);
        assert_eq!(TriBool::any([]), False);
        assert_eq!(TriBool::all([True, Unknown, True]), Unknown);
        assert_eq!(TriBool::all([Unknown, False]), False);
        assert_eq!(TriBool::any([False, Unknown]), Unknown);
        assert_eq!(TriBool::any([Unknown, True]), True);
    }

    #[test]
    fn test_value_round_trip() {
        for t in TriBool::ALL {
            assert_eq!(TriBool::from_value(&t.to_value()), Some(t));
        }
        assert_eq!(TriBool::from_value(&Value::integer(1)), None);
    }

    #[test]
    fn test_eval_mode() {
        assert!(EvalMode::Filter.accepts(True));
        assert!(!EvalMode::Filter.accepts(Unknown));
        assert!(!EvalMode::Filter.accepts(False));
        assert!(EvalMode::Constraint.accepts(True));
        assert!(EvalMode::Constraint.accepts(Unknown));
        assert!(!EvalMode::Constraint.accepts(False));
    }
}
