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

// Relational operators under three-valued logic

use crate::core::{CompareOp, Result, TriBool, Value};

/// Evaluate `left <op> right`
///
/// A NULL on either side yields UNKNOWN for every operator. Numerics are
/// compared in their dominant type, so a DOUBLE operand makes the
/// comparison a DOUBLE one. Values from
/// different comparability classes are a `TypeMismatch`; the type checker
/// rejects those before execution, so reaching it here means the caller
/// skipped compilation.
pub fn evaluate(op: CompareOp, left: &Value, right: &Value) -> Result<TriBool> {
    let ordering = left.compare(right)?;
    Ok(TriBool::from_option(ordering.map(|o| op.matches(o))))
}

/// `left = right`
#[inline]
pub fn equals(left: &Value, right: &Value) -> Result<TriBool> {
    evaluate(CompareOp::Eq, left, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;

    const ALL_OPS: [CompareOp; 6] = [
        CompareOp::Eq,
        CompareOp::Ne,
        CompareOp::Lt,
        CompareOp::Lte,
        CompareOp::Gt,
        CompareOp::Gte,
    ];

    #[test]
    fn test_null_is_unknown_for_every_operator() {
        let nulls = [
            Value::null(DataType::Integer),
            Value::null(DataType::Varchar),
            Value::null_unknown(),
        ];
        for op in ALL_OPS {
            for null in &nulls {
                assert_eq!(evaluate(op, null, &Value::integer(1)).unwrap(), TriBool::Unknown);
                assert_eq!(evaluate(op, &Value::integer(1), null).unwrap(), TriBool::Unknown);
                assert_eq!(evaluate(op, null, null).unwrap(), TriBool::Unknown);
            }
        }
    }

    #[test]
    fn test_mixed_numeric_representations() {
        let two = Value::integer(2);
        let two_dec = Value::decimal(200, 2);
        let two_float = Value::float(2.0);
        assert_eq!(equals(&two, &two_dec).unwrap(), TriBool::True);
        assert_eq!(equals(&two_dec, &two_float).unwrap(), TriBool::True);
        assert_eq!(
            evaluate(CompareOp::Lt, &two, &Value::decimal(201, 2)).unwrap(),
            TriBool::True
        );
        // 4.23 is never equal to 4
        assert_eq!(equals(&Value::integer(4), &Value::decimal(423, 2)).unwrap(), TriBool::False);
    }

    #[test]
    fn test_double_against_decimal() {
        let stored = Value::float(0.1);
        let literal = Value::decimal(1, 1);
        assert_eq!(equals(&stored, &literal).unwrap(), TriBool::True);
        assert_eq!(evaluate(CompareOp::Lte, &stored, &literal).unwrap(), TriBool::True);
        assert_eq!(evaluate(CompareOp::Gt, &stored, &literal).unwrap(), TriBool::False);
        assert_eq!(
            equals(&Value::float(0.1 + 0.2), &Value::decimal(3, 1)).unwrap(),
            TriBool::False
        );
    }

    #[test]
    fn test_operator_table() {
        let a = Value::text("apple");
        let b = Value::text("banana");
        let expected = [
            (CompareOp::Eq, TriBool::False),
            (CompareOp::Ne, TriBool::True),
            (CompareOp::Lt, TriBool::True),
            (CompareOp::Lte, TriBool::True),
            (CompareOp::Gt, TriBool::False),
            (CompareOp::Gte, TriBool::False),
        ];
        for (op, result) in expected {
            assert_eq!(evaluate(op, &a, &b).unwrap(), result, "apple {} banana", op);
        }
    }

    #[test]
    fn test_cross_class_is_error() {
        let err = equals(&Value::boolean(true), &Value::integer(1)).unwrap_err();
        assert!(err.is_type_error());
    }
}
