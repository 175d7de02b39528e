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

//! BETWEEN evaluation and desugaring
//!
//! `t BETWEEN lo AND hi` is exactly `t >= lo AND t <= hi`. When `lo > hi`
//! nothing matches; that is not an error.

use super::{comparison, Predicate, ScalarExpr};
use crate::core::{CompareOp, Result, TriBool, Value};

/// Evaluate `target BETWEEN low AND high` on values
pub fn evaluate_between(target: &Value, low: &Value, high: &Value) -> Result<TriBool> {
    let lower = comparison::evaluate(CompareOp::Gte, target, low)?;
    if lower.is_false() {
        // Still check the upper bound for type errors
        comparison::evaluate(CompareOp::Lte, target, high)?;
        return Ok(TriBool::False);
    }
    let upper = comparison::evaluate(CompareOp::Lte, target, high)?;
    Ok(lower.and(upper))
}

/// `target >= low AND target <= high`
pub fn desugar_between(target: &ScalarExpr, low: &ScalarExpr, high: &ScalarExpr) -> Predicate {
    Predicate::And(vec![
        Predicate::compare(CompareOp::Gte, target.clone(), low.clone()),
        Predicate::compare(CompareOp::Lte, target.clone(), high.clone()),
    ])
}

/// `target < low OR target > high`
///
/// This is the De Morgan form of `NOT (target BETWEEN low AND high)`. Each
/// operand is carried over unchanged, so column references keep their
/// bindings, including references into enclosing query blocks.
pub fn desugar_not_between(target: &ScalarExpr, low: &ScalarExpr, high: &ScalarExpr) -> Predicate {
    Predicate::Or(vec![
        Predicate::compare(CompareOp::Lt, target.clone(), low.clone()),
        Predicate::compare(CompareOp::Gt, target.clone(), high.clone()),
    ])
}
