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

//! Syntactic null-intolerance proofs
//!
//! A predicate is null-intolerant on a set of result sets when it cannot
//! evaluate to TRUE for a row in which every column of those result sets is
//! NULL. The proof walks the tree tracking polarity (how many NOTs are
//! above the node), because a construct that rejects NULL inputs may accept
//! them once negated. Anything the rules below do not cover is treated as
//! tolerant.

use rustc_hash::FxHashSet;

use crate::core::TriBool;
use crate::expression::{Predicate, ScalarExpr};

/// Prove that `predicate` is never TRUE when all columns of `result_sets`
/// are NULL
pub fn is_null_intolerant(predicate: &Predicate, result_sets: &FxHashSet<u32>) -> bool {
    intolerant(predicate, result_sets, true)
}

fn intolerant(predicate: &Predicate, sets: &FxHashSet<u32>, positive: bool) -> bool {
    let refs = |e: &ScalarExpr| e.references_any(sets);
    match predicate {
        // A NULL operand makes these UNKNOWN, and NOT UNKNOWN is UNKNOWN
        Predicate::Comparison { left, right, .. } => refs(left) || refs(right),
        Predicate::Truth(expr) => refs(expr),
        Predicate::InProbe { target, .. } => refs(target),

        // `t >= lo AND t <= hi` needs all three; `t < lo OR t > hi` only t
        Predicate::Between { target, low, high } => {
            refs(target) || (positive && (refs(low) || refs(high)))
        }

        Predicate::InList {
            target,
            candidates,
            negated,
        } => {
            // NOT IN is an AND of <>, so a NULL candidate also blocks TRUE
            let acts_as_not_in = *negated == positive;
            refs(target) || (acts_as_not_in && candidates.iter().any(refs))
        }

        Predicate::IsNull { expr, negated } => {
            let acts_as_is_not_null = *negated == positive;
            acts_as_is_not_null && refs(expr)
        }

        Predicate::And(children) => {
            if positive {
                children.iter().any(|c| intolerant(c, sets, positive))
            } else {
                children.iter().all(|c| intolerant(c, sets, positive))
            }
        }
        Predicate::Or(children) => {
            if positive {
                children.iter().all(|c| intolerant(c, sets, positive))
            } else {
                children.iter().any(|c| intolerant(c, sets, positive))
            }
        }
        Predicate::Not(child) => intolerant(child, sets, !positive),
        Predicate::Const(t) => {
            let effective = if positive { *t } else { !*t };
            effective != TriBool::True
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CompareOp;

    fn b() -> FxHashSet<u32> {
        [2].into_iter().collect()
    }

    fn a_col() -> ScalarExpr {
        ScalarExpr::column(1, 0)
    }

    fn b_col() -> ScalarExpr {
        ScalarExpr::column(2, 0)
    }

    #[test]
    fn test_comparisons() {
        assert!(is_null_intolerant(&Predicate::eq(a_col(), b_col()), &b()));
        assert!(is_null_intolerant(
            &Predicate::not(Predicate::compare(CompareOp::Gt, b_col(), ScalarExpr::literal(1))),
            &b()
        ));
        assert!(!is_null_intolerant(&Predicate::eq(a_col(), ScalarExpr::literal(1)), &b()));
    }

    #[test]
    fn test_is_null_polarity() {
        assert!(!is_null_intolerant(&Predicate::is_null(b_col()), &b()));
        assert!(is_null_intolerant(&Predicate::is_not_null(b_col()), &b()));
        assert!(is_null_intolerant(&Predicate::not(Predicate::is_null(b_col())), &b()));
        assert!(!is_null_intolerant(&Predicate::not(Predicate::is_not_null(b_col())), &b()));
    }

    #[test]
    fn test_connectives() {
        let rejects = Predicate::eq(b_col(), ScalarExpr::literal(1));
        let accepts = Predicate::is_null(b_col());
        let unrelated = Predicate::eq(a_col(), ScalarExpr::literal(1));

        assert!(is_null_intolerant(&Predicate::and(vec![unrelated.clone(), rejects.clone()]), &b()));
        assert!(!is_null_intolerant(&Predicate::or(vec![unrelated.clone(), rejects.clone()]), &b()));
        assert!(is_null_intolerant(
            &Predicate::or(vec![rejects.clone(), Predicate::is_not_null(b_col())]),
            &b()
        ));
        // NOT (x AND y) is NOT x OR NOT y
        assert!(!is_null_intolerant(
            &Predicate::not(Predicate::and(vec![rejects.clone(), Predicate::is_not_null(b_col())])),
            &b()
        ));
        assert!(is_null_intolerant(
            &Predicate::not(Predicate::and(vec![rejects.clone(), accepts.clone()])),
            &b()
        ));
        assert!(is_null_intolerant(
            &Predicate::not(Predicate::or(vec![unrelated, accepts])),
            &b()
        ));
    }

    #[test]
    fn test_between_polarity() {
        let bound_on_b = Predicate::between(a_col(), b_col(), ScalarExpr::literal(9));
        assert!(is_null_intolerant(&bound_on_b, &b()));
        // a < NULL OR a > 9 can still be TRUE
        assert!(!is_null_intolerant(&Predicate::not(bound_on_b), &b()));

        let target_on_b = Predicate::not_between(b_col(), ScalarExpr::literal(1), a_col());
        assert!(is_null_intolerant(&target_on_b, &b()));
    }

    #[test]
    fn test_in_list_polarity() {
        let candidate_on_b = Predicate::in_list(a_col(), vec![b_col(), ScalarExpr::literal(1)]);
        assert!(!is_null_intolerant(&candidate_on_b, &b()));

        let not_in = Predicate::not_in_list(a_col(), vec![b_col(), ScalarExpr::literal(1)]);
        assert!(is_null_intolerant(&not_in, &b()));
        assert!(is_null_intolerant(&Predicate::not(candidate_on_b), &b()));

        let target_on_b = Predicate::in_list(b_col(), vec![ScalarExpr::literal(1)]);
        assert!(is_null_intolerant(&target_on_b, &b()));
        assert!(is_null_intolerant(&Predicate::not(target_on_b), &b()));
    }

    #[test]
    fn test_constants() {
        assert!(is_null_intolerant(&Predicate::Const(TriBool::False), &b()));
        assert!(is_null_intolerant(&Predicate::Const(TriBool::Unknown), &b()));
        assert!(!is_null_intolerant(&Predicate::Const(TriBool::True), &b()));
        assert!(is_null_intolerant(
            &Predicate::not(Predicate::Const(TriBool::True)),
            &b()
        ));
    }
}
