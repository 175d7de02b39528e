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

//! Predicate simplification passes
//!
//! Two independent passes:
//! - [`eliminate_not`] pushes NOT down to the leaves (De Morgan, operator
//!   inversion, NOT BETWEEN to a disjunction, NOT IN flag flips)
//! - [`fold_constants`] folds literal-only leaves and TRUE/FALSE operands
//!   of AND/OR, and flattens nested connectives
//!
//! Neither pass touches column references. Rebinding happens in a separate
//! remap pass over the finished tree.
//!
//! The simplifier returns `Option<Predicate>` so unchanged subtrees are not
//! cloned.

#![allow(clippy::only_used_in_recursion)]

use crate::core::TriBool;
use crate::expression::between::{desugar_between, desugar_not_between};
use crate::expression::{Bindings, Predicate, RowContext, ScalarExpr};

/// Push every NOT down to the leaves
///
/// All rewrites are exact under three-valued logic. NOT over a bare
/// BOOLEAN expression or a resolved IN probe stays as it is.
pub fn eliminate_not(predicate: &Predicate) -> Predicate {
    push_not(predicate, false)
}

fn push_not(predicate: &Predicate, negate: bool) -> Predicate {
    match predicate {
        Predicate::Not(child) => push_not(child, !negate),
        Predicate::And(children) => {
            let children = children.iter().map(|c| push_not(c, negate)).collect();
            if negate {
                Predicate::Or(children)
            } else {
                Predicate::And(children)
            }
        }
        Predicate::Or(children) => {
            let children = children.iter().map(|c| push_not(c, negate)).collect();
            if negate {
                Predicate::And(children)
            } else {
                Predicate::Or(children)
            }
        }
        _ if !negate => predicate.clone(),
        Predicate::Comparison { op, left, right } => Predicate::Comparison {
            op: op.negate(),
            left: left.clone(),
            right: right.clone(),
        },
        Predicate::Between { target, low, high } => desugar_not_between(target, low, high),
        Predicate::InList {
            target,
            candidates,
            negated,
        } => Predicate::InList {
            target: target.clone(),
            candidates: candidates.clone(),
            negated: !negated,
        },
        Predicate::IsNull { expr, negated } => Predicate::IsNull {
            expr: expr.clone(),
            negated: !negated,
        },
        Predicate::Const(t) => Predicate::Const(!*t),
        Predicate::InProbe { .. } | Predicate::Truth(_) => Predicate::not(predicate.clone()),
    }
}

/// Fold constants and flatten connectives
pub fn fold_constants(predicate: &Predicate) -> Predicate {
    ExpressionSimplifier::new().simplify(predicate)
}

/// Predicate simplifier that folds constants
pub struct ExpressionSimplifier {
    /// Track if any simplifications were made
    simplified: bool,
    /// Expand BETWEEN into a pair of comparisons
    expand_between: bool,
}

impl Default for ExpressionSimplifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionSimplifier {
    pub fn new() -> Self {
        Self {
            simplified: false,
            expand_between: false,
        }
    }

    /// Also replace BETWEEN with `>= AND <=`
    pub fn with_between_expansion(mut self) -> Self {
        self.expand_between = true;
        self
    }

    /// Check if any simplifications were made in the last run
    pub fn was_simplified(&self) -> bool {
        self.simplified
    }

    /// Returns Some(simplified) if changes were made, None if unchanged
    pub fn try_simplify(&mut self, predicate: &Predicate) -> Option<Predicate> {
        self.simplified = false;
        let result = self.simplify_recursive(predicate);
        if self.simplified {
            Some(result.unwrap_or_else(|| predicate.clone()))
        } else {
            None
        }
    }

    pub fn simplify(&mut self, predicate: &Predicate) -> Predicate {
        self.simplified = false;
        self.simplify_recursive(predicate)
            .unwrap_or_else(|| predicate.clone())
    }

    fn simplify_recursive(&mut self, predicate: &Predicate) -> Option<Predicate> {
        match predicate {
            Predicate::And(children) => self.simplify_connective(children, true),
            Predicate::Or(children) => self.simplify_connective(children, false),
            Predicate::Not(child) => self.simplify_not(child),
            Predicate::Between { target, low, high } if self.expand_between => {
                self.simplified = true;
                let expanded = desugar_between(target, low, high);
                Some(self.simplify_recursive(&expanded).unwrap_or(expanded))
            }
            Predicate::Const(_) => None,
            leaf => self.fold_leaf(leaf),
        }
    }

    /// AND (`is_and`) or OR over simplified children
    fn simplify_connective(&mut self, children: &[Predicate], is_and: bool) -> Option<Predicate> {
        // The value that decides the connective and the one it ignores
        let (absorbing, neutral) = if is_and {
            (TriBool::False, TriBool::True)
        } else {
            (TriBool::True, TriBool::False)
        };

        let mut changed = false;
        let mut out: Vec<Predicate> = Vec::with_capacity(children.len());
        let mut pending = Vec::new();
        for child in children {
            let simplified = self.simplify_recursive(child);
            changed |= simplified.is_some();
            pending.push(simplified.unwrap_or_else(|| child.clone()));
        }

        while let Some(child) = pending.pop() {
            match child {
                Predicate::And(nested) if is_and => {
                    changed = true;
                    pending.extend(nested);
                }
                Predicate::Or(nested) if !is_and => {
                    changed = true;
                    pending.extend(nested);
                }
                Predicate::Const(t) if t == absorbing => {
                    self.simplified = true;
                    return Some(Predicate::Const(absorbing));
                }
                Predicate::Const(t) if t == neutral => changed = true,
                other => out.push(other),
            }
        }
        out.reverse();

        // Several UNKNOWN constants collapse into one
        let unknowns = out
            .iter()
            .filter(|p| matches!(p, Predicate::Const(TriBool::Unknown)))
            .count();
        if unknowns > 1 {
            changed = true;
            let mut seen = false;
            out.retain(|p| {
                if matches!(p, Predicate::Const(TriBool::Unknown)) {
                    let keep = !seen;
                    seen = true;
                    keep
                } else {
                    true
                }
            });
        }

        if out.len() != children.len() {
            changed = true;
        }
        if !changed {
            return None;
        }
        self.simplified = true;
        Some(match out.len() {
            0 => Predicate::Const(neutral),
            1 => out.pop().unwrap_or(Predicate::Const(neutral)),
            _ if is_and => Predicate::And(out),
            _ => Predicate::Or(out),
        })
    }

    fn simplify_not(&mut self, child: &Predicate) -> Option<Predicate> {
        let simplified = self.simplify_recursive(child);
        let inner = simplified.as_ref().unwrap_or(child);
        match inner {
            Predicate::Const(t) => {
                self.simplified = true;
                Some(Predicate::Const(!*t))
            }
            // NOT NOT x is x for all three truth values
            Predicate::Not(grandchild) => {
                self.simplified = true;
                Some((**grandchild).clone())
            }
            _ => simplified.map(Predicate::not),
        }
    }

    /// Evaluate a leaf whose operands are all literals
    fn fold_leaf(&mut self, leaf: &Predicate) -> Option<Predicate> {
        let operands = leaf.operands();
        if operands.is_empty() || !operands.iter().all(|e| is_literal(e)) {
            return None;
        }
        let layout = Default::default();
        let row = Default::default();
        let bindings = Bindings::new();
        let ctx = RowContext::new(&layout, &row, &bindings);
        // Errors are left for execution, where they are reported in context
        let value = leaf.evaluate(&ctx).ok()?;
        self.simplified = true;
        Some(Predicate::Const(value))
    }
}

fn is_literal(expr: &ScalarExpr) -> bool {
    matches!(expr, ScalarExpr::Literal(_))
}
