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

//! IN-list rewrites
//!
//! - Candidate pruning: a literal the target's type cannot hold exactly
//!   (`4.23` against an INTEGER column) can never match and is dropped.
//! - Semi-join extraction: a large literal IN list on an indexed base-table
//!   column becomes a semi-join against a derived relation of its distinct
//!   values, applied to that table's scan.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::join::JoinNode;
use super::outer_join::{RewriteRule, SkipReason, SkippedRewrite};
use crate::catalog::Catalog;
use crate::core::{DataType, Result, TriBool, Value};
use crate::expression::{type_of, ColumnRef, Predicate, ScalarExpr, TypeEnv};

/// Drop positive IN-list literals the target type cannot represent
///
/// Returns the new predicate and the number of candidates removed. A list
/// that loses every candidate folds to FALSE, but only where FALSE and
/// UNKNOWN are interchangeable: outside any NOT, in a filter context. NOT IN
/// lists are left alone.
pub fn prune_in_list_candidates(
    predicate: &Predicate,
    env: &dyn TypeEnv,
) -> Result<(Predicate, usize)> {
    let mut pruned = 0;
    let out = prune(predicate, env, true, &mut pruned)?;
    Ok((out, pruned))
}

fn prune(
    predicate: &Predicate,
    env: &dyn TypeEnv,
    positive: bool,
    pruned: &mut usize,
) -> Result<Predicate> {
    match predicate {
        Predicate::And(children) => Ok(Predicate::And(
            children
                .iter()
                .map(|c| prune(c, env, positive, pruned))
                .collect::<Result<_>>()?,
        )),
        Predicate::Or(children) => Ok(Predicate::Or(
            children
                .iter()
                .map(|c| prune(c, env, positive, pruned))
                .collect::<Result<_>>()?,
        )),
        Predicate::Not(child) => Ok(Predicate::not(prune(child, env, !positive, pruned)?)),
        Predicate::InList {
            target,
            candidates,
            negated: false,
        } => {
            let target_type = type_of(target, env)?;
            if target_type == DataType::Null {
                return Ok(predicate.clone());
            }
            let kept: Vec<ScalarExpr> = candidates
                .iter()
                .filter(|c| match c {
                    ScalarExpr::Literal(v) => v.is_representable_as(target_type),
                    _ => true,
                })
                .cloned()
                .collect();
            let removed = candidates.len() - kept.len();
            if removed == 0 {
                return Ok(predicate.clone());
            }
            if kept.is_empty() {
                if !positive {
                    // An empty list would turn UNKNOWN into TRUE under NOT
                    return Ok(predicate.clone());
                }
                *pruned += removed;
                return Ok(Predicate::Const(TriBool::False));
            }
            *pruned += removed;
            Ok(Predicate::in_list(target.clone(), kept))
        }
        other => Ok(other.clone()),
    }
}

/// Semi-join of a base table against a derived relation of distinct values
#[derive(Debug, Clone, PartialEq)]
pub struct InListSemiJoin {
    /// Result-set number of the derived single-column relation
    pub result_set: u32,
    /// Base-table column being filtered
    pub target: ColumnRef,
    /// Distinct non-NULL values in ascending order, converted to DOUBLE
    /// when the target column or any value is REAL/DOUBLE
    pub values: Arc<[Value]>,
}

impl InListSemiJoin {
    /// Whether a row with `value` in the target column survives
    pub fn matches(&self, value: &Value) -> bool {
        if value.is_null() {
            return false;
        }
        let approximate = self.values.first().is_some_and(Value::is_approximate);
        if approximate {
            self.values.binary_search(&value.to_approximate()).is_ok()
        } else {
            self.values.binary_search(value).is_ok()
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for InListSemiJoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} SEMI JOIN <{} distinct values>#{}",
            self.target,
            self.values.len(),
            self.result_set
        )
    }
}

/// Outcome of [`extract_semi_joins`]
#[derive(Debug, Clone, Default)]
pub struct SemiJoinExtraction {
    /// WHERE conjuncts left after extraction; None if nothing remains
    pub remaining: Option<Predicate>,
    pub semi_joins: Vec<InListSemiJoin>,
    pub skipped: Vec<SkippedRewrite>,
}

/// Turn qualifying WHERE conjuncts `col IN (literals...)` into semi-joins
///
/// A conjunct qualifies when it is a positive IN list over a base-table
/// column of `tree`, every candidate is a literal, it has at least
/// `threshold` distinct non-NULL values, the column is indexed and the
/// table is not on the null-producing side of an outer join. Each
/// qualifying conjunct becomes its own semi-join; `next_result_set` numbers
/// the derived relations.
pub fn extract_semi_joins(
    where_clause: &Predicate,
    tree: &JoinNode,
    catalog: &dyn Catalog,
    threshold: usize,
    next_result_set: &mut u32,
) -> SemiJoinExtraction {
    let null_producing = tree.null_producing_result_sets();
    let mut out = SemiJoinExtraction::default();
    let mut remaining = Vec::new();

    for conjunct in where_clause.conjuncts() {
        let Some((target, values)) = semi_join_candidate(conjunct, tree, threshold) else {
            remaining.push(conjunct.clone());
            continue;
        };
        let Some(table) = tree.find_leaf(target.result_set) else {
            remaining.push(conjunct.clone());
            continue;
        };
        let skip = if null_producing.contains(&target.result_set) {
            Some(SkipReason::NullProducingSide)
        } else if !catalog.has_index(&table.table, target.column) {
            Some(SkipReason::NotIndexed)
        } else {
            None
        };
        if let Some(reason) = skip {
            debug!(
                target: "sqlrewrite::optimizer",
                column = %target,
                reason = %reason,
                "in_list.semi_join_skipped"
            );
            out.skipped.push(SkippedRewrite {
                rule: RewriteRule::InListSemiJoin,
                result_set: target.result_set,
                reason,
            });
            remaining.push(conjunct.clone());
            continue;
        }

        let semi_join = InListSemiJoin {
            result_set: *next_result_set,
            target,
            values: values.into(),
        };
        *next_result_set += 1;
        debug!(
            target: "sqlrewrite::optimizer",
            column = %target,
            values = semi_join.len(),
            result_set = semi_join.result_set,
            "in_list.semi_join"
        );
        out.semi_joins.push(semi_join);
    }

    out.remaining = if remaining.is_empty() {
        None
    } else {
        Some(Predicate::conjoin(remaining))
    };
    out
}

/// Target column and distinct values of a literal IN list over a base table
fn semi_join_candidate(
    conjunct: &Predicate,
    tree: &JoinNode,
    threshold: usize,
) -> Option<(ColumnRef, Vec<Value>)> {
    let Predicate::InList {
        target: ScalarExpr::Column(target),
        candidates,
        negated: false,
    } = conjunct
    else {
        return None;
    };
    let table = tree.find_leaf(target.result_set)?;
    let target_type = table.schema.get_column(target.column)?.data_type;
    let mut values = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let value = candidate.as_literal()?;
        // NULL never matches; dropping it only turns UNKNOWN into FALSE
        if !value.is_null() {
            values.push(value.clone());
        }
    }
    if target_type.is_approximate() || values.iter().any(Value::is_approximate) {
        values = values.iter().map(Value::to_approximate).collect();
    }
    values.sort();
    values.dedup();
    (values.len() >= threshold).then_some((*target, values))
}
