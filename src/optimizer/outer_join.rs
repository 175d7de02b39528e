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

#![allow(clippy::only_used_in_recursion)]

//! Outer join simplification and reordering
//!
//! Three result-preserving rules, applied in this order:
//!
//! 1. **RIGHT OUTER elimination**: `A RIGHT JOIN B ON p` becomes
//!    `B LEFT JOIN A ON p`. Column order is restored by the projection, which
//!    addresses base-table columns.
//! 2. **Outer-to-inner reduction**: `A LEFT JOIN B ON p` becomes an inner join
//!    when a filter applied above it is null-intolerant on B. Filters flow
//!    down from WHERE and from the ON clauses of enclosing inner joins, so an
//!    inner join only absorbs an outer join below it when its own predicate
//!    rejects the null-extended rows.
//! 3. **LEFT OUTER reassociation**:
//!    `A LEFT JOIN (B LEFT JOIN C ON p2) ON p1` becomes
//!    `(A LEFT JOIN B ON p1) LEFT JOIN C ON p2` when `p1` references no
//!    column of C and `p2` is null-intolerant on B. Applied bottom-up until
//!    no node changes.
//!
//! A rule whose precondition cannot be proven is skipped and recorded; it
//! never fails the query.

use std::fmt;

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use super::join::{Join, JoinKind, JoinNode};
use super::null_intolerance::is_null_intolerant;
use super::remap::ColumnRemap;
use crate::expression::Predicate;

/// Default bound on reassociation steps per statement
pub const DEFAULT_MAX_REWRITE_PASSES: usize = 32;

/// Rewrite rules that can appear in a plan's log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewriteRule {
    RightOuterElimination,
    OuterToInner,
    LeftOuterReassociation,
    InListPruning,
    InListSemiJoin,
    NotElimination,
}

impl fmt::Display for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RewriteRule::RightOuterElimination => "right_outer_elimination",
            RewriteRule::OuterToInner => "outer_to_inner",
            RewriteRule::LeftOuterReassociation => "left_outer_reassociation",
            RewriteRule::InListPruning => "in_list_pruning",
            RewriteRule::InListSemiJoin => "in_list_semi_join",
            RewriteRule::NotElimination => "not_elimination",
        };
        f.write_str(name)
    }
}

/// Precondition of a reordering that could not be proven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precondition {
    /// The outer ON clause must not reference the inner join's
    /// null-producing side
    OuterPredicateIndependentOfNullProducingSide,
    /// The inner ON clause must be null-intolerant on its row-preserving side
    InnerPredicateNullIntolerant,
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::OuterPredicateIndependentOfNullProducingSide => {
                write!(f, "outer ON clause must not reference the null-producing side")
            }
            Precondition::InnerPredicateNullIntolerant => {
                write!(f, "inner ON clause must reject NULLs from the preserved side")
            }
        }
    }
}

/// Why a candidate rewrite was not applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    ReorderingPreconditionUnprovable(Precondition),
    /// No filter above the outer join is null-intolerant on its
    /// null-producing side
    NullIntoleranceUnprovable,
    /// The target column has no index
    NotIndexed,
    /// The target is on the null-producing side of an outer join
    NullProducingSide,
    PassLimitReached,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ReorderingPreconditionUnprovable(p) => {
                write!(f, "reordering precondition unprovable: {}", p)
            }
            SkipReason::NullIntoleranceUnprovable => write!(f, "null-intolerance unprovable"),
            SkipReason::NotIndexed => write!(f, "target column is not indexed"),
            SkipReason::NullProducingSide => {
                write!(f, "target is on the null-producing side of an outer join")
            }
            SkipReason::PassLimitReached => write!(f, "rewrite pass limit reached"),
        }
    }
}

/// A rewrite that was performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AppliedRewrite {
    pub rule: RewriteRule,
    /// Join node (or, for predicate rules, result set) the rule applied to
    pub result_set: u32,
}

/// A rewrite that was considered and skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SkippedRewrite {
    pub rule: RewriteRule,
    pub result_set: u32,
    pub reason: SkipReason,
}

/// A maximal region of inner joins whose inputs may be freely reordered
///
/// Inputs are base tables or outer-join nodes; a region never extends
/// through an outer join.
#[derive(Debug, Clone, PartialEq)]
pub struct InnerJoinGroup {
    /// Top inner join of the region
    pub result_set: u32,
    pub inputs: Vec<u32>,
    /// Conjuncts of every ON clause in the region
    pub predicates: Vec<Predicate>,
}

/// Applies the outer join rules and records what happened
pub struct OuterJoinRewriter {
    next_result_set: u32,
    max_passes: usize,
    passes: usize,
    applied: Vec<AppliedRewrite>,
    skipped: Vec<SkippedRewrite>,
    remap: ColumnRemap,
}

impl OuterJoinRewriter {
    /// `next_result_set` must exceed every result-set number in use,
    /// including those of enclosing query blocks
    pub fn new(next_result_set: u32, max_passes: usize) -> Self {
        Self {
            next_result_set,
            max_passes,
            passes: 0,
            applied: Vec::new(),
            skipped: Vec::new(),
            remap: ColumnRemap::new(),
        }
    }

    /// Rewriter numbering new joins after the tree's largest result set
    pub fn for_tree(tree: &JoinNode) -> Self {
        Self::new(tree.max_result_set() + 1, DEFAULT_MAX_REWRITE_PASSES)
    }

    pub fn applied(&self) -> &[AppliedRewrite] {
        &self.applied
    }

    pub fn skipped(&self) -> &[SkippedRewrite] {
        &self.skipped
    }

    /// Old join-node bindings whose meaning changed, mapped to base columns
    pub fn remap(&self) -> &ColumnRemap {
        &self.remap
    }

    /// First result-set number not yet handed out
    pub fn next_result_set(&self) -> u32 {
        self.next_result_set
    }

    pub fn into_parts(self) -> (Vec<AppliedRewrite>, Vec<SkippedRewrite>, ColumnRemap) {
        (self.applied, self.skipped, self.remap)
    }

    fn record_applied(&mut self, rule: RewriteRule, result_set: u32) {
        debug!(
            target: "sqlrewrite::optimizer",
            rule = %rule,
            result_set,
            "outer_join.applied"
        );
        self.applied.push(AppliedRewrite { rule, result_set });
    }

    fn record_skipped(&mut self, rule: RewriteRule, result_set: u32, reason: SkipReason) {
        debug!(
            target: "sqlrewrite::optimizer",
            rule = %rule,
            result_set,
            reason = %reason,
            "outer_join.skipped"
        );
        self.skipped.push(SkippedRewrite {
            rule,
            result_set,
            reason,
        });
    }

    fn fresh_result_set(&mut self) -> u32 {
        let rs = self.next_result_set;
        self.next_result_set += 1;
        rs
    }

    /// Fold the binding changes between two versions of a tree into the remap
    fn track_layout(&mut self, before: &JoinNode, after: &JoinNode) {
        let step = layout_changes(before, after);
        if !step.is_empty() {
            trace!(
                target: "sqlrewrite::optimizer",
                entries = step.len(),
                "outer_join.remap_step"
            );
            self.remap = self.remap.compose(&step);
        }
    }

    // =========================================================================
    // RIGHT OUTER elimination
    // =========================================================================

    /// Turn every RIGHT OUTER join into a LEFT OUTER join with swapped inputs
    pub fn eliminate_right_outer(&mut self, tree: &JoinNode) -> JoinNode {
        let out = self.swap_right_outer(tree);
        self.track_layout(tree, &out);
        out
    }

    fn swap_right_outer(&mut self, node: &JoinNode) -> JoinNode {
        match node {
            JoinNode::Leaf(_) => node.clone(),
            JoinNode::RightOuter(j) => {
                let left = self.swap_right_outer(&j.left);
                let right = self.swap_right_outer(&j.right);
                self.record_applied(RewriteRule::RightOuterElimination, j.result_set);
                JoinNode::left_outer(j.result_set, right, left, j.on.clone())
            }
            JoinNode::Inner(j) | JoinNode::LeftOuter(j) => {
                let kind = node.kind().unwrap_or(JoinKind::Inner);
                JoinNode::join(
                    kind,
                    j.result_set,
                    self.swap_right_outer(&j.left),
                    self.swap_right_outer(&j.right),
                    j.on.clone(),
                )
            }
        }
    }

    // =========================================================================
    // Outer-to-inner reduction
    // =========================================================================

    /// Convert outer joins whose null-extended rows a filter would reject
    ///
    /// `filter` is the WHERE clause applied to the tree's output.
    pub fn reduce_outer_to_inner(&mut self, tree: &JoinNode, filter: Option<&Predicate>) -> JoinNode {
        let filters: Vec<&Predicate> = filter.map(|f| f.conjuncts()).unwrap_or_default();
        self.reduce(tree, &filters)
    }

    fn reduce(&mut self, node: &JoinNode, filters: &[&Predicate]) -> JoinNode {
        match node {
            JoinNode::Leaf(_) => node.clone(),
            JoinNode::Inner(j) => {
                let below = with_conjuncts(filters, &j.on);
                JoinNode::inner(
                    j.result_set,
                    self.reduce(&j.left, &below),
                    self.reduce(&j.right, &below),
                    j.on.clone(),
                )
            }
            JoinNode::LeftOuter(j) => self.reduce_outer(j, filters, false),
            JoinNode::RightOuter(j) => self.reduce_outer(j, filters, true),
        }
    }

    fn reduce_outer(&mut self, j: &Join, filters: &[&Predicate], right_outer: bool) -> JoinNode {
        let (preserved, null_producing) = if right_outer {
            (&j.right, &j.left)
        } else {
            (&j.left, &j.right)
        };
        let null_sets = null_producing.leaf_result_sets();

        if filters.iter().any(|f| is_null_intolerant(f, &null_sets)) {
            self.record_applied(RewriteRule::OuterToInner, j.result_set);
            let below = with_conjuncts(filters, &j.on);
            return JoinNode::inner(
                j.result_set,
                self.reduce(&j.left, &below),
                self.reduce(&j.right, &below),
                j.on.clone(),
            );
        }
        if filters.iter().any(|f| f.references_any(&null_sets)) {
            self.record_skipped(
                RewriteRule::OuterToInner,
                j.result_set,
                SkipReason::NullIntoleranceUnprovable,
            );
        }

        // Filters above still see every preserved row; the null-producing
        // input is only restricted by the ON clause
        let preserved = self.reduce(preserved, filters);
        let null_producing = self.reduce(null_producing, &j.on.conjuncts());
        if right_outer {
            JoinNode::right_outer(j.result_set, null_producing, preserved, j.on.clone())
        } else {
            JoinNode::left_outer(j.result_set, preserved, null_producing, j.on.clone())
        }
    }

    // =========================================================================
    // LEFT OUTER reassociation
    // =========================================================================

    /// Reassociate nested LEFT OUTER joins bottom-up until stable
    pub fn reorder_left_outer(&mut self, tree: &JoinNode) -> JoinNode {
        let out = self.reorder(tree);
        self.track_layout(tree, &out);
        trace!(
            target: "sqlrewrite::optimizer",
            passes = self.passes,
            "outer_join.reorder_done"
        );
        out
    }

    fn reorder(&mut self, node: &JoinNode) -> JoinNode {
        match node {
            JoinNode::Leaf(_) => node.clone(),
            JoinNode::Inner(j) | JoinNode::LeftOuter(j) | JoinNode::RightOuter(j) => {
                let kind = node.kind().unwrap_or(JoinKind::Inner);
                let rebuilt = JoinNode::join(
                    kind,
                    j.result_set,
                    self.reorder(&j.left),
                    self.reorder(&j.right),
                    j.on.clone(),
                );
                self.stabilize(rebuilt)
            }
        }
    }

    /// Rotate at `node` while the rule applies; each rotation's new left
    /// input is stabilized in turn
    fn stabilize(&mut self, mut node: JoinNode) -> JoinNode {
        loop {
            match self.try_reassociate(node) {
                Ok(rotated) => node = rotated,
                Err(unchanged) => return unchanged,
            }
        }
    }

    fn try_reassociate(&mut self, node: JoinNode) -> std::result::Result<JoinNode, JoinNode> {
        let JoinNode::LeftOuter(outer) = node else {
            return Err(node);
        };
        let JoinNode::LeftOuter(inner) = &outer.right else {
            return Err(JoinNode::LeftOuter(outer));
        };

        let c_sets = inner.right.leaf_result_sets();
        if outer.on.references_any(&c_sets) {
            self.record_skipped(
                RewriteRule::LeftOuterReassociation,
                outer.result_set,
                SkipReason::ReorderingPreconditionUnprovable(
                    Precondition::OuterPredicateIndependentOfNullProducingSide,
                ),
            );
            return Err(JoinNode::LeftOuter(outer));
        }
        let b_sets = inner.left.leaf_result_sets();
        if !is_null_intolerant(&inner.on, &b_sets) {
            self.record_skipped(
                RewriteRule::LeftOuterReassociation,
                outer.result_set,
                SkipReason::ReorderingPreconditionUnprovable(
                    Precondition::InnerPredicateNullIntolerant,
                ),
            );
            return Err(JoinNode::LeftOuter(outer));
        }
        if self.passes >= self.max_passes {
            self.record_skipped(
                RewriteRule::LeftOuterReassociation,
                outer.result_set,
                SkipReason::PassLimitReached,
            );
            return Err(JoinNode::LeftOuter(outer));
        }
        self.passes += 1;

        let Join {
            result_set: top,
            left: a,
            right,
            on: p1,
        } = *outer;
        let JoinNode::LeftOuter(inner) = right else {
            // Checked above
            return Err(JoinNode::left_outer(top, a, right, p1));
        };
        let Join {
            left: b,
            right: c,
            on: p2,
            ..
        } = *inner;

        let fresh = self.fresh_result_set();
        self.record_applied(RewriteRule::LeftOuterReassociation, top);
        let new_left = self.stabilize(JoinNode::left_outer(fresh, a, b, p1));
        Ok(JoinNode::left_outer(top, new_left, c, p2))
    }
}

fn with_conjuncts<'a>(filters: &[&'a Predicate], on: &'a Predicate) -> Vec<&'a Predicate> {
    let mut out = filters.to_vec();
    out.extend(on.conjuncts());
    out
}

/// Old bindings of `before` that mean something else (or nothing) in `after`
pub fn layout_changes(before: &JoinNode, after: &JoinNode) -> ColumnRemap {
    let after_layout = after.layout();
    before
        .layout()
        .into_iter()
        .filter(|(r, leaf)| after_layout.get(r) != Some(leaf))
        .collect()
}

/// Turn every RIGHT OUTER join into a LEFT OUTER join
pub fn eliminate_right_outer(tree: &JoinNode) -> JoinNode {
    OuterJoinRewriter::for_tree(tree).eliminate_right_outer(tree)
}

/// Convert outer joins whose null-extended rows `filter` rejects
pub fn reduce_outer_to_inner(tree: &JoinNode, filter: Option<&Predicate>) -> JoinNode {
    OuterJoinRewriter::for_tree(tree).reduce_outer_to_inner(tree, filter)
}

/// Reassociate nested LEFT OUTER joins until stable
pub fn reorder_left_outer(tree: &JoinNode) -> JoinNode {
    OuterJoinRewriter::for_tree(tree).reorder_left_outer(tree)
}

/// Maximal inner-join regions, outermost first
pub fn inner_join_groups(tree: &JoinNode) -> Vec<InnerJoinGroup> {
    let mut groups = Vec::new();
    collect_groups(tree, &mut groups);
    groups
}

fn collect_groups(node: &JoinNode, groups: &mut Vec<InnerJoinGroup>) {
    match node {
        JoinNode::Leaf(_) => {}
        JoinNode::Inner(j) => {
            let mut group = InnerJoinGroup {
                result_set: j.result_set,
                inputs: Vec::new(),
                predicates: Vec::new(),
            };
            let mut boundaries = Vec::new();
            flatten_inner(node, &mut group, &mut boundaries);
            groups.push(group);
            for boundary in boundaries {
                collect_groups(boundary, groups);
            }
        }
        JoinNode::LeftOuter(j) | JoinNode::RightOuter(j) => {
            collect_groups(&j.left, groups);
            collect_groups(&j.right, groups);
        }
    }
}

fn flatten_inner<'a>(
    node: &'a JoinNode,
    group: &mut InnerJoinGroup,
    boundaries: &mut Vec<&'a JoinNode>,
) {
    match node {
        JoinNode::Inner(j) => {
            flatten_inner(&j.left, group, boundaries);
            flatten_inner(&j.right, group, boundaries);
            group
                .predicates
                .extend(j.on.conjuncts().into_iter().cloned());
        }
        other => {
            group.inputs.push(other.result_set());
            boundaries.push(other);
        }
    }
}

/// Whether a predicate references any base table inside `node`
pub fn references_subtree(predicate: &Predicate, node: &JoinNode) -> bool {
    let sets: FxHashSet<u32> = node.leaf_result_sets();
    predicate.references_any(&sets)
}
