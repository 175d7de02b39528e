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

//! Query rewrite driver
//!
//! [`QueryRewriter`] turns a bound [`QueryBlock`] into an immutable
//! [`RewrittenPlan`]:
//!
//! 1. Bind: every reference through a join node is rewritten to the base
//!    table column it denotes, ON clauses are scope-checked, literal casts
//!    are folded and every predicate is type-checked.
//! 2. Simplify: impossible IN candidates are pruned, NOTs are pushed to the
//!    leaves and constants are folded.
//! 3. Restructure joins: RIGHT OUTER elimination, outer-to-inner reduction,
//!    LEFT OUTER reassociation and inner-join grouping.
//! 4. IN lists: large literal lists on indexed columns become semi-joins and
//!    the remaining constant lists are compiled into probes.
//!
//! Any compile-time error fails the whole rewrite and no plan is produced.
//! A rewrite whose precondition cannot be proven is skipped and recorded in
//! the plan; it never fails the query.

pub mod cache;
pub mod config;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::catalog::Catalog;
use crate::core::{Clause, DataType, Error, Location, Result, TriBool};
use crate::expression::typecheck::fold_literal_casts;
use crate::expression::{
    check_predicate, ColumnRef, Predicate, ProbeThresholds, ScalarExpr, TypeEnv,
};
use crate::optimizer::{
    eliminate_not, extract_semi_joins, fold_constants, inner_join_groups, prune_in_list_candidates,
    AppliedRewrite, ColumnRemap, InListSemiJoin, InnerJoinGroup, JoinNode, OuterJoinRewriter,
    RewriteRule, SkippedRewrite,
};

pub use cache::{CacheStats, PlanCache, DEFAULT_PLAN_CACHE_SIZE};
pub use config::{RewriteConfig, DEFAULT_SEMI_JOIN_THRESHOLD};

/// A bound SELECT block: join tree, filter and output columns
///
/// Column references may go through join nodes or base tables of `from`, or
/// name a column of an enclosing block listed in `outer_columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBlock {
    pub from: JoinNode,
    pub where_clause: Option<Predicate>,
    /// Output columns; empty means every column of `from`
    pub projection: Vec<ColumnRef>,
    /// Correlated columns of enclosing blocks and their types
    pub outer_columns: FxHashMap<ColumnRef, DataType>,
    /// Column type of each scalar subquery
    pub subquery_types: FxHashMap<usize, DataType>,
}

impl QueryBlock {
    pub fn new(from: JoinNode) -> Self {
        Self {
            from,
            where_clause: None,
            projection: Vec::new(),
            outer_columns: FxHashMap::default(),
            subquery_types: FxHashMap::default(),
        }
    }

    pub fn with_where(mut self, predicate: Predicate) -> Self {
        self.where_clause = Some(predicate);
        self
    }

    pub fn with_projection(mut self, columns: Vec<ColumnRef>) -> Self {
        self.projection = columns;
        self
    }

    pub fn with_outer_column(mut self, column: ColumnRef, data_type: DataType) -> Self {
        self.outer_columns.insert(column, data_type);
        self
    }

    pub fn with_subquery_type(mut self, id: usize, data_type: DataType) -> Self {
        self.subquery_types.insert(id, data_type);
        self
    }
}

/// Result of rewriting a query block; never mutated once built
#[derive(Debug, Clone, PartialEq)]
pub struct RewrittenPlan {
    pub tree: JoinNode,
    pub where_clause: Option<Predicate>,
    /// Output columns, bound to base tables
    pub projection: Vec<ColumnRef>,
    /// Old bindings of the input block mapped to what they mean now
    pub remap: ColumnRemap,
    /// Semi-joins applied to base-table scans
    pub semi_joins: Vec<InListSemiJoin>,
    pub inner_join_groups: Vec<InnerJoinGroup>,
    pub applied: Vec<AppliedRewrite>,
    pub skipped: Vec<SkippedRewrite>,
    /// IN-list strategy cut-offs used when parameters are bound
    pub probe_thresholds: ProbeThresholds,
    /// Catalog epoch the plan was compiled against
    pub catalog_epoch: u64,
}

impl RewrittenPlan {
    pub fn was_applied(&self, rule: RewriteRule) -> bool {
        self.applied.iter().any(|a| a.rule == rule)
    }

    pub fn was_skipped(&self, rule: RewriteRule) -> bool {
        self.skipped.iter().any(|s| s.rule == rule)
    }

    /// The plan as a query block, for rewriting it again
    ///
    /// Semi-joins go back into the WHERE clause as IN lists.
    pub fn to_query_block(&self) -> QueryBlock {
        let mut conjuncts: Vec<Predicate> = self
            .semi_joins
            .iter()
            .map(|s| {
                let candidates = s.values.iter().cloned().map(ScalarExpr::Literal).collect();
                Predicate::in_list(ScalarExpr::Column(s.target), candidates)
            })
            .collect();
        conjuncts.extend(self.where_clause.iter().cloned());
        QueryBlock {
            from: self.tree.clone(),
            where_clause: (!conjuncts.is_empty()).then(|| Predicate::conjoin(conjuncts)),
            projection: self.projection.clone(),
            outer_columns: FxHashMap::default(),
            subquery_types: FxHashMap::default(),
        }
    }
}

/// Column and subquery types of a block
struct BlockEnv {
    columns: FxHashMap<ColumnRef, DataType>,
    subqueries: FxHashMap<usize, DataType>,
}

impl TypeEnv for BlockEnv {
    fn column_type(&self, column: ColumnRef) -> Result<DataType> {
        self.columns.column_type(column)
    }

    fn subquery_type(&self, id: usize) -> DataType {
        self.subqueries.get(&id).copied().unwrap_or(DataType::Null)
    }
}

/// Rewrites query blocks against one catalog
pub struct QueryRewriter<'a> {
    catalog: &'a dyn Catalog,
    config: RewriteConfig,
}

impl<'a> QueryRewriter<'a> {
    pub fn new(catalog: &'a dyn Catalog, config: RewriteConfig) -> Self {
        Self { catalog, config }
    }

    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    /// Rewrite a query block
    ///
    /// Fails on the first compile-time error; otherwise every enabled
    /// rewrite has either been applied or recorded as skipped.
    pub fn rewrite(&self, block: &QueryBlock) -> Result<RewrittenPlan> {
        let config = &self.config;
        let catalog_epoch = self.catalog.epoch();
        self.validate(block)?;

        // ---- Bind -------------------------------------------------------
        let layout = block.from.layout();
        let normalization: ColumnRemap = layout.iter().map(|(&r, &leaf)| (r, leaf)).collect();
        let env = BlockEnv {
            columns: block
                .from
                .column_types()
                .into_iter()
                .chain(block.outer_columns.iter().map(|(&c, &t)| (c, t)))
                .collect(),
            subqueries: block.subquery_types.clone(),
        };

        let mut applied = Vec::new();
        let root = block.from.result_set();

        let tree = block.from.try_map_predicates(&|rs, on| {
            let location = Location::new(Clause::On(rs));
            let on = normalization.apply_predicate(on);
            self.check_on_scope(&block.from, rs, &on, block)
                .map_err(|e| e.at(location.clone()))?;
            self.bind_predicate(&on, &env, &location)
        })?;
        let where_clause = block
            .where_clause
            .as_ref()
            .map(|w| {
                let location = Location::new(Clause::Where);
                self.bind_predicate(&normalization.apply_predicate(w), &env, &location)
            })
            .transpose()?;
        let projection = self.bind_projection(block, &normalization, &env)?;

        // ---- Simplify ---------------------------------------------------
        let mut pruned_in = Vec::new();
        let mut negated = Vec::new();
        for (rs, on) in tree.on_clauses() {
            if prune_in_list_candidates(on, &env)?.1 > 0 {
                pruned_in.push(rs);
            }
            if has_not(on) {
                negated.push(rs);
            }
        }
        if let Some(w) = &where_clause {
            if prune_in_list_candidates(w, &env)?.1 > 0 {
                pruned_in.push(root);
            }
            if has_not(w) {
                negated.push(root);
            }
        }
        let tree = tree.try_map_predicates(&|_, on| {
            let (on, _) = prune_in_list_candidates(on, &env)?;
            Ok(self.simplify(on))
        })?;
        let where_clause = match where_clause {
            Some(w) => match self.simplify(prune_in_list_candidates(&w, &env)?.0) {
                Predicate::Const(TriBool::True) => None,
                w => Some(w),
            },
            None => None,
        };
        for result_set in pruned_in {
            trace!(target: "sqlrewrite::rewrite", result_set, "in_list.pruned");
            applied.push(AppliedRewrite {
                rule: RewriteRule::InListPruning,
                result_set,
            });
        }
        if config.enable_not_elimination {
            applied.extend(negated.into_iter().map(|result_set| AppliedRewrite {
                rule: RewriteRule::NotElimination,
                result_set,
            }));
        }

        // ---- Restructure joins ------------------------------------------
        let next_rs = block
            .outer_columns
            .keys()
            .map(|c| c.result_set)
            .chain(std::iter::once(tree.max_result_set()))
            .max()
            .unwrap_or(0)
            + 1;
        let mut rewriter = OuterJoinRewriter::new(next_rs, config.max_rewrite_passes);
        let mut tree = rewriter.eliminate_right_outer(&tree);
        if config.enable_outer_to_inner {
            tree = rewriter.reduce_outer_to_inner(&tree, where_clause.as_ref());
        }
        if config.enable_outer_join_reordering {
            tree = rewriter.reorder_left_outer(&tree);
        }
        let groups = inner_join_groups(&tree);
        let mut next_rs = rewriter.next_result_set();
        let (outer_applied, mut skipped, outer_remap) = rewriter.into_parts();
        applied.extend(outer_applied);

        // ---- IN lists ---------------------------------------------------
        let mut semi_joins = Vec::new();
        let mut where_clause = where_clause;
        if config.enable_semi_join_rewrite {
            if let Some(w) = &where_clause {
                let extraction = extract_semi_joins(
                    w,
                    &tree,
                    self.catalog,
                    config.semi_join_threshold,
                    &mut next_rs,
                );
                applied.extend(extraction.semi_joins.iter().map(|s| AppliedRewrite {
                    rule: RewriteRule::InListSemiJoin,
                    result_set: s.result_set,
                }));
                skipped.extend(extraction.skipped);
                semi_joins = extraction.semi_joins;
                where_clause = extraction.remaining;
            }
        }
        let thresholds = config.probe_thresholds();
        let tree = tree.try_map_predicates(&|_, on| on.prepare_in_lists(thresholds))?;
        let where_clause = where_clause
            .map(|w| w.prepare_in_lists(thresholds))
            .transpose()?;

        let plan = RewrittenPlan {
            tree,
            where_clause,
            projection,
            remap: normalization.compose(&outer_remap),
            semi_joins,
            inner_join_groups: groups,
            applied,
            skipped,
            probe_thresholds: thresholds,
            catalog_epoch,
        };
        debug!(
            target: "sqlrewrite::rewrite",
            applied = plan.applied.len(),
            skipped = plan.skipped.len(),
            semi_joins = plan.semi_joins.len(),
            epoch = catalog_epoch,
            "rewrite.complete"
        );
        trace!(target: "sqlrewrite::rewrite", tree = %plan.tree, "rewrite.tree");
        Ok(plan)
    }

    /// Structural checks that do not depend on predicate contents
    fn validate(&self, block: &QueryBlock) -> Result<()> {
        let mut seen = FxHashSet::default();
        for rs in block.from.result_sets() {
            if !seen.insert(rs) {
                return Err(Error::internal(format!("result set #{} is bound twice", rs)));
            }
        }
        if let Some(c) = block.outer_columns.keys().find(|c| seen.contains(&c.result_set)) {
            return Err(Error::internal(format!(
                "outer column {} collides with a result set of this block",
                c
            )));
        }
        for leaf in block.from.leaves() {
            self.catalog.require_table(&leaf.table)?;
        }
        Ok(())
    }

    /// Each ON clause may only see the tables it joins and outer columns
    fn check_on_scope(
        &self,
        from: &JoinNode,
        result_set: u32,
        on: &Predicate,
        block: &QueryBlock,
    ) -> Result<()> {
        let mut visible = FxHashSet::default();
        from.visit(&mut |node| {
            if node.result_set() == result_set {
                visible = node.leaf_result_sets();
            }
        });
        for column in on.referenced_columns() {
            if !visible.contains(&column.result_set) && !block.outer_columns.contains_key(&column) {
                return Err(Error::InvalidColumnReference {
                    result_set: column.result_set,
                    column: column.column,
                });
            }
        }
        Ok(())
    }

    fn bind_predicate(&self, predicate: &Predicate, env: &BlockEnv, location: &Location) -> Result<Predicate> {
        let folded = fold_literal_casts(predicate, location)?;
        check_predicate(&folded, env, location)?;
        Ok(folded)
    }

    fn bind_projection(
        &self,
        block: &QueryBlock,
        normalization: &ColumnRemap,
        env: &BlockEnv,
    ) -> Result<Vec<ColumnRef>> {
        if block.projection.is_empty() {
            return Ok(block.from.output_columns());
        }
        let location = Location::new(Clause::Projection);
        block
            .projection
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let bound = normalization.apply_column(c);
                if block.outer_columns.contains_key(&bound) {
                    // Outer values are not part of this block's rows
                    return Err(Error::InvalidColumnReference {
                        result_set: c.result_set,
                        column: c.column,
                    }
                    .at(location.child(i)));
                }
                env.column_type(bound).map_err(|e| e.at(location.child(i)))?;
                Ok(bound)
            })
            .collect()
    }

    fn simplify(&self, predicate: Predicate) -> Predicate {
        let predicate = if self.config.enable_not_elimination {
            eliminate_not(&predicate)
        } else {
            predicate
        };
        fold_constants(&predicate)
    }
}

fn has_not(predicate: &Predicate) -> bool {
    let mut found = false;
    predicate.visit(&mut |p| found |= matches!(p, Predicate::Not(_)));
    found
}
