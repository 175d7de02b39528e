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

//! Reference executor
//!
//! Evaluates a query block, or a rewritten plan, over in-memory tables:
//!
//! ```text
//! TableData scan (semi-join filtered)
//!   ↓
//! NestedLoopJoin (per join node, ON clause)
//!   ↓
//! filter_rows (WHERE, filter mode)
//!   ↓
//! projection
//! ```
//!
//! It favors obviousness over speed and is the yardstick the rewrites are
//! measured against: a plan must return the same multiset of rows as the
//! query block it came from.

pub mod nested_loop;

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::core::{DataType, Error, EvalMode, Result, Row};
use crate::expression::{filter_rows, Bindings, ColumnRef, Predicate, ProbeThresholds};
use crate::optimizer::{InListSemiJoin, JoinNode};
use crate::rewrite::{QueryBlock, RewrittenPlan};

pub use nested_loop::NestedLoopJoin;

/// Rows of every base table, keyed by lowercase table name
#[derive(Debug, Clone, Default)]
pub struct TableData {
    tables: FxHashMap<String, Vec<Row>>,
}

impl TableData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, rows: Vec<Row>) -> Self {
        self.insert(name, rows);
        self
    }

    pub fn insert(&mut self, name: &str, rows: Vec<Row>) {
        self.tables.insert(name.to_lowercase(), rows);
    }

    pub fn rows(&self, name: &str) -> Result<&[Row]> {
        self.tables
            .get(&name.to_lowercase())
            .map(Vec::as_slice)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }
}

/// Evaluate an unrewritten query block
pub fn execute_block(block: &QueryBlock, data: &TableData, bindings: &Bindings) -> Result<Vec<Row>> {
    run(
        &block.from,
        block.where_clause.as_ref(),
        &block.projection,
        &[],
        data,
        bindings,
    )
}

/// Evaluate a rewritten plan
///
/// Parameters are bound and IN lists re-prepared for this execution; the
/// plan itself is left untouched.
pub fn execute_plan(plan: &RewrittenPlan, data: &TableData, bindings: &Bindings) -> Result<Vec<Row>> {
    let thresholds = plan.probe_thresholds;
    let tree = plan
        .tree
        .try_map_predicates(&|_, on| bind(on, bindings, thresholds))?;
    let where_clause = plan
        .where_clause
        .as_ref()
        .map(|w| bind(w, bindings, thresholds))
        .transpose()?;
    run(
        &tree,
        where_clause.as_ref(),
        &plan.projection,
        &plan.semi_joins,
        data,
        bindings,
    )
}

fn bind(predicate: &Predicate, bindings: &Bindings, thresholds: ProbeThresholds) -> Result<Predicate> {
    if predicate.has_parameters() {
        predicate.bind_parameters(&bindings.params, thresholds)
    } else {
        Ok(predicate.clone())
    }
}

fn run(
    tree: &JoinNode,
    where_clause: Option<&Predicate>,
    projection: &[ColumnRef],
    semi_joins: &[InListSemiJoin],
    data: &TableData,
    bindings: &Bindings,
) -> Result<Vec<Row>> {
    let rows = execute_node(tree, semi_joins, data, bindings)?;
    let positions = positions(tree);
    let rows = match where_clause {
        Some(predicate) => filter_rows(predicate, &positions, rows, bindings, EvalMode::Filter)?,
        None => rows,
    };
    trace!(
        target: "sqlrewrite::executor",
        rows = rows.len(),
        "executor.filtered"
    );
    if projection.is_empty() {
        return Ok(rows);
    }
    let indices = projection
        .iter()
        .map(|c| {
            positions
                .get(c)
                .copied()
                .ok_or(Error::InvalidColumnReference {
                    result_set: c.result_set,
                    column: c.column,
                })
        })
        .collect::<Result<Vec<_>>>()?;
    rows.iter().map(|r| r.select_columns(&indices)).collect()
}

fn execute_node(
    node: &JoinNode,
    semi_joins: &[InListSemiJoin],
    data: &TableData,
    bindings: &Bindings,
) -> Result<Vec<Row>> {
    match node {
        JoinNode::Leaf(table) => {
            let filters: Vec<&InListSemiJoin> = semi_joins
                .iter()
                .filter(|s| s.target.result_set == table.result_set)
                .collect();
            let mut out = Vec::new();
            for row in data.rows(&table.table)? {
                if row.len() != table.width() {
                    return Err(Error::internal(format!(
                        "row of {} has {} columns, expected {}",
                        table.table,
                        row.len(),
                        table.width()
                    )));
                }
                let keep = filters
                    .iter()
                    .all(|s| row.get(s.target.column).is_some_and(|v| s.matches(v)));
                if keep {
                    out.push(row.clone());
                }
            }
            Ok(out)
        }
        JoinNode::Inner(j) | JoinNode::LeftOuter(j) | JoinNode::RightOuter(j) => {
            let left = execute_node(&j.left, semi_joins, data, bindings)?;
            let right = execute_node(&j.right, semi_joins, data, bindings)?;
            let layout = positions(node);
            let kind = node.kind().ok_or_else(|| Error::internal("join without kind"))?;
            let join = NestedLoopJoin::new(
                kind,
                &j.on,
                &layout,
                bindings,
                &output_types(&j.left),
                &output_types(&j.right),
            );
            join.execute(&left, &right)
        }
    }
}

/// Position of every addressable column in the node's output row
fn positions(node: &JoinNode) -> FxHashMap<ColumnRef, usize> {
    let index: FxHashMap<ColumnRef, usize> = node
        .output_columns()
        .into_iter()
        .enumerate()
        .map(|(i, c)| (c, i))
        .collect();
    node.layout()
        .into_iter()
        .filter_map(|(r, leaf)| index.get(&leaf).map(|&i| (r, i)))
        .collect()
}

fn output_types(node: &JoinNode) -> Vec<DataType> {
    node.leaves()
        .iter()
        .flat_map(|t| t.schema.column_types())
        .collect()
}
