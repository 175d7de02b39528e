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

//! Join trees
//!
//! A [`JoinNode`] is a tree of base tables joined by INNER, LEFT OUTER and
//! RIGHT OUTER joins. Every node, base table or join, carries a result-set
//! number, and a [`ColumnRef`] may address columns of either kind:
//!
//! ```text
//!              #5 LEFT JOIN            #5.0 = #1.0
//!             /            \           #5.1 = #2.0
//!       #1 users      #4 INNER JOIN    #5.2 = #3.0
//!                     /          \
//!               #2 orders    #3 items
//! ```
//!
//! A join node's columns are its left input's columns followed by its right
//! input's. [`JoinNode::layout`] resolves every join-node reference to the
//! base-table column it stands for; rewrites work on base-table references
//! only, since those survive any reshaping of the tree.

use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::catalog::{Catalog, Schema};
use crate::core::{DataType, Error, Result};
use crate::expression::{ColumnRef, Predicate};

/// A base table bound to a result-set number
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub result_set: u32,
    pub table: String,
    pub schema: Arc<Schema>,
}

impl TableRef {
    pub fn new(result_set: u32, schema: Arc<Schema>) -> Self {
        Self {
            result_set,
            table: schema.table_name.clone(),
            schema,
        }
    }

    /// Resolve `name` against the catalog
    pub fn bind(result_set: u32, name: &str, catalog: &dyn Catalog) -> Result<Self> {
        Ok(Self::new(result_set, catalog.require_table(name)?))
    }

    pub fn width(&self) -> usize {
        self.schema.column_count()
    }

    pub fn column(&self, index: usize) -> ColumnRef {
        ColumnRef::new(self.result_set, index)
    }

    /// Resolve a column by name (case-insensitive)
    pub fn column_named(&self, name: &str) -> Result<ColumnRef> {
        self.schema
            .get_column_index(name)
            .map(|index| self.column(index))
            .ok_or_else(|| Error::ColumnNotFound(format!("{}.{}", self.table, name)))
    }
}

/// Kind of a join node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    LeftOuter,
    RightOuter,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKind::Inner => write!(f, "INNER JOIN"),
            JoinKind::LeftOuter => write!(f, "LEFT JOIN"),
            JoinKind::RightOuter => write!(f, "RIGHT JOIN"),
        }
    }
}

/// Two inputs joined on a predicate
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub result_set: u32,
    pub left: JoinNode,
    pub right: JoinNode,
    pub on: Predicate,
}

/// Join tree; each node owns its children
#[derive(Debug, Clone, PartialEq)]
pub enum JoinNode {
    Leaf(TableRef),
    Inner(Box<Join>),
    LeftOuter(Box<Join>),
    RightOuter(Box<Join>),
}

impl JoinNode {
    // =========================================================================
    // Construction
    // =========================================================================

    pub fn leaf(table: TableRef) -> Self {
        JoinNode::Leaf(table)
    }

    pub fn join(
        kind: JoinKind,
        result_set: u32,
        left: JoinNode,
        right: JoinNode,
        on: Predicate,
    ) -> Self {
        let join = Box::new(Join {
            result_set,
            left,
            right,
            on,
        });
        match kind {
            JoinKind::Inner => JoinNode::Inner(join),
            JoinKind::LeftOuter => JoinNode::LeftOuter(join),
            JoinKind::RightOuter => JoinNode::RightOuter(join),
        }
    }

    pub fn inner(result_set: u32, left: JoinNode, right: JoinNode, on: Predicate) -> Self {
        Self::join(JoinKind::Inner, result_set, left, right, on)
    }

    pub fn left_outer(result_set: u32, left: JoinNode, right: JoinNode, on: Predicate) -> Self {
        Self::join(JoinKind::LeftOuter, result_set, left, right, on)
    }

    pub fn right_outer(result_set: u32, left: JoinNode, right: JoinNode, on: Predicate) -> Self {
        Self::join(JoinKind::RightOuter, result_set, left, right, on)
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn result_set(&self) -> u32 {
        match self {
            JoinNode::Leaf(t) => t.result_set,
            JoinNode::Inner(j) | JoinNode::LeftOuter(j) | JoinNode::RightOuter(j) => j.result_set,
        }
    }

    /// None for a base table
    pub fn kind(&self) -> Option<JoinKind> {
        match self {
            JoinNode::Leaf(_) => None,
            JoinNode::Inner(_) => Some(JoinKind::Inner),
            JoinNode::LeftOuter(_) => Some(JoinKind::LeftOuter),
            JoinNode::RightOuter(_) => Some(JoinKind::RightOuter),
        }
    }

    pub fn as_join(&self) -> Option<&Join> {
        match self {
            JoinNode::Leaf(_) => None,
            JoinNode::Inner(j) | JoinNode::LeftOuter(j) | JoinNode::RightOuter(j) => Some(j),
        }
    }

    /// Base tables in output column order
    pub fn leaves(&self) -> Vec<&TableRef> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a TableRef>) {
        match self {
            JoinNode::Leaf(t) => out.push(t),
            JoinNode::Inner(j) | JoinNode::LeftOuter(j) | JoinNode::RightOuter(j) => {
                j.left.collect_leaves(out);
                j.right.collect_leaves(out);
            }
        }
    }

    pub fn leaf_result_sets(&self) -> FxHashSet<u32> {
        self.leaves().iter().map(|t| t.result_set).collect()
    }

    /// Find the base table with the given result-set number
    pub fn find_leaf(&self, result_set: u32) -> Option<&TableRef> {
        self.leaves().into_iter().find(|t| t.result_set == result_set)
    }

    /// Number of output columns
    pub fn width(&self) -> usize {
        self.leaves().iter().map(|t| t.width()).sum()
    }

    /// Base-table references of the output columns, in order
    pub fn output_columns(&self) -> Vec<ColumnRef> {
        self.leaves()
            .iter()
            .flat_map(|t| (0..t.width()).map(move |i| t.column(i)))
            .collect()
    }

    /// Number of nodes in the tree
    pub fn size(&self) -> usize {
        match self {
            JoinNode::Leaf(_) => 1,
            JoinNode::Inner(j) | JoinNode::LeftOuter(j) | JoinNode::RightOuter(j) => {
                1 + j.left.size() + j.right.size()
            }
        }
    }

    /// Result-set numbers of every node, base tables and joins
    pub fn result_sets(&self) -> Vec<u32> {
        let mut out = Vec::new();
        self.visit(&mut |node| out.push(node.result_set()));
        out
    }

    pub fn max_result_set(&self) -> u32 {
        self.result_sets().into_iter().max().unwrap_or(0)
    }

    /// Pre-order walk over every node
    pub fn visit<F: FnMut(&JoinNode)>(&self, f: &mut F) {
        f(self);
        if let Some(j) = self.as_join() {
            j.left.visit(f);
            j.right.visit(f);
        }
    }

    /// Resolve every addressable column to its base-table column
    ///
    /// Base-table references map to themselves; `(join node, i)` maps to the
    /// base-table column at output position `i` of that join.
    pub fn layout(&self) -> FxHashMap<ColumnRef, ColumnRef> {
        let mut out = FxHashMap::default();
        self.collect_layout(&mut out);
        out
    }

    fn collect_layout(&self, out: &mut FxHashMap<ColumnRef, ColumnRef>) {
        match self {
            JoinNode::Leaf(t) => {
                for i in 0..t.width() {
                    out.insert(t.column(i), t.column(i));
                }
            }
            JoinNode::Inner(j) | JoinNode::LeftOuter(j) | JoinNode::RightOuter(j) => {
                for (i, leaf_ref) in self.output_columns().into_iter().enumerate() {
                    out.insert(ColumnRef::new(j.result_set, i), leaf_ref);
                }
                j.left.collect_layout(out);
                j.right.collect_layout(out);
            }
        }
    }

    /// Type of every addressable column
    pub fn column_types(&self) -> FxHashMap<ColumnRef, DataType> {
        let leaf_types: FxHashMap<ColumnRef, DataType> = self
            .leaves()
            .iter()
            .flat_map(|t| {
                t.schema
                    .columns
                    .iter()
                    .enumerate()
                    .map(move |(i, c)| (t.column(i), c.data_type))
            })
            .collect();
        self.layout()
            .into_iter()
            .filter_map(|(r, leaf)| leaf_types.get(&leaf).map(|&t| (r, t)))
            .collect()
    }

    /// Result sets on the null-producing side of some outer join
    pub fn null_producing_result_sets(&self) -> FxHashSet<u32> {
        let mut out = FxHashSet::default();
        self.visit(&mut |node| match node {
            JoinNode::LeftOuter(j) => out.extend(j.right.leaf_result_sets()),
            JoinNode::RightOuter(j) => out.extend(j.left.leaf_result_sets()),
            _ => {}
        });
        out
    }

    // =========================================================================
    // Reconstruction
    // =========================================================================

    /// Rebuild with every ON clause passed through `f`
    pub fn map_predicates<F: Fn(&Predicate) -> Predicate>(&self, f: &F) -> JoinNode {
        match self {
            JoinNode::Leaf(t) => JoinNode::Leaf(t.clone()),
            JoinNode::Inner(j) | JoinNode::LeftOuter(j) | JoinNode::RightOuter(j) => {
                let kind = self.kind().unwrap_or(JoinKind::Inner);
                JoinNode::join(
                    kind,
                    j.result_set,
                    j.left.map_predicates(f),
                    j.right.map_predicates(f),
                    f(&j.on),
                )
            }
        }
    }

    /// Fallible [`JoinNode::map_predicates`]; `f` also receives the join's
    /// result-set number
    pub fn try_map_predicates<F>(&self, f: &F) -> Result<JoinNode>
    where
        F: Fn(u32, &Predicate) -> Result<Predicate>,
    {
        match self {
            JoinNode::Leaf(t) => Ok(JoinNode::Leaf(t.clone())),
            JoinNode::Inner(j) | JoinNode::LeftOuter(j) | JoinNode::RightOuter(j) => {
                let kind = self.kind().unwrap_or(JoinKind::Inner);
                Ok(JoinNode::join(
                    kind,
                    j.result_set,
                    j.left.try_map_predicates(f)?,
                    j.right.try_map_predicates(f)?,
                    f(j.result_set, &j.on)?,
                ))
            }
        }
    }

    /// ON clauses with their join's result-set number, pre-order
    pub fn on_clauses(&self) -> Vec<(u32, &Predicate)> {
        let mut out = Vec::new();
        self.collect_on_clauses(&mut out);
        out
    }

    fn collect_on_clauses<'a>(&'a self, out: &mut Vec<(u32, &'a Predicate)>) {
        if let Some(j) = self.as_join() {
            out.push((j.result_set, &j.on));
            j.left.collect_on_clauses(out);
            j.right.collect_on_clauses(out);
        }
    }
}

impl fmt::Display for JoinNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinNode::Leaf(t) => write!(f, "{}#{}", t.table, t.result_set),
            JoinNode::Inner(j) | JoinNode::LeftOuter(j) | JoinNode::RightOuter(j) => {
                let kind = self.kind().unwrap_or(JoinKind::Inner);
                write!(
                    f,
                    "({} {} {} ON {})#{}",
                    j.left, kind, j.right, j.on, j.result_set
                )
            }
        }
    }
}
