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

//! # sqlrewrite - predicate semantics and outer-join rewrites for SQL
//!
//! The compile-time and run-time core of a relational query processor:
//! three-valued predicate evaluation, type coercion and comparability,
//! BETWEEN and IN-list evaluation, and semantics-preserving rewrites of
//! join trees.
//!
//! ## Key Features
//!
//! - **Three-valued logic** - TRUE, FALSE and UNKNOWN with filter and
//!   constraint acceptance
//! - **Comparability classes** - compile-time type checks with SQLSTATEs and
//!   the offending sub-tree
//! - **IN-list probes** - linear, binary-search and hash strategies with
//!   NULL-aware results
//! - **Outer-join rewrites** - RIGHT OUTER elimination, outer-to-inner
//!   reduction and LEFT OUTER reassociation, each skipped unless provably safe
//! - **Semi-joins** - large literal IN lists on indexed columns
//! - **Plan cache** - immutable plans shared across threads
//!
//! ## Quick Start
//!
//! ```rust
//! use sqlrewrite::catalog::{CatalogSnapshot, SchemaBuilder};
//! use sqlrewrite::expression::{Predicate, ScalarExpr};
//! use sqlrewrite::optimizer::{JoinKind, JoinNode, TableRef};
//! use sqlrewrite::rewrite::{QueryBlock, QueryRewriter, RewriteConfig};
//! use sqlrewrite::DataType;
//!
//! let catalog = CatalogSnapshot::new(1)
//!     .with_table(SchemaBuilder::new("a").add("id", DataType::Integer).build())
//!     .with_table(SchemaBuilder::new("b").add_nullable("id", DataType::Integer).build());
//!
//! // SELECT * FROM a LEFT JOIN b ON a.id = b.id WHERE b.id = 1
//! let from = JoinNode::left_outer(
//!     3,
//!     JoinNode::leaf(TableRef::bind(1, "a", &catalog).unwrap()),
//!     JoinNode::leaf(TableRef::bind(2, "b", &catalog).unwrap()),
//!     Predicate::eq(ScalarExpr::column(1, 0), ScalarExpr::column(2, 0)),
//! );
//! let block = QueryBlock::new(from)
//!     .with_where(Predicate::eq(ScalarExpr::column(2, 0), ScalarExpr::literal(1)));
//!
//! let plan = QueryRewriter::new(&catalog, RewriteConfig::default())
//!     .rewrite(&block)
//!     .unwrap();
//! assert_eq!(plan.tree.kind(), Some(JoinKind::Inner));
//! ```

pub mod catalog;
pub mod coercion;
pub mod core;
pub mod executor;
pub mod expression;
pub mod optimizer;
pub mod rewrite;

pub use core::{
    Clause, CompareOp, DataType, Error, EvalMode, Location, Result, Row, SqlState, TriBool, Value,
};

pub use catalog::{Catalog, CatalogSnapshot, Schema, SchemaBuilder, SchemaColumn};

pub use expression::{
    filter_rows, Bindings, ColumnRef, EvalContext, InListProbe, Predicate, ProbeStrategy,
    ProbeThresholds, ScalarExpr,
};

pub use optimizer::{
    ColumnRemap, InListSemiJoin, JoinKind, JoinNode, OuterJoinRewriter, RewriteRule, SkipReason,
    TableRef,
};

pub use executor::{execute_block, execute_plan, TableData};

pub use rewrite::{PlanCache, QueryBlock, QueryRewriter, RewriteConfig, RewrittenPlan};
