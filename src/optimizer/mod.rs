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

//! Semantics-preserving rewrites of a query block
//!
//! Every rewrite here either proves its precondition syntactically or is
//! skipped. None of them change the result of a query for any database
//! state.
//!
//! ## Modules
//!
//! - `join` - Join trees over base tables
//! - `remap` - Column-binding substitution after a join tree changes shape
//! - `null_intolerance` - Proofs that a predicate rejects NULL-extended rows
//! - `outer_join` - Outer-join simplification and reordering
//! - `in_list_rewrite` - IN-list pruning and semi-join extraction
//! - `simplify` - NOT elimination and constant folding

pub mod in_list_rewrite;
pub mod join;
pub mod null_intolerance;
pub mod outer_join;
pub mod remap;
pub mod simplify;

pub use in_list_rewrite::{
    extract_semi_joins, prune_in_list_candidates, InListSemiJoin, SemiJoinExtraction,
};
pub use join::{Join, JoinKind, JoinNode, TableRef};
pub use null_intolerance::is_null_intolerant;
pub use outer_join::{
    eliminate_right_outer, inner_join_groups, layout_changes, reduce_outer_to_inner,
    references_subtree, reorder_left_outer, AppliedRewrite, InnerJoinGroup, OuterJoinRewriter,
    Precondition, RewriteRule, SkipReason, SkippedRewrite, DEFAULT_MAX_REWRITE_PASSES,
};
pub use remap::ColumnRemap;
pub use simplify::{eliminate_not, fold_constants, ExpressionSimplifier};
