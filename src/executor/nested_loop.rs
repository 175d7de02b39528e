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

//! Nested Loop Join
//!
//! Classic O(N*M) join over materialized inputs. Every join kind and every
//! ON predicate is supported; the right input is scanned once per left row.
//! RIGHT OUTER tracks which right rows matched and emits the rest padded
//! with NULLs after the loop.

use rustc_hash::FxHashMap;

use crate::core::{DataType, EvalMode, Result, Row};
use crate::expression::{Bindings, ColumnRef, Predicate, RowContext};
use crate::optimizer::JoinKind;

/// Join two materialized inputs
///
/// `layout` maps every column the ON clause may reference to its position
/// in the combined (left then right) row. `left_types` and `right_types`
/// give the NULL extension for the outer kinds.
pub struct NestedLoopJoin<'a> {
    kind: JoinKind,
    on: &'a Predicate,
    layout: &'a FxHashMap<ColumnRef, usize>,
    bindings: &'a Bindings,
    null_left: Row,
    null_right: Row,
}

impl<'a> NestedLoopJoin<'a> {
    pub fn new(
        kind: JoinKind,
        on: &'a Predicate,
        layout: &'a FxHashMap<ColumnRef, usize>,
        bindings: &'a Bindings,
        left_types: &[DataType],
        right_types: &[DataType],
    ) -> Self {
        Self {
            kind,
            on,
            layout,
            bindings,
            null_left: Row::null_row(left_types),
            null_right: Row::null_row(right_types),
        }
    }

    /// Whether the ON clause accepts a combined row; UNKNOWN rejects
    fn matches(&self, combined: &Row) -> Result<bool> {
        let ctx = RowContext::new(self.layout, combined, self.bindings);
        self.on.accepts(&ctx, EvalMode::Filter)
    }

    pub fn execute(&self, left: &[Row], right: &[Row]) -> Result<Vec<Row>> {
        let mut out = Vec::new();
        let mut right_matched = vec![false; right.len()];

        for left_row in left {
            let mut left_had_match = false;
            for (right_idx, right_row) in right.iter().enumerate() {
                let combined = Row::from_combined(left_row, right_row);
                if self.matches(&combined)? {
                    left_had_match = true;
                    right_matched[right_idx] = true;
                    out.push(combined);
                }
            }
            if self.kind == JoinKind::LeftOuter && !left_had_match {
                out.push(Row::from_combined(left_row, &self.null_right));
            }
        }

        if self.kind == JoinKind::RightOuter {
            for (right_row, matched) in right.iter().zip(right_matched) {
                if !matched {
                    out.push(Row::from_combined(&self.null_left, right_row));
                }
            }
        }
        Ok(out)
    }
}
