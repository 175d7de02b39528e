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

// Column-reference remapping

use std::fmt;

use rustc_hash::FxHashMap;

use crate::expression::{ColumnRef, Predicate, ScalarExpr};

/// Mapping from old (result set, column) bindings to new ones
///
/// References without an entry are unchanged. Applying a remap always
/// builds a new tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRemap {
    map: FxHashMap<ColumnRef, ColumnRef>,
}

impl ColumnRemap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `from` is now `to`; identity entries are dropped
    pub fn insert(&mut self, from: ColumnRef, to: ColumnRef) {
        if from != to {
            self.map.insert(from, to);
        }
    }

    pub fn get(&self, from: ColumnRef) -> Option<ColumnRef> {
        self.map.get(&from).copied()
    }

    pub fn apply_column(&self, column: ColumnRef) -> ColumnRef {
        self.get(column).unwrap_or(column)
    }

    pub fn apply_columns(&self, columns: &[ColumnRef]) -> Vec<ColumnRef> {
        columns.iter().map(|&c| self.apply_column(c)).collect()
    }

    pub fn apply_scalar(&self, expr: &ScalarExpr) -> ScalarExpr {
        if self.is_empty() {
            return expr.clone();
        }
        expr.map_columns(&|c| self.apply_column(c))
    }

    pub fn apply_predicate(&self, predicate: &Predicate) -> Predicate {
        if self.is_empty() {
            return predicate.clone();
        }
        predicate.map_columns(&|c| self.apply_column(c))
    }

    /// A remap equivalent to applying `self` and then `then`
    pub fn compose(&self, then: &ColumnRemap) -> ColumnRemap {
        let mut out = ColumnRemap::new();
        for (&from, &to) in &self.map {
            out.insert(from, then.apply_column(to));
        }
        for (&from, &to) in &then.map {
            if !self.map.contains_key(&from) {
                out.insert(from, to);
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Entries in ascending order of the old binding
    pub fn entries(&self) -> Vec<(ColumnRef, ColumnRef)> {
        let mut entries: Vec<_> = self.map.iter().map(|(&k, &v)| (k, v)).collect();
        entries.sort();
        entries
    }
}

impl FromIterator<(ColumnRef, ColumnRef)> for ColumnRemap {
    fn from_iter<I: IntoIterator<Item = (ColumnRef, ColumnRef)>>(iter: I) -> Self {
        let mut remap = ColumnRemap::new();
        for (from, to) in iter {
            remap.insert(from, to);
        }
        remap
    }
}

impl fmt::Display for ColumnRemap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (from, to)) in self.entries().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} -> {}", from, to)?;
        }
        write!(f, "}}")
    }
}
