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

//! IN-list membership
//!
//! `t IN (c1, ..., cn)` means `t = c1 OR ... OR t = cn`, and
//! `t NOT IN (...)` means `t <> c1 AND ... AND t <> cn`. The naive expansion
//! lives in [`evaluate_in_list_naive`]; [`InListProbe`] produces the same
//! answer from a deduplicated, sorted candidate set using one of three
//! lookup strategies chosen by list size.

use std::fmt;

use rustc_hash::FxHashSet;

use super::comparison;
use super::logical::{and_all, or_any};
use crate::coercion::{check_comparable, dominant_type};
use crate::core::{CompareOp, DataType, Result, TriBool, Value};

/// Default number of distinct candidates at which binary search is used
pub const DEFAULT_BINARY_SEARCH_THRESHOLD: usize = 16;

/// Default number of distinct candidates at which a hash set is used
pub const DEFAULT_HASH_THRESHOLD: usize = 512;

/// List sizes at which the probe switches strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeThresholds {
    pub binary_search: usize,
    pub hash: usize,
}

impl Default for ProbeThresholds {
    fn default() -> Self {
        Self {
            binary_search: DEFAULT_BINARY_SEARCH_THRESHOLD,
            hash: DEFAULT_HASH_THRESHOLD,
        }
    }
}

impl ProbeThresholds {
    /// Pick the strategy for a list of `distinct` non-NULL values
    pub fn strategy_for(&self, distinct: usize) -> ProbeStrategy {
        if distinct >= self.hash {
            ProbeStrategy::Hash
        } else if distinct >= self.binary_search {
            ProbeStrategy::BinarySearch
        } else {
            ProbeStrategy::Linear
        }
    }
}

/// How an [`InListProbe`] looks up the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeStrategy {
    Linear,
    BinarySearch,
    Hash,
}

impl fmt::Display for ProbeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStrategy::Linear => write!(f, "linear"),
            ProbeStrategy::BinarySearch => write!(f, "binary search"),
            ProbeStrategy::Hash => write!(f, "hash"),
        }
    }
}

/// Distinct candidates in ascending order, plus a hash set when probed by hash
#[derive(Debug, Clone)]
struct CandidateSet {
    values: Vec<Value>,
    set: Option<FxHashSet<Value>>,
}

impl CandidateSet {
    fn new(mut values: Vec<Value>, strategy: ProbeStrategy) -> Self {
        // Numerically equal candidates of different representations collapse
        values.sort();
        values.dedup();
        let set = match strategy {
            ProbeStrategy::Hash => Some(values.iter().cloned().collect()),
            _ => None,
        };
        Self { values, set }
    }

    fn contains(&self, strategy: ProbeStrategy, target: &Value) -> bool {
        match strategy {
            ProbeStrategy::Linear => self.values.iter().any(|v| v == target),
            ProbeStrategy::BinarySearch => self.values.binary_search(target).is_ok(),
            ProbeStrategy::Hash => self.set.as_ref().is_some_and(|set| set.contains(target)),
        }
    }
}

/// Resolved candidate set of an IN list
///
/// Built once per execution from literal and bound parameter values, then
/// shared read-only by every row probe. Numeric candidates are also kept
/// converted to DOUBLE, the form they are compared in whenever the target
/// or the list is REAL/DOUBLE.
#[derive(Debug, Clone)]
pub struct InListProbe {
    /// Distinct non-NULL candidates
    exact: CandidateSet,
    /// The same candidates as doubles; populated for numeric lists
    approximate: Option<CandidateSet>,
    has_null: bool,
    negated: bool,
    list_type: DataType,
    strategy: ProbeStrategy,
}

impl InListProbe {
    /// Build a probe, picking the strategy from `thresholds`
    ///
    /// Fails with `TypeMismatch` if the candidates mix comparability classes.
    pub fn build(candidates: &[Value], negated: bool, thresholds: ProbeThresholds) -> Result<Self> {
        let (values, has_null, list_type) = Self::normalize(candidates)?;
        let strategy = thresholds.strategy_for(values.len());
        Ok(Self::assemble(values, has_null, negated, list_type, strategy))
    }

    /// Build a probe with a fixed strategy regardless of list size
    pub fn with_strategy(
        candidates: &[Value],
        negated: bool,
        strategy: ProbeStrategy,
    ) -> Result<Self> {
        let (values, has_null, list_type) = Self::normalize(candidates)?;
        Ok(Self::assemble(values, has_null, negated, list_type, strategy))
    }

    fn normalize(candidates: &[Value]) -> Result<(Vec<Value>, bool, DataType)> {
        let types: Vec<DataType> = candidates.iter().map(Value::data_type).collect();
        let list_type = dominant_type(&types)?;

        let has_null = candidates.iter().any(Value::is_null);
        let mut values: Vec<Value> = candidates
            .iter()
            .filter(|v| !v.is_null())
            .cloned()
            .collect();
        values.sort();
        values.dedup();
        Ok((values, has_null, list_type))
    }

    fn assemble(
        values: Vec<Value>,
        has_null: bool,
        negated: bool,
        list_type: DataType,
        strategy: ProbeStrategy,
    ) -> Self {
        let approximate = list_type.is_numeric().then(|| {
            CandidateSet::new(values.iter().map(Value::to_approximate).collect(), strategy)
        });
        Self {
            exact: CandidateSet::new(values, strategy),
            approximate,
            has_null,
            negated,
            list_type,
            strategy,
        }
    }

    /// Evaluate the IN (or NOT IN) predicate for one target value
    pub fn probe(&self, target: &Value) -> Result<TriBool> {
        check_comparable(target.data_type(), self.list_type)?;
        if target.is_null() {
            return Ok(TriBool::Unknown);
        }
        let found = self.contains(target);
        let result = if found {
            TriBool::True
        } else if self.has_null {
            TriBool::Unknown
        } else {
            TriBool::False
        };
        Ok(if self.negated { !result } else { result })
    }

    /// Membership of a non-NULL value among the non-NULL candidates
    ///
    /// Compared in the dominant type of the target and the list.
    pub fn contains(&self, target: &Value) -> bool {
        match &self.approximate {
            Some(approximate)
                if target.data_type().is_approximate() || self.list_type.is_approximate() =>
            {
                approximate.contains(self.strategy, &target.to_approximate())
            }
            _ => self.exact.contains(self.strategy, target),
        }
    }

    pub fn strategy(&self) -> ProbeStrategy {
        self.strategy
    }

    /// Number of distinct non-NULL candidates
    pub fn len(&self) -> usize {
        self.exact.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.values.is_empty() && !self.has_null
    }

    pub fn values(&self) -> &[Value] {
        &self.exact.values
    }

    pub fn has_null(&self) -> bool {
        self.has_null
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Dominant type of the candidates
    pub fn list_type(&self) -> DataType {
        self.list_type
    }
}

impl PartialEq for InListProbe {
    fn eq(&self, other: &Self) -> bool {
        self.exact.values == other.exact.values
            && self.has_null == other.has_null
            && self.negated == other.negated
            && self.strategy == other.strategy
    }
}

impl fmt::Display for InListProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}IN <{}: {} values{}>",
            if self.negated { "NOT " } else { "" },
            self.strategy,
            self.len(),
            if self.has_null { " + NULL" } else { "" }
        )
    }
}

/// Expand an IN list into OR of `=` (or AND of `<>`) and evaluate it
///
/// Every comparison is carried out in the dominant type of the target and
/// all candidates, so a DOUBLE anywhere in the list makes each numeric
/// comparison a DOUBLE one.
pub fn evaluate_in_list_naive(target: &Value, candidates: &[Value], negated: bool) -> Result<TriBool> {
    let approximate = target.data_type().is_approximate()
        || candidates.iter().any(|c| c.data_type().is_approximate());
    if approximate {
        let target = target.to_approximate();
        let candidates: Vec<Value> = candidates.iter().map(Value::to_approximate).collect();
        expand(&target, &candidates, negated)
    } else {
        expand(target, candidates, negated)
    }
}

fn expand(target: &Value, candidates: &[Value], negated: bool) -> Result<TriBool> {
    if negated {
        and_all(
            candidates
                .iter()
                .map(|c| comparison::evaluate(CompareOp::Ne, target, c)),
        )
    } else {
        or_any(candidates.iter().map(|c| comparison::equals(target, c)))
    }
}
