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

//! Rewrite driver configuration
//!

use crate::expression::in_list::{DEFAULT_BINARY_SEARCH_THRESHOLD, DEFAULT_HASH_THRESHOLD};
use crate::expression::ProbeThresholds;
use crate::optimizer::DEFAULT_MAX_REWRITE_PASSES;

/// Default minimum number of distinct literals before an IN list becomes a
/// semi-join
pub const DEFAULT_SEMI_JOIN_THRESHOLD: usize = 64;

/// Which rewrites the driver may apply, and their tuning knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteConfig {
    /// Lists with at least this many distinct values use binary search
    /// Default: 16
    pub in_list_binary_search_threshold: usize,

    /// Lists with at least this many distinct values use a hash set
    /// Default: 512
    pub in_list_hash_threshold: usize,

    /// Minimum distinct literals for the semi-join rewrite
    /// Default: 64
    pub semi_join_threshold: usize,

    /// Allow IN list to semi-join
    /// Default: true
    pub enable_semi_join_rewrite: bool,

    /// Allow LEFT OUTER to INNER reduction
    /// Default: true
    pub enable_outer_to_inner: bool,

    /// Allow LEFT OUTER reassociation
    /// Default: true
    pub enable_outer_join_reordering: bool,

    /// Allow De Morgan and operator inversion under NOT
    /// Default: true
    pub enable_not_elimination: bool,

    /// Bound on fixed-point iterations of the reordering rule
    /// Default: 32
    pub max_rewrite_passes: usize,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            in_list_binary_search_threshold: DEFAULT_BINARY_SEARCH_THRESHOLD,
            in_list_hash_threshold: DEFAULT_HASH_THRESHOLD,
            semi_join_threshold: DEFAULT_SEMI_JOIN_THRESHOLD,
            enable_semi_join_rewrite: true,
            enable_outer_to_inner: true,
            enable_outer_join_reordering: true,
            enable_not_elimination: true,
            max_rewrite_passes: DEFAULT_MAX_REWRITE_PASSES,
        }
    }
}

impl RewriteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every optional transformation disabled
    ///
    /// Right-outer elimination, literal cast folding and IN-list pruning
    /// still run; they are part of binding, not optional rewrites.
    pub fn no_rewrites() -> Self {
        Self {
            enable_semi_join_rewrite: false,
            enable_outer_to_inner: false,
            enable_outer_join_reordering: false,
            enable_not_elimination: false,
            ..Self::default()
        }
    }

    /// Everything enabled with low thresholds, so small test inputs reach
    /// every strategy
    pub fn aggressive() -> Self {
        Self {
            in_list_binary_search_threshold: 4,
            in_list_hash_threshold: 8,
            semi_join_threshold: 4,
            ..Self::default()
        }
    }

    pub fn with_in_list_thresholds(mut self, binary_search: usize, hash: usize) -> Self {
        self.in_list_binary_search_threshold = binary_search;
        self.in_list_hash_threshold = hash;
        self
    }

    pub fn with_semi_join_threshold(mut self, threshold: usize) -> Self {
        self.semi_join_threshold = threshold;
        self
    }

    pub fn with_semi_join_rewrite(mut self, enabled: bool) -> Self {
        self.enable_semi_join_rewrite = enabled;
        self
    }

    pub fn with_outer_to_inner(mut self, enabled: bool) -> Self {
        self.enable_outer_to_inner = enabled;
        self
    }

    pub fn with_outer_join_reordering(mut self, enabled: bool) -> Self {
        self.enable_outer_join_reordering = enabled;
        self
    }

    pub fn with_not_elimination(mut self, enabled: bool) -> Self {
        self.enable_not_elimination = enabled;
        self
    }

    pub fn with_max_rewrite_passes(mut self, passes: usize) -> Self {
        self.max_rewrite_passes = passes;
        self
    }

    /// Probe strategy cut-offs for IN-list evaluation
    pub fn probe_thresholds(&self) -> ProbeThresholds {
        ProbeThresholds {
            binary_search: self.in_list_binary_search_threshold,
            hash: self.in_list_hash_threshold,
        }
    }
}
