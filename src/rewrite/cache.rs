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

//! Plan cache for rewritten query blocks
//!
//! Plans are shared as `Arc<RewrittenPlan>` and never mutated after they are
//! cached, so any number of executions may read one concurrently. An entry
//! only hits for the catalog epoch it was compiled against.
//!
//! # Example
//!
//! ```ignore
//! let cache = PlanCache::new(1000);
//! let plan = cache.get_or_insert_with(sql, catalog.epoch(), || {
//!     rewriter.rewrite(&block)
//! })?;
//! ```

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::trace;

use super::RewrittenPlan;
use crate::core::Result;

/// Default maximum number of cached plans
pub const DEFAULT_PLAN_CACHE_SIZE: usize = 1000;

struct CachedPlan {
    plan: Arc<RewrittenPlan>,
    inserted: Instant,
}

/// Statement-text keyed cache of rewritten plans
pub struct PlanCache {
    /// Plans indexed by normalized statement text
    plans: RwLock<FxHashMap<String, CachedPlan>>,
    /// Maximum number of cached plans
    max_size: usize,
    /// Share of entries dropped when the cache is full
    prune_factor: f64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PlanCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            plans: RwLock::new(FxHashMap::default()),
            max_size: max_size.max(1),
            prune_factor: 0.2,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cached plan for `statement` compiled at `epoch`
    ///
    /// A plan from another epoch is treated as absent.
    pub fn get(&self, statement: &str, epoch: u64) -> Option<Arc<RewrittenPlan>> {
        let key = normalize_statement(statement);
        let plans = self.plans.read();
        let found = plans
            .get(key.as_ref())
            .filter(|cached| cached.plan.catalog_epoch == epoch)
            .map(|cached| Arc::clone(&cached.plan));
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Cache a plan under its own catalog epoch, replacing any older entry
    pub fn insert(&self, statement: &str, plan: RewrittenPlan) -> Arc<RewrittenPlan> {
        let plan = Arc::new(plan);
        let key = normalize_statement(statement).into_owned();
        let mut plans = self.plans.write();
        if plans.len() >= self.max_size && !plans.contains_key(&key) {
            self.prune(&mut plans);
        }
        plans.insert(
            key,
            CachedPlan {
                plan: Arc::clone(&plan),
                inserted: Instant::now(),
            },
        );
        plan
    }

    /// Cached plan, or compile one with `compile` and cache it
    ///
    /// A failed compilation is returned as is and nothing is cached. Two
    /// threads missing at once may both compile; the later insert wins.
    pub fn get_or_insert_with<F>(&self, statement: &str, epoch: u64, compile: F) -> Result<Arc<RewrittenPlan>>
    where
        F: FnOnce() -> Result<RewrittenPlan>,
    {
        if let Some(plan) = self.get(statement, epoch) {
            return Ok(plan);
        }
        let plan = compile()?;
        Ok(self.insert(statement, plan))
    }

    /// Drop entries compiled before `epoch`
    pub fn invalidate_before(&self, epoch: u64) {
        let mut plans = self.plans.write();
        let before = plans.len();
        plans.retain(|_, cached| cached.plan.catalog_epoch >= epoch);
        trace!(
            target: "sqlrewrite::rewrite",
            removed = before - plans.len(),
            epoch,
            "plan_cache.invalidated"
        );
    }

    pub fn invalidate_all(&self) {
        self.plans.write().clear();
    }

    pub fn len(&self) -> usize {
        self.plans.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.len(),
            max_size: self.max_size,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Remove the oldest entries when the cache is full
    fn prune(&self, plans: &mut FxHashMap<String, CachedPlan>) {
        let num_to_remove = ((self.max_size as f64) * self.prune_factor).ceil() as usize;
        let num_to_remove = num_to_remove.max(1);

        let mut entries: Vec<(&String, Instant)> =
            plans.iter().map(|(k, p)| (k, p.inserted)).collect();
        entries.sort_unstable_by_key(|&(_, inserted)| inserted);
        let keys_to_remove: Vec<String> = entries
            .into_iter()
            .take(num_to_remove)
            .map(|(k, _)| k.clone())
            .collect();
        for key in keys_to_remove {
            plans.remove(&key);
        }
    }
}

impl Default for PlanCache {
    fn default() -> Self {
        Self::new(DEFAULT_PLAN_CACHE_SIZE)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of cached plans
    pub size: usize,
    /// Maximum cache size
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Trim and collapse runs of whitespace; borrows when already normal
///
/// Whitespace inside quoted literals and quoted identifiers is kept as is,
/// so `'a  b'` and `'a b'` stay distinct statements.
fn normalize_statement(statement: &str) -> Cow<'_, str> {
    let trimmed = statement.trim();
    let mut quote = None;
    let mut prev_ws = false;
    let needs_normalization = trimmed.chars().any(|c| {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            return false;
        }
        if c == '\'' || c == '"' {
            quote = Some(c);
        }
        let is_ws = c.is_whitespace();
        let odd = is_ws && (prev_ws || c != ' ');
        prev_ws = is_ws;
        odd
    });
    if !needs_normalization {
        return Cow::Borrowed(trimmed);
    }

    let mut result = String::with_capacity(trimmed.len());
    let mut quote = None;
    let mut pending_space = false;
    for c in trimmed.chars() {
        match quote {
            Some(q) => {
                result.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c.is_whitespace() => pending_space = true,
            None => {
                if pending_space {
                    result.push(' ');
                    pending_space = false;
                }
                if c == '\'' || c == '"' {
                    quote = Some(c);
                }
                result.push(c);
            }
        }
    }
    Cow::Owned(result)
}
