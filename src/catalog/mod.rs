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

//! Read-only catalog access
//!
//! The compiler never reaches a global schema registry. Each compilation is
//! handed a [`Catalog`], normally a [`CatalogSnapshot`] taken when the
//! statement started, and only reads from it.

pub mod schema;

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::core::{Error, Result};

pub use schema::{Schema, SchemaBuilder, SchemaColumn};

/// Table metadata lookups used during compilation
///
/// Implementations must be side-effect free; they may be called from
/// several compilations at once.
pub trait Catalog: Send + Sync {
    /// Look up a table by name (case-insensitive)
    fn table(&self, name: &str) -> Option<Arc<Schema>>;

    /// Whether an index leads with the given column
    fn has_index(&self, table: &str, column: usize) -> bool {
        self.table(table)
            .and_then(|schema| schema.get_column(column).map(|c| c.indexed))
            .unwrap_or(false)
    }

    /// Version of the metadata; changes whenever any table definition does
    fn epoch(&self) -> u64;

    /// Look up a table or fail with TableNotFound
    fn require_table(&self, name: &str) -> Result<Arc<Schema>> {
        self.table(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }
}

/// Immutable catalog contents at one epoch
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    epoch: u64,
    tables: FxHashMap<String, Arc<Schema>>,
}

impl CatalogSnapshot {
    pub fn new(epoch: u64) -> Self {
        Self {
            epoch,
            tables: FxHashMap::default(),
        }
    }

    /// Add a table, returning the extended snapshot
    pub fn with_table(mut self, schema: Schema) -> Self {
        self.tables
            .insert(schema.table_name.to_lowercase(), Arc::new(schema));
        self
    }

    /// Number of tables in the snapshot
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl Catalog for CatalogSnapshot {
    fn table(&self, name: &str) -> Option<Arc<Schema>> {
        self.tables.get(&name.to_lowercase()).cloned()
    }

    fn epoch(&self) -> u64 {
        self.epoch
    }
}
