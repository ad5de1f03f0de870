//! Transaction-set registry
//!
//! Keyed by (transaction type id, implementation convention). The
//! registry is built up front, then treated as read-only for the
//! duration of any conversion; it can be shared by reference across
//! independently-stated conversions.

use crate::model::TransactionSet;
use std::collections::HashMap;
use tracing::debug;

/// Conventions longer than this are retried as a normalized prefix,
/// so that e.g. `005010X223A2` resolves a schema registered for
/// `005010X223`.
const CONVENTION_PREFIX_LEN: usize = 10;

/// Registry of transaction-set schemas
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    sets: HashMap<String, TransactionSet>,
}

fn key(id: &str, convention: Option<&str>) -> String {
    match convention {
        Some(convention) if !convention.is_empty() => format!("{}/{}", id, convention),
        _ => id.to_string(),
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transaction set, replacing any prior definition
    /// under the same (id, convention) key
    pub fn register(&mut self, set: TransactionSet) {
        let k = key(set.id(), set.convention());
        if self.sets.insert(k, set).is_some() {
            debug!("replaced an existing transaction set definition");
        }
    }

    pub fn remove(&mut self, id: &str, convention: Option<&str>) {
        self.sets.remove(&key(id, convention));
    }

    pub fn clear(&mut self) {
        self.sets.clear();
    }

    pub fn contains(&self, id: &str, convention: Option<&str>) -> bool {
        self.sets.contains_key(&key(id, convention))
    }

    /// Exact lookup under one (id, convention) key
    pub fn get(&self, id: &str, convention: Option<&str>) -> Option<&TransactionSet> {
        self.sets.get(&key(id, convention))
    }

    /// Resolve the schema for a transaction, most specific first:
    /// exact (id, convention), then the 10-character convention
    /// prefix, then the bare transaction id.
    pub fn resolve(&self, id: &str, convention: Option<&str>) -> Option<&TransactionSet> {
        if let Some(convention) = convention.filter(|c| !c.is_empty()) {
            if let Some(ts) = self.get(id, Some(convention)) {
                return Some(ts);
            }
            if convention.len() > CONVENTION_PREFIX_LEN {
                if let Some(prefix) = convention.get(..CONVENTION_PREFIX_LEN) {
                    if let Some(ts) = self.get(id, Some(prefix)) {
                        return Some(ts);
                    }
                }
            }
        }
        self.get(id, None)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
