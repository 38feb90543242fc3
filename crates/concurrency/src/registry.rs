//! Resource registry
//!
//! Maps resource names to their [`ResourceLock`]. Entries are created on
//! first reference and stay for the lifetime of the registry, so every
//! transaction naming the same resource shares one lock object.
//!
//! Lookups of existing entries only take a shard read lock. Creation goes
//! through DashMap's entry API, which makes get-or-insert atomic.

use crate::resource::ResourceLock;
use crate::status::ResourceHolders;
use dashmap::DashMap;
use std::sync::Arc;

/// Registry of per-resource locks
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    locks: DashMap<String, Arc<ResourceLock>>,
}

impl ResourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the lock for `name`, creating it if this is the first reference.
    ///
    /// Concurrent callers racing on a new name all receive the same instance.
    pub fn get_or_create(&self, name: &str) -> Arc<ResourceLock> {
        if let Some(lock) = self.locks.get(name) {
            return Arc::clone(lock.value());
        }
        let entry = self
            .locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(ResourceLock::new(name)));
        Arc::clone(entry.value())
    }

    /// Get the lock for `name` if it has ever been referenced
    pub fn get(&self, name: &str) -> Option<Arc<ResourceLock>> {
        self.locks.get(name).map(|lock| Arc::clone(lock.value()))
    }

    /// Number of resources ever locked
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// True if no resource has been referenced yet
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Holders of every known resource, sorted by name
    pub fn holders(&self) -> Vec<(String, ResourceHolders)> {
        let locks: Vec<Arc<ResourceLock>> =
            self.locks.iter().map(|e| Arc::clone(e.value())).collect();
        let mut out: Vec<_> = locks
            .iter()
            .map(|lock| (lock.name().to_string(), lock.holders()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}
