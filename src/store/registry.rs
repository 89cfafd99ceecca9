//! Concurrency-safe mapping from scope key to playback store

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::PlaybackStore;

/// Maps an opaque scope key to its playback store.
///
/// Each concurrently running test scope gets its own isolated store even
/// though every scope shares one process-wide transport hook. Register,
/// lookup, and unregister are each atomic per key under arbitrary
/// interleaving.
pub struct StoreRegistry {
    stores: DashMap<String, Arc<PlaybackStore>>,
}

impl StoreRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            stores: DashMap::new(),
        }
    }

    /// Get or create the store for a scope key.
    ///
    /// Idempotent: a key that is already registered gets its existing store
    /// back, never a replacement.
    #[must_use]
    pub fn register(&self, scope_key: &str) -> Arc<PlaybackStore> {
        let store = self
            .stores
            .entry(scope_key.to_string())
            .or_insert_with(|| {
                debug!("Registering scope {scope_key:?}");
                Arc::new(PlaybackStore::new())
            });
        Arc::clone(store.value())
    }

    /// Look up the store for a scope key without creating one
    #[must_use]
    pub fn lookup(&self, scope_key: &str) -> Option<Arc<PlaybackStore>> {
        self.stores
            .get(scope_key)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Drop a scope's store, handing it back for a final export.
    ///
    /// The caller owns persistence: export the returned store first if the
    /// recordings should survive the scope.
    pub fn unregister(&self, scope_key: &str) -> Option<Arc<PlaybackStore>> {
        let removed = self.stores.remove(scope_key).map(|(_, store)| store);
        if removed.is_some() {
            debug!("Unregistered scope {scope_key:?}");
        }
        removed
    }

    /// Number of registered scopes
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Whether no scope is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}
