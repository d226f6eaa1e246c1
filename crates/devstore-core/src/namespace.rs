//! Namespace manager — guarantees a namespace's container exists before use.
//!
//! Creation is lazy and idempotent. redb runs one write transaction at a
//! time and `WriteScope::ensure_container` checks before creating, so
//! concurrent callers for the same namespace produce exactly one container
//! and never see a duplicate-container error.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use devstore_state::{StateResult, StateStore, WriteScope};
use tracing::{debug, info};

use crate::error::DevstoreResult;
use crate::types::NamespaceId;

/// Ensures namespace containers exist. Cheap to clone; clones share the
/// cache of namespaces already known to exist.
#[derive(Clone)]
pub struct NamespaceManager {
    store: StateStore,
    /// Namespaces confirmed to exist in committed state.
    known: Arc<RwLock<HashSet<NamespaceId>>>,
}

impl NamespaceManager {
    pub fn new(store: StateStore) -> Self {
        Self {
            store,
            known: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Create the namespace's container if absent; no-op if present.
    pub fn ensure_exists(&self, namespace: &NamespaceId) -> DevstoreResult<()> {
        if self.is_known(namespace) {
            return Ok(());
        }

        if self.store.has_container(namespace.as_str())? {
            debug!(%namespace, "namespace already exists");
        } else {
            let created = self
                .store
                .write(|scope| scope.ensure_container(namespace.as_str()))?;
            if created {
                info!(%namespace, "namespace created");
            }
        }

        self.remember(namespace);
        Ok(())
    }

    /// Whether the namespace's container exists.
    pub fn exists(&self, namespace: &NamespaceId) -> DevstoreResult<bool> {
        if self.is_known(namespace) {
            return Ok(true);
        }
        Ok(self.store.has_container(namespace.as_str())?)
    }

    /// Create the container inside a caller's transaction.
    ///
    /// The cache is not updated; call [`NamespaceManager::remember`] once the
    /// transaction has committed.
    pub(crate) fn materialize(&self, scope: &WriteScope, namespace: &NamespaceId) -> StateResult<bool> {
        scope.ensure_container(namespace.as_str())
    }

    pub(crate) fn remember(&self, namespace: &NamespaceId) {
        if let Ok(mut known) = self.known.write() {
            known.insert(namespace.clone());
        }
    }

    fn is_known(&self, namespace: &NamespaceId) -> bool {
        self.known
            .read()
            .map(|known| known.contains(namespace))
            .unwrap_or(false)
    }
}
