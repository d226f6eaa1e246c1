//! Namespace registry — maps developer keys to namespaces.
//!
//! Registrations are stored in the fixed [`REGISTRY_CONTAINER`] under
//! `developers/<developerKey>`. Registering writes the entry and creates the
//! namespace container in the same write transaction, so a registration is
//! either complete (entry + container) or has no effect at all.

use std::time::{SystemTime, UNIX_EPOCH};

use devstore_state::{StateResult, StateStore};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{DevstoreError, DevstoreResult};
use crate::namespace::NamespaceManager;
use crate::types::{registry_key, DeveloperRegistration, NamespaceId};

/// Container shared by all developers, holding every registration.
pub const REGISTRY_CONTAINER: &str = "registry";

#[derive(Clone)]
pub struct Registry {
    store: StateStore,
    namespaces: NamespaceManager,
}

impl Registry {
    pub fn new(store: StateStore, namespaces: NamespaceManager) -> Self {
        Self { store, namespaces }
    }

    /// Register a developer key and materialize its namespace.
    ///
    /// Re-registering with identical metadata returns the existing
    /// namespace. Re-registering with different metadata fails with
    /// `AlreadyRegistered` and changes nothing.
    pub fn register(&self, developer_key: &str, metadata: Value) -> DevstoreResult<NamespaceId> {
        if developer_key.is_empty() {
            return Err(DevstoreError::MissingDeveloperKey);
        }
        let key = registry_key(developer_key);

        let (namespace, fresh) = self.store.write(|scope| -> DevstoreResult<(NamespaceId, bool)> {
            scope.ensure_container(REGISTRY_CONTAINER)?;

            if let Some(existing) = scope.get_json::<DeveloperRegistration>(REGISTRY_CONTAINER, &key)? {
                if existing.metadata != metadata {
                    return Err(DevstoreError::AlreadyRegistered(developer_key.to_string()));
                }
                self.namespaces.materialize(scope, &existing.namespace_id)?;
                return Ok((existing.namespace_id, false));
            }

            let registration = DeveloperRegistration {
                developer_key: developer_key.to_string(),
                namespace_id: NamespaceId::for_developer(developer_key),
                metadata,
                registered_at: epoch_secs(),
            };
            scope.put_json(REGISTRY_CONTAINER, &registration.table_key(), &registration)?;
            self.namespaces.materialize(scope, &registration.namespace_id)?;
            Ok((registration.namespace_id, true))
        })
        .inspect_err(|e| {
            if matches!(e, DevstoreError::AlreadyRegistered(_)) {
                warn!(developer_key, "conflicting re-registration rejected");
            }
        })?;

        self.namespaces.remember(&namespace);
        if fresh {
            info!(developer_key, %namespace, "developer registered");
        } else {
            debug!(developer_key, %namespace, "developer already registered");
        }
        Ok(namespace)
    }

    /// Resolve a caller-supplied developer key to its namespace.
    pub fn resolve(&self, developer_key: Option<&str>) -> DevstoreResult<NamespaceId> {
        let developer_key = developer_key
            .filter(|k| !k.is_empty())
            .ok_or(DevstoreError::MissingDeveloperKey)?;

        let registration = self.store.read(|scope| {
            if !scope.has_container(REGISTRY_CONTAINER)? {
                return Ok(None);
            }
            scope.get_json::<DeveloperRegistration>(REGISTRY_CONTAINER, &registry_key(developer_key))
        })?;

        match registration {
            Some(registration) => Ok(registration.namespace_id),
            None => {
                debug!(developer_key, "unknown developer key");
                Err(DevstoreError::InvalidDeveloperKey)
            }
        }
    }

    /// Number of registered developers. Counts registry keys without
    /// decoding the entries.
    pub fn count(&self) -> DevstoreResult<usize> {
        let count = self.store.read(|scope| -> StateResult<usize> {
            if !scope.has_container(REGISTRY_CONTAINER)? {
                return Ok(0);
            }
            Ok(scope.keys(REGISTRY_CONTAINER)?.len())
        })?;
        Ok(count)
    }

    /// Every registration, ordered by registry key.
    pub fn list(&self) -> DevstoreResult<Vec<DeveloperRegistration>> {
        let registrations = self.store.read(|scope| -> StateResult<Vec<DeveloperRegistration>> {
            if !scope.has_container(REGISTRY_CONTAINER)? {
                return Ok(Vec::new());
            }
            let mut registrations = Vec::new();
            for key in scope.keys(REGISTRY_CONTAINER)? {
                if let Some(registration) = scope.get_json(REGISTRY_CONTAINER, &key)? {
                    registrations.push(registration);
                }
            }
            Ok(registrations)
        })?;
        Ok(registrations)
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
