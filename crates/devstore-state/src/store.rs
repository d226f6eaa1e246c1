//! StateStore — redb-backed storage primitive for Devstore.
//!
//! Owns the database handle and hands out transaction scopes. The store
//! supports both on-disk and in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, TableHandle};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::scope::{ReadScope, WriteScope};

/// Thread-safe storage handle backed by redb.
///
/// Created once at startup and passed by handle to every component that
/// needs storage. The database closes when the last clone is dropped.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        debug!(?path, "state store opened");
        Ok(Self { db: Arc::new(db) })
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        debug!("in-memory state store opened");
        Ok(Self { db: Arc::new(db) })
    }

    /// Run `f` inside a single read-only transaction.
    pub fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&ReadScope) -> Result<T, E>,
        E: From<StateError>,
    {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        f(&ReadScope::new(txn))
    }

    /// Run `f` inside a single read-write transaction.
    ///
    /// The transaction commits only if `f` returns `Ok`; on error every
    /// change made by `f` is discarded.
    pub fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&WriteScope) -> Result<T, E>,
        E: From<StateError>,
    {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let scope = WriteScope::new(txn);
        match f(&scope) {
            Ok(value) => {
                scope.commit()?;
                Ok(value)
            }
            Err(err) => {
                scope.abort();
                Err(err)
            }
        }
    }

    /// Whether a container with this name exists.
    pub fn has_container(&self, name: &str) -> StateResult<bool> {
        self.read(|scope| scope.has_container(name))
    }

    /// Names of all existing containers.
    pub fn containers(&self) -> StateResult<Vec<String>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let tables = txn.list_tables().map_err(map_err!(Table))?;
        Ok(tables.map(|handle| handle.name().to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const C: &str = "things";

    fn store_with_container() -> StateStore {
        let store = StateStore::open_in_memory().unwrap();
        store
            .write(|scope| scope.ensure_container(C))
            .map(|_| ())
            .unwrap();
        store
    }

    // ── Containers ─────────────────────────────────────────────────

    #[test]
    fn ensure_container_is_idempotent() {
        let store = StateStore::open_in_memory().unwrap();

        let created: bool = store.write(|scope| scope.ensure_container(C)).unwrap();
        assert!(created);
        let created: bool = store.write(|scope| scope.ensure_container(C)).unwrap();
        assert!(!created);

        assert!(store.has_container(C).unwrap());
        assert_eq!(store.containers().unwrap(), vec![C.to_string()]);
    }

    #[test]
    fn missing_container_is_reported() {
        let store = StateStore::open_in_memory().unwrap();

        let err = store
            .read(|scope| scope.get("nope", "k"))
            .unwrap_err();
        assert!(matches!(err, StateError::MissingContainer(name) if name == "nope"));

        let err = store
            .write(|scope| scope.put("nope", "k", b"{}"))
            .unwrap_err();
        assert!(matches!(err, StateError::MissingContainer(_)));
        // A failed put must not have created the container.
        assert!(!store.has_container("nope").unwrap());
    }

    #[test]
    fn concurrent_ensure_creates_once() {
        let store = StateStore::open_in_memory().unwrap();

        let created: Vec<bool> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let store = store.clone();
                    s.spawn(move || {
                        store
                            .write(|scope| scope.ensure_container("shared"))
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(created.iter().filter(|c| **c).count(), 1);
        assert_eq!(store.containers().unwrap().len(), 1);
    }

    // ── Entries ────────────────────────────────────────────────────

    #[test]
    fn put_get_delete() {
        let store = store_with_container();

        let replaced = store.write(|scope| scope.put_json(C, "a", &json!({"n": 1}))).unwrap();
        assert!(!replaced);
        let replaced = store.write(|scope| scope.put_json(C, "a", &json!({"n": 2}))).unwrap();
        assert!(replaced);

        let value: Option<serde_json::Value> = store.read(|scope| scope.get_json(C, "a")).unwrap();
        assert_eq!(value, Some(json!({"n": 2})));

        assert!(store.write(|scope| scope.delete(C, "a")).unwrap());
        assert!(!store.write(|scope| scope.delete(C, "a")).unwrap());
        assert!(store.read(|scope| scope.get(C, "a")).unwrap().is_none());
    }

    #[test]
    fn keys_are_ordered() {
        let store = store_with_container();
        store
            .write(|scope| {
                scope.put(C, "b", b"1")?;
                scope.put(C, "a", b"2")?;
                scope.put(C, "c", b"3")
            })
            .unwrap();

        let keys = store.read(|scope| scope.keys(C)).unwrap();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn failed_write_is_rolled_back() {
        let store = store_with_container();

        let result: StateResult<()> = store.write(|scope| {
            scope.put(C, "a", b"1")?;
            scope.ensure_container("orphan")?;
            Err(StateError::Write("boom".to_string()))
        });
        assert!(result.is_err());

        assert!(store.read(|scope| scope.get(C, "a")).unwrap().is_none());
        assert!(!store.has_container("orphan").unwrap());
    }

    #[test]
    fn read_then_write_sees_own_changes() {
        let store = store_with_container();

        let seen = store
            .write(|scope| {
                scope.put(C, "a", b"1")?;
                scope.get(C, "a")
            })
            .unwrap();
        assert_eq!(seen, Some(b"1".to_vec()));
    }

    // ── Persistence (on-disk) ──────────────────────────────────────

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.redb");

        {
            let store = StateStore::open(&db_path).unwrap();
            store
                .write(|scope| {
                    scope.ensure_container(C)?;
                    scope.put_json(C, "k", &json!("v"))
                })
                .unwrap();
        }

        // Reopen the same database file.
        let store = StateStore::open(&db_path).unwrap();
        assert!(store.has_container(C).unwrap());
        let value: Option<String> = store.read(|scope| scope.get_json(C, "k")).unwrap();
        assert_eq!(value.as_deref(), Some("v"));
    }
}
