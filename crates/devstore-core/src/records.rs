//! Record store — generic get/put/update/delete inside one namespace.
//!
//! Every operation first ensures the namespace container exists, then runs
//! in a single transaction (read-only for `get`, read-write otherwise).
//!
//! Generic writes never change a record's `authenticated` flag: any value
//! supplied by the caller is dropped and the stored value, if any, is
//! carried over. Only the auth controller flips it, through
//! [`RecordStore::store`] and [`RecordStore::modify`].

use devstore_state::StateStore;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{DevstoreError, DevstoreResult};
use crate::namespace::NamespaceManager;
use crate::types::{NamespaceId, Record, AUTHENTICATED_FIELD};

#[derive(Clone)]
pub struct RecordStore {
    store: StateStore,
    namespaces: NamespaceManager,
}

impl RecordStore {
    pub fn new(store: StateStore, namespaces: NamespaceManager) -> Self {
        Self { store, namespaces }
    }

    /// Fetch a record. Fails with `NotFound` if absent.
    pub fn get(&self, namespace: &NamespaceId, key: &str) -> DevstoreResult<Record> {
        let key = require_key(key, "lookup")?;
        self.namespaces.ensure_exists(namespace)?;

        let payload: Option<Value> = self
            .store
            .read(|scope| scope.get_json(namespace.as_str(), key))?;
        match payload {
            Some(payload) => Ok(Record {
                key: key.to_string(),
                payload,
            }),
            None => Err(DevstoreError::not_found("record", key)),
        }
    }

    /// Upsert: overwrite any existing record at `key` unconditionally.
    pub fn put(&self, namespace: &NamespaceId, key: &str, mut payload: Value) -> DevstoreResult<()> {
        let key = require_key(key, "storage")?;
        self.namespaces.ensure_exists(namespace)?;

        let replaced = self.store.write(|scope| {
            let previous: Option<Value> = scope.get_json(namespace.as_str(), key)?;
            carry_authenticated(previous.as_ref(), &mut payload);
            scope.put_json(namespace.as_str(), key, &payload)
        })?;
        debug!(%namespace, key, replaced, "record stored");
        Ok(())
    }

    /// Replace an existing record's payload. Fails with `NotFound` if absent.
    pub fn update(&self, namespace: &NamespaceId, key: &str, payload: Value) -> DevstoreResult<()> {
        self.modify(namespace, key, |current| {
            let mut next = payload;
            carry_authenticated(Some(current), &mut next);
            *current = next;
            Ok(())
        })?;
        debug!(%namespace, key, "record updated");
        Ok(())
    }

    /// Remove a record. Fails with `MissingKey` before touching storage when
    /// no key is given, and with `NotFound` if the record is absent.
    pub fn delete(&self, namespace: &NamespaceId, key: &str) -> DevstoreResult<()> {
        let key = require_key(key, "deletion")?;
        self.namespaces.ensure_exists(namespace)?;

        let existed = self
            .store
            .write(|scope| scope.delete(namespace.as_str(), key))?;
        if !existed {
            return Err(DevstoreError::not_found("record", key));
        }
        debug!(%namespace, key, "record deleted");
        Ok(())
    }

    /// Unguarded upsert. Returns true if an existing record was replaced.
    pub(crate) fn store<T: Serialize>(
        &self,
        namespace: &NamespaceId,
        key: &str,
        payload: &T,
    ) -> DevstoreResult<bool> {
        let key = require_key(key, "storage")?;
        self.namespaces.ensure_exists(namespace)?;
        Ok(self
            .store
            .write(|scope| scope.put_json(namespace.as_str(), key, payload))?)
    }

    /// Read, mutate and write back one record inside a single write
    /// transaction. If `f` fails nothing is written. Returns the new payload.
    pub(crate) fn modify<F>(&self, namespace: &NamespaceId, key: &str, f: F) -> DevstoreResult<Value>
    where
        F: FnOnce(&mut Value) -> DevstoreResult<()>,
    {
        let key = require_key(key, "update")?;
        self.namespaces.ensure_exists(namespace)?;

        self.store.write(|scope| {
            let mut payload: Value = scope
                .get_json(namespace.as_str(), key)?
                .ok_or_else(|| DevstoreError::not_found("record", key))?;
            f(&mut payload)?;
            scope.put_json(namespace.as_str(), key, &payload)?;
            Ok(payload)
        })
    }
}

fn require_key<'a>(key: &'a str, purpose: &'static str) -> DevstoreResult<&'a str> {
    if key.is_empty() {
        Err(DevstoreError::MissingKey(purpose))
    } else {
        Ok(key)
    }
}

/// Make `payload` keep the sign-in state of `previous`.
fn carry_authenticated(previous: Option<&Value>, payload: &mut Value) {
    let Some(fields) = payload.as_object_mut() else {
        return;
    };
    fields.remove(AUTHENTICATED_FIELD);
    if let Some(flag) = previous.and_then(|p| p.get(AUTHENTICATED_FIELD)) {
        fields.insert(AUTHENTICATED_FIELD.to_string(), flag.clone());
    }
}
