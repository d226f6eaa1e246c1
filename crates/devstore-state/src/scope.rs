//! Transaction scopes handed to `StateStore::read` / `StateStore::write`.

use redb::{
    ReadOnlyTable, ReadTransaction, ReadableTable, Table, TableDefinition, TableError,
    TableHandle, WriteTransaction,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::codec;
use crate::error::{StateError, StateResult};

/// Every container maps `&str` keys to JSON-encoded `&[u8]` values.
fn definition(name: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(name)
}

fn table_err(container: &str, err: TableError) -> StateError {
    match err {
        TableError::TableDoesNotExist(_) => StateError::MissingContainer(container.to_string()),
        other => StateError::Table(other.to_string()),
    }
}

// ── Read scope ─────────────────────────────────────────────────────

/// A read-only transaction. Sees a consistent snapshot of every container.
pub struct ReadScope {
    txn: ReadTransaction,
}

impl ReadScope {
    pub(crate) fn new(txn: ReadTransaction) -> Self {
        Self { txn }
    }

    fn open(&self, container: &str) -> StateResult<ReadOnlyTable<&'static str, &'static [u8]>> {
        self.txn
            .open_table(definition(container))
            .map_err(|e| table_err(container, e))
    }

    /// Whether a container with this name exists.
    pub fn has_container(&self, name: &str) -> StateResult<bool> {
        let mut tables = self.txn.list_tables().map_err(map_err!(Table))?;
        Ok(tables.any(|handle| handle.name() == name))
    }

    /// Raw bytes stored under `key`, if any.
    pub fn get(&self, container: &str, key: &str) -> StateResult<Option<Vec<u8>>> {
        let table = self.open(container)?;
        let value = table.get(key).map_err(map_err!(Read))?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }

    /// Decoded JSON value stored under `key`, if any.
    pub fn get_json<T: DeserializeOwned>(&self, container: &str, key: &str) -> StateResult<Option<T>> {
        self.get(container, key)?
            .map(|bytes| codec::decode(&bytes))
            .transpose()
    }

    /// All keys in a container, in key order.
    pub fn keys(&self, container: &str) -> StateResult<Vec<String>> {
        let table = self.open(container)?;
        let mut keys = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, _) = entry.map_err(map_err!(Read))?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}

// ── Write scope ────────────────────────────────────────────────────

/// A read-write transaction. Changes become visible only on commit.
///
/// Only [`WriteScope::ensure_container`] creates containers; the other
/// operations fail with [`StateError::MissingContainer`] when the target is
/// absent.
pub struct WriteScope {
    txn: WriteTransaction,
}

impl WriteScope {
    pub(crate) fn new(txn: WriteTransaction) -> Self {
        Self { txn }
    }

    pub(crate) fn commit(self) -> StateResult<()> {
        self.txn.commit().map_err(map_err!(Transaction))
    }

    pub(crate) fn abort(self) {
        if let Err(e) = self.txn.abort() {
            warn!(error = %e, "failed to abort write transaction");
        }
    }

    fn open(&self, container: &str) -> StateResult<Table<'_, &'static str, &'static [u8]>> {
        if !self.has_container(container)? {
            return Err(StateError::MissingContainer(container.to_string()));
        }
        self.txn
            .open_table(definition(container))
            .map_err(|e| table_err(container, e))
    }

    /// Whether a container with this name exists (including ones created
    /// earlier in this transaction).
    pub fn has_container(&self, name: &str) -> StateResult<bool> {
        let mut tables = self.txn.list_tables().map_err(map_err!(Table))?;
        Ok(tables.any(|handle| handle.name() == name))
    }

    /// Create the container if absent. Returns true if it was created.
    pub fn ensure_container(&self, name: &str) -> StateResult<bool> {
        if self.has_container(name)? {
            return Ok(false);
        }
        // Opening a table in a write transaction creates it if absent.
        self.txn
            .open_table(definition(name))
            .map_err(|e| table_err(name, e))?;
        debug!(container = name, "container created");
        Ok(true)
    }

    /// Raw bytes stored under `key`, if any.
    pub fn get(&self, container: &str, key: &str) -> StateResult<Option<Vec<u8>>> {
        let table = self.open(container)?;
        let value = table.get(key).map_err(map_err!(Read))?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }

    /// Decoded JSON value stored under `key`, if any.
    pub fn get_json<T: DeserializeOwned>(&self, container: &str, key: &str) -> StateResult<Option<T>> {
        self.get(container, key)?
            .map(|bytes| codec::decode(&bytes))
            .transpose()
    }

    /// Insert or overwrite `key`. Returns true if a previous value was replaced.
    pub fn put(&self, container: &str, key: &str, value: &[u8]) -> StateResult<bool> {
        let mut table = self.open(container)?;
        let replaced = table.insert(key, value).map_err(map_err!(Write))?.is_some();
        Ok(replaced)
    }

    /// Encode `value` as JSON and store it under `key`.
    pub fn put_json<T: Serialize + ?Sized>(
        &self,
        container: &str,
        key: &str,
        value: &T,
    ) -> StateResult<bool> {
        let bytes = codec::encode(value)?;
        self.put(container, key, &bytes)
    }

    /// Remove `key`. Returns true if it existed.
    pub fn delete(&self, container: &str, key: &str) -> StateResult<bool> {
        let mut table = self.open(container)?;
        let existed = table.remove(key).map_err(map_err!(Write))?.is_some();
        Ok(existed)
    }
}
