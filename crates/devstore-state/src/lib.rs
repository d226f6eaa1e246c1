//! devstore-state — storage primitive for Devstore.
//!
//! Backed by [redb](https://docs.rs/redb). A database holds any number of
//! named *containers* (redb tables with `&str` keys and `&[u8]` values).
//! Containers are created lazily and idempotently; all access happens inside
//! a single read or read-write transaction scope.
//!
//! # Architecture
//!
//! Callers hand a closure to [`StateStore::read`] or [`StateStore::write`].
//! The closure receives a [`ReadScope`] / [`WriteScope`] wrapping one redb
//! transaction. A write scope is committed only when the closure returns
//! `Ok`; any error aborts the transaction and discards every change made
//! inside it.
//!
//! redb allows a single writer at a time, so a read-then-write sequence
//! inside one `write` closure can never interleave with another writer.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| $crate::error::StateError::$variant(e.to_string())
    };
}

pub mod codec;
pub mod error;
pub mod scope;
pub mod store;

pub use error::{StateError, StateResult};
pub use scope::{ReadScope, WriteScope};
pub use store::StateStore;
