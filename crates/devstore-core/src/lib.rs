//! devstore-core — multi-tenant record store with per-user sign-in state.
//!
//! Each developer registers a key and receives a private namespace. Every
//! later command carries that developer key, is resolved to the namespace,
//! and only ever touches records inside it.
//!
//! # Components
//!
//! | Module | Role |
//! |---|---|
//! | [`registry`] | developer key → namespace mapping, stored in a shared container |
//! | [`namespace`] | lazy, idempotent namespace container creation |
//! | [`records`] | get / put / update / delete of JSON records |
//! | [`auth`] | sign-in / sign-out transitions of user records |
//! | [`command`] | envelope decoding into a closed command type |
//! | [`dispatch`] | developer-key check and routing |
//!
//! All components share one [`devstore_state::StateStore`] handle created
//! at startup.

pub mod auth;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod namespace;
pub mod records;
pub mod registry;
pub mod response;
pub mod types;

pub use auth::AuthController;
pub use command::{Action, Command, Envelope, ScopedCommand};
pub use config::DevstoreConfig;
pub use dispatch::{Dispatcher, Outcome};
pub use error::{DevstoreError, DevstoreResult, ErrorKind};
pub use namespace::NamespaceManager;
pub use records::RecordStore;
pub use registry::{Registry, REGISTRY_CONTAINER};
pub use response::{Response, Status};
pub use types::*;
