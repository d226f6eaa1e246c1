//! Domain types persisted by Devstore.
//!
//! Registrations live in the shared registry container; records live in
//! their developer's namespace container. All of them are stored as JSON.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix of every namespace container name.
pub const NAMESPACE_PREFIX: &str = "dev_";

/// Field of a user record holding the sign-in state.
pub const AUTHENTICATED_FIELD: &str = "authenticated";

// ── Namespace ─────────────────────────────────────────────────────

/// Identifier of a developer's private namespace (its container name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceId(String);

impl NamespaceId {
    /// Derive the namespace for a developer key: `dev_<developerKey>`.
    pub fn for_developer(developer_key: &str) -> Self {
        Self(format!("{NAMESPACE_PREFIX}{developer_key}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Registration ──────────────────────────────────────────────────

/// Registry entry binding a developer key to its namespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperRegistration {
    pub developer_key: String,
    /// Derived once at registration, immutable thereafter.
    pub namespace_id: NamespaceId,
    /// Caller-supplied metadata; its value is the registration's identity.
    pub metadata: Value,
    /// Unix timestamp (seconds) of the registration.
    pub registered_at: u64,
}

impl DeveloperRegistration {
    /// Build the key for the registry container.
    pub fn table_key(&self) -> String {
        registry_key(&self.developer_key)
    }
}

/// Registry key for a developer: `developers/<developerKey>`.
pub fn registry_key(developer_key: &str) -> String {
    format!("developers/{developer_key}")
}

// ── Records ───────────────────────────────────────────────────────

/// A key-addressed JSON value inside a namespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub key: String,
    pub payload: Value,
}

/// Email/password pair supplied to `CREATEUSER` and `SIGNIN`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Typed view of a user record's payload.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
    pub password: String,
    /// Records written through `SET` carry no flag yet; they read as signed out.
    #[serde(default)]
    pub authenticated: bool,
}

impl UserRecord {
    /// A fresh user in the signed-out state.
    pub fn signed_out(credentials: Credentials) -> Self {
        Self {
            email: credentials.email,
            password: credentials.password,
            authenticated: false,
        }
    }

    /// Interpret a stored payload as a user record, if it is one.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        serde_json::from_value(payload.clone()).ok()
    }

    /// Exact, case-sensitive match of both email and password.
    pub fn matches(&self, credentials: &Credentials) -> bool {
        self.email == credentials.email && self.password == credentials.password
    }
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("authenticated", &self.authenticated)
            .finish()
    }
}

/// What `GETAUTH` reports back. Never includes the password.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthStatus {
    pub key: String,
    pub email: String,
    pub authenticated: bool,
}

impl AuthStatus {
    pub fn new(key: &str, user: &UserRecord) -> Self {
        Self {
            key: key.to_string(),
            email: user.email.clone(),
            authenticated: user.authenticated,
        }
    }
}
