//! Auth controller — the sign-in / sign-out lifecycle of user records.
//!
//! A user record is in one of two states, `SignedOut` (`authenticated =
//! false`, the initial state) or `SignedIn`. Sign-in requires an exact
//! email/password match; sign-out only requires the record to exist. Each
//! transition is a read-check-write inside one write transaction, so a
//! rejected sign-in leaves the record untouched and concurrent transitions
//! on the same record are applied one after another.
//!
//! Both transitions act on any existing record, including ones written
//! through generic `SET`. A record without matching `email` and `password`
//! fields cannot sign in. Only `GETAUTH` needs the user shape (`email` and
//! `password`) and reports other records as a missing user.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{DevstoreError, DevstoreResult};
use crate::records::RecordStore;
use crate::types::{Credentials, NamespaceId, UserRecord, AUTHENTICATED_FIELD};

#[derive(Clone)]
pub struct AuthController {
    records: RecordStore,
}

impl AuthController {
    pub fn new(records: RecordStore) -> Self {
        Self { records }
    }

    /// Store a new signed-out user at `key`.
    ///
    /// This is an upsert: an existing record at `key` is replaced without
    /// any check, which lets anyone holding the developer key reset another
    /// user's credentials. The replacement is logged.
    pub fn create_user(
        &self,
        namespace: &NamespaceId,
        key: &str,
        credentials: Credentials,
    ) -> DevstoreResult<()> {
        let user = UserRecord::signed_out(credentials);
        let replaced = self.records.store(namespace, key, &user)?;
        if replaced {
            warn!(%namespace, key, "create_user replaced an existing record");
        } else {
            info!(%namespace, key, "user created");
        }
        Ok(())
    }

    /// `SignedOut | SignedIn -> SignedIn`, only on an exact credential match.
    pub fn sign_in(
        &self,
        namespace: &NamespaceId,
        key: &str,
        credentials: &Credentials,
    ) -> DevstoreResult<()> {
        self.records
            .modify(namespace, key, |payload| {
                let matched = UserRecord::from_payload(payload)
                    .is_some_and(|user| user.matches(credentials));
                if !matched {
                    return Err(DevstoreError::InvalidCredentials);
                }
                set_authenticated(payload, true);
                Ok(())
            })
            .inspect_err(|e| {
                if matches!(e, DevstoreError::InvalidCredentials) {
                    warn!(%namespace, key, "sign-in rejected");
                }
            })?;
        debug!(%namespace, key, "user signed in");
        Ok(())
    }

    /// `SignedIn | SignedOut -> SignedOut`. Succeeds whenever the record
    /// exists; non-object payloads are left as they are.
    pub fn sign_out(&self, namespace: &NamespaceId, key: &str) -> DevstoreResult<()> {
        self.records.modify(namespace, key, |payload| {
            set_authenticated(payload, false);
            Ok(())
        })?;
        debug!(%namespace, key, "user signed out");
        Ok(())
    }

    /// Current state of a user record. Read-only.
    pub fn get_auth_status(&self, namespace: &NamespaceId, key: &str) -> DevstoreResult<UserRecord> {
        let record = self.records.get(namespace, key)?;
        user_view(key, &record.payload)
    }
}

fn user_view(key: &str, payload: &Value) -> DevstoreResult<UserRecord> {
    UserRecord::from_payload(payload).ok_or_else(|| DevstoreError::not_found("user", key))
}

fn set_authenticated(payload: &mut Value, authenticated: bool) {
    if let Some(fields) = payload.as_object_mut() {
        fields.insert(AUTHENTICATED_FIELD.to_string(), Value::Bool(authenticated));
    }
}
