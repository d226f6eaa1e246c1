//! Command dispatcher — routes decoded commands to the core components.
//!
//! `SETDEV` goes straight to the registry. Every other command first
//! resolves the caller's developer key; a failed resolution ends the
//! command before its key or payload is validated and before any record or
//! auth operation runs.

use devstore_state::StateStore;
use serde_json::json;
use tracing::{debug, warn};

use crate::auth::AuthController;
use crate::command::{Action, Command, Envelope, ScopedCommand};
use crate::error::DevstoreResult;
use crate::namespace::NamespaceManager;
use crate::records::RecordStore;
use crate::registry::Registry;
use crate::response::Response;
use crate::types::{AuthStatus, NamespaceId, Record};

/// Successful result of a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Registered(NamespaceId),
    Done(&'static str),
    Record(Record),
    AuthStatus(AuthStatus),
}

impl From<Outcome> for Response {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Registered(namespace) => Response {
                data: Some(json!({ "namespaceId": namespace })),
                ..Response::success("Developer data stored successfully.")
            },
            Outcome::Done(message) => Response::success(message),
            Outcome::Record(record) => Response::with_data(json!({
                "id": record.key,
                "data": record.payload,
            })),
            Outcome::AuthStatus(status) => Response::with_data(json!(status)),
        }
    }
}

/// Entry point of the core. Owns one handle to each component; cheap to
/// clone and safe to share across tasks.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Registry,
    records: RecordStore,
    auth: AuthController,
}

impl Dispatcher {
    pub fn new(store: StateStore) -> Self {
        let namespaces = NamespaceManager::new(store.clone());
        let registry = Registry::new(store.clone(), namespaces.clone());
        let records = RecordStore::new(store, namespaces);
        let auth = AuthController::new(records.clone());
        Self {
            registry,
            records,
            auth,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Decode and execute an envelope, folding any error into the response.
    pub fn handle(&self, developer_key: Option<&str>, envelope: Envelope) -> Response {
        let action = envelope.action.clone();
        match self.run(developer_key, envelope) {
            Ok(outcome) => outcome.into(),
            Err(err) => {
                let response = Response::error(&err);
                if response.http_status_hint >= 500 {
                    warn!(%action, error = %err, cause = ?std::error::Error::source(&err), "command failed");
                } else {
                    debug!(%action, error = %err, "command rejected");
                }
                response
            }
        }
    }

    /// Tag, then developer key, then the rest of the envelope.
    fn run(&self, developer_key: Option<&str>, envelope: Envelope) -> DevstoreResult<Outcome> {
        let action: Action = envelope.action.parse()?;
        let namespace = match action {
            Action::SetDev => None,
            _ => Some(self.registry.resolve(developer_key)?),
        };
        match (Command::decode(action, envelope.key, envelope.data)?, namespace) {
            (Command::Scoped(scoped), Some(namespace)) => self.execute_scoped(&namespace, scoped),
            (command, _) => self.execute(developer_key, command),
        }
    }

    /// Execute a decoded command on behalf of `developer_key`.
    pub fn execute(&self, developer_key: Option<&str>, command: Command) -> DevstoreResult<Outcome> {
        debug!(action = %command.action(), "dispatching command");
        match command {
            Command::SetDev {
                developer_key,
                metadata,
            } => Ok(Outcome::Registered(self.registry.register(&developer_key, metadata)?)),
            Command::Scoped(scoped) => {
                let namespace = self.registry.resolve(developer_key)?;
                self.execute_scoped(&namespace, scoped)
            }
        }
    }

    fn execute_scoped(&self, ns: &NamespaceId, command: ScopedCommand) -> DevstoreResult<Outcome> {
        match command {
            ScopedCommand::CreateUser { key, credentials } => {
                self.auth.create_user(ns, &key, credentials)?;
                Ok(Outcome::Done("User created successfully."))
            }
            ScopedCommand::SignIn { key, credentials } => {
                self.auth.sign_in(ns, &key, &credentials)?;
                Ok(Outcome::Done("User signed in."))
            }
            ScopedCommand::SignOut { key } => {
                self.auth.sign_out(ns, &key)?;
                Ok(Outcome::Done("User signed out."))
            }
            ScopedCommand::GetAuth { key } => {
                let user = self.auth.get_auth_status(ns, &key)?;
                Ok(Outcome::AuthStatus(AuthStatus::new(&key, &user)))
            }
            ScopedCommand::Get { key } => Ok(Outcome::Record(self.records.get(ns, &key)?)),
            ScopedCommand::Set { key, payload } => {
                self.records.put(ns, &key, payload)?;
                Ok(Outcome::Done("Data stored successfully."))
            }
            ScopedCommand::Put { key, payload } => {
                self.records.update(ns, &key, payload)?;
                Ok(Outcome::Done("Data updated successfully."))
            }
            ScopedCommand::Delete { key } => {
                self.records.delete(ns, &key)?;
                Ok(Outcome::Done("Data removed."))
            }
        }
    }
}
