//! Command envelope and the closed set of commands decoded from it.
//!
//! Decoding validates everything that can be checked without storage:
//! the action tag, the record key and the action-specific payload fields.
//! The dispatcher parses the tag on its own first, so the developer key is
//! resolved before the key and payload are looked at.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DevstoreError, DevstoreResult};
use crate::types::Credentials;

/// Inbound message as relayed by the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Command tags understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    SetDev,
    CreateUser,
    SignIn,
    SignOut,
    GetAuth,
    Get,
    Set,
    Put,
    Delete,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::SetDev,
        Action::CreateUser,
        Action::SignIn,
        Action::SignOut,
        Action::GetAuth,
        Action::Get,
        Action::Set,
        Action::Put,
        Action::Delete,
    ];

    /// Wire tag of this action.
    pub fn tag(self) -> &'static str {
        match self {
            Action::SetDev => "SETDEV",
            Action::CreateUser => "CREATEUSER",
            Action::SignIn => "SIGNIN",
            Action::SignOut => "SIGNOUT",
            Action::GetAuth => "GETAUTH",
            Action::Get => "GET",
            Action::Set => "SET",
            Action::Put => "PUT",
            Action::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Action {
    type Err = DevstoreError;

    /// Tags are matched exactly (case-sensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.tag() == s)
            .ok_or_else(|| DevstoreError::UnsupportedCommand(s.to_string()))
    }
}

/// A fully decoded command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Bootstrap: register a developer. Needs no prior resolution.
    SetDev { developer_key: String, metadata: Value },
    /// Everything else runs inside the caller's namespace.
    Scoped(ScopedCommand),
}

/// Commands that require a resolved developer namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopedCommand {
    CreateUser { key: String, credentials: Credentials },
    SignIn { key: String, credentials: Credentials },
    SignOut { key: String },
    GetAuth { key: String },
    Get { key: String },
    Set { key: String, payload: Value },
    Put { key: String, payload: Value },
    Delete { key: String },
}

impl ScopedCommand {
    pub fn action(&self) -> Action {
        match self {
            Self::CreateUser { .. } => Action::CreateUser,
            Self::SignIn { .. } => Action::SignIn,
            Self::SignOut { .. } => Action::SignOut,
            Self::GetAuth { .. } => Action::GetAuth,
            Self::Get { .. } => Action::Get,
            Self::Set { .. } => Action::Set,
            Self::Put { .. } => Action::Put,
            Self::Delete { .. } => Action::Delete,
        }
    }

    /// Record key targeted by this command.
    pub fn key(&self) -> &str {
        match self {
            Self::CreateUser { key, .. }
            | Self::SignIn { key, .. }
            | Self::SignOut { key }
            | Self::GetAuth { key }
            | Self::Get { key }
            | Self::Set { key, .. }
            | Self::Put { key, .. }
            | Self::Delete { key } => key,
        }
    }
}

impl Command {
    pub fn action(&self) -> Action {
        match self {
            Command::SetDev { .. } => Action::SetDev,
            Command::Scoped(scoped) => scoped.action(),
        }
    }
}

impl TryFrom<Envelope> for Command {
    type Error = DevstoreError;

    fn try_from(envelope: Envelope) -> DevstoreResult<Self> {
        let action: Action = envelope.action.parse()?;
        Command::decode(action, envelope.key, envelope.data)
    }
}

impl Command {
    /// Decode the key and payload of an already parsed action.
    pub fn decode(action: Action, key: Option<String>, data: Option<Value>) -> DevstoreResult<Self> {
        let scoped = match action {
            Action::SetDev => return set_dev(key, data),
            Action::CreateUser => ScopedCommand::CreateUser {
                key: require_key(key, "user creation")?,
                credentials: credentials(data)?,
            },
            Action::SignIn => ScopedCommand::SignIn {
                key: require_key(key, "sign-in")?,
                credentials: credentials(data)?,
            },
            Action::SignOut => ScopedCommand::SignOut {
                key: require_key(key, "sign-out")?,
            },
            Action::GetAuth => ScopedCommand::GetAuth {
                key: require_key(key, "auth lookup")?,
            },
            Action::Get => ScopedCommand::Get {
                key: require_key(key, "lookup")?,
            },
            Action::Set => ScopedCommand::Set {
                key: require_key(key, "storage")?,
                payload: data.ok_or(DevstoreError::MissingField("data"))?,
            },
            Action::Put => ScopedCommand::Put {
                key: require_key(key, "update")?,
                payload: data.ok_or(DevstoreError::MissingField("data"))?,
            },
            Action::Delete => ScopedCommand::Delete {
                key: require_key(key, "deletion")?,
            },
        };
        Ok(Command::Scoped(scoped))
    }
}

/// The developer key comes from `data.developerKey`, else the envelope key.
/// The whole `data` object is kept as registration metadata.
fn set_dev(key: Option<String>, data: Option<Value>) -> DevstoreResult<Command> {
    let metadata = data.unwrap_or_else(|| Value::Object(Map::new()));
    let developer_key = metadata
        .get("developerKey")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or(key)
        .filter(|k| !k.is_empty())
        .ok_or(DevstoreError::MissingDeveloperKey)?;
    Ok(Command::SetDev {
        developer_key,
        metadata,
    })
}

fn require_key(key: Option<String>, purpose: &'static str) -> DevstoreResult<String> {
    key.filter(|k| !k.is_empty())
        .ok_or(DevstoreError::MissingKey(purpose))
}

fn credentials(data: Option<Value>) -> DevstoreResult<Credentials> {
    let data = data.unwrap_or(Value::Null);
    let field = |name: &'static str| {
        data.get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(DevstoreError::MissingField(name))
    };
    Ok(Credentials {
        email: field("email")?,
        password: field("password")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(action: &str, key: Option<&str>, data: Option<Value>) -> Envelope {
        Envelope {
            action: action.to_string(),
            key: key.map(str::to_string),
            data,
        }
    }

    #[test]
    fn action_tags_round_trip() {
        for action in Action::ALL {
            assert_eq!(action.tag().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn unknown_and_lowercase_tags_are_unsupported() {
        for tag in ["PATCH", "signin", ""] {
            let err = Command::try_from(envelope(tag, Some("k"), None)).unwrap_err();
            assert!(matches!(err, DevstoreError::UnsupportedCommand(t) if t == tag));
        }
    }

    #[test]
    fn set_dev_prefers_data_developer_key() {
        let data = json!({"developerKey": "abc", "app": "demo"});
        let cmd = Command::try_from(envelope("SETDEV", Some("ignored"), Some(data.clone()))).unwrap();
        assert_eq!(
            cmd,
            Command::SetDev {
                developer_key: "abc".into(),
                metadata: data
            }
        );
    }

    #[test]
    fn set_dev_falls_back_to_envelope_key() {
        let cmd = Command::try_from(envelope("SETDEV", Some("abc"), None)).unwrap();
        assert!(matches!(cmd, Command::SetDev { developer_key, .. } if developer_key == "abc"));

        let err = Command::try_from(envelope("SETDEV", None, Some(json!({})))).unwrap_err();
        assert!(matches!(err, DevstoreError::MissingDeveloperKey));
    }

    #[test]
    fn delete_without_key_is_missing_key() {
        for key in [None, Some("")] {
            let err = Command::try_from(envelope("DELETE", key, None)).unwrap_err();
            assert!(matches!(err, DevstoreError::MissingKey("deletion")));
        }
    }

    #[test]
    fn credentials_are_required() {
        let err = Command::try_from(envelope("SIGNIN", Some("u1"), Some(json!({"email": "a@x.com"}))))
            .unwrap_err();
        assert!(matches!(err, DevstoreError::MissingField("password")));

        let err = Command::try_from(envelope("CREATEUSER", Some("u1"), None)).unwrap_err();
        assert!(matches!(err, DevstoreError::MissingField("email")));

        let cmd = Command::try_from(envelope(
            "CREATEUSER",
            Some("u1"),
            Some(json!({"email": "a@x.com", "password": "p"})),
        ))
        .unwrap();
        assert_eq!(cmd.action(), Action::CreateUser);
    }

    #[test]
    fn set_requires_data() {
        let err = Command::try_from(envelope("SET", Some("k"), None)).unwrap_err();
        assert!(matches!(err, DevstoreError::MissingField("data")));
    }

    #[test]
    fn envelope_deserializes_from_json() {
        let env: Envelope = serde_json::from_str(r#"{"action":"GET","key":"k"}"#).unwrap();
        let Command::Scoped(cmd) = Command::try_from(env).unwrap() else {
            panic!("expected scoped command");
        };
        assert_eq!(cmd.action(), Action::Get);
        assert_eq!(cmd.key(), "k");
    }
}
