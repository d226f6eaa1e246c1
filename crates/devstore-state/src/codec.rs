//! JSON value encoding for container entries.
//!
//! Every value stored in a container is a JSON document serialized into
//! redb's `&[u8]` value column.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StateResult;

/// Serialize a value into the bytes stored in a container.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> StateResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(map_err!(Serialize))
}

/// Deserialize bytes read from a container.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StateResult<T> {
    serde_json::from_slice(bytes).map_err(map_err!(Deserialize))
}
