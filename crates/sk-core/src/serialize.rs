//! Structural serializer.
//!
//! Text form (serde_json) is what goes to the clipboard. The binary form
//! (MessagePack with field names) is only used to deep-clone a value: the
//! round trip drops every `Arc` sharing, so the clone shares nothing with
//! its source.

use crate::error::CoreError;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub fn to_text<T: Serialize>(value: &T) -> Result<String, CoreError> {
    Ok(serde_json::to_string(value)?)
}

pub fn from_text<T: DeserializeOwned>(text: &str) -> Result<T, CoreError> {
    Ok(serde_json::from_str(text)?)
}

/// Clone `value` through its binary encoding.
pub fn deep_clone<T: Serialize + DeserializeOwned>(value: &T) -> Result<T, CoreError> {
    let bytes = rmp_serde::to_vec_named(value)?;
    Ok(rmp_serde::from_slice(&bytes)?)
}
