//! Call and announcement frames.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{RemoteError, Result};

/// One remote invocation: `{"action": "<name>", "args": [...]}`.
///
/// `args` holds only the caller-supplied values, in order. Parameters the
/// receiving side injects itself never travel over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallMessage {
    /// Name of the method to run on the receiving side.
    pub action: String,
    /// Positional data arguments. A missing or `null` list is empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub args: Vec<Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl CallMessage {
    /// Creates a call message.
    #[must_use]
    pub fn new(action: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            action: action.into(),
            args,
        }
    }

    /// Decodes an inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::MalformedMessage`] if the text is not JSON or
    /// lacks an `action`.
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(RemoteError::MalformedMessage)
    }

    /// Encodes this message as a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Serialization`] if encoding fails.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Names of the methods this side accepts: `{"exports": [...]}`.
///
/// Informational only; the peer is not required to honour it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportsAnnouncement {
    /// Exported method names, sorted.
    pub exports: BTreeSet<String>,
}

impl ExportsAnnouncement {
    /// Creates an announcement for the given names.
    #[must_use]
    pub fn new(exports: BTreeSet<String>) -> Self {
        Self { exports }
    }
}
