//! Wire format shared by the relay server and its clients.
//!
//! Clients send JSON objects discriminated by a `type` field. The server only
//! ever sends plain text notices, one per frame.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Inbound frame that could not be read as an [`InboundEvent`].
#[derive(Debug, thiserror::Error)]
#[error("malformed message: {0}")]
pub struct MalformedMessage(#[from] serde_json::Error);

/// A message received from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundEvent {
    /// Announce the display name for this connection.
    Join { username: String },
    /// A chat line to relay to everyone else.
    Chat { message: String },
    /// Any `type` the relay does not understand.
    #[serde(other)]
    Unknown,
}

impl InboundEvent {
    /// Parse a text frame.
    ///
    /// An unrecognised `type` yields [`InboundEvent::Unknown`]. Invalid JSON, a
    /// missing `type`, or a known `type` without its fields is a
    /// [`MalformedMessage`].
    pub fn parse(text: &str) -> Result<Self, MalformedMessage> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn join(username: impl Into<String>) -> Self {
        Self::Join {
            username: username.into(),
        }
    }

    pub fn chat(message: impl Into<String>) -> Self {
        Self::Chat {
            message: message.into(),
        }
    }

    /// Serialize for sending over the wire.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A text notice pushed from the server to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Joined { name: String },
    Chat { name: String, message: String },
    Left { name: String },
}

impl Notice {
    pub fn joined(name: impl Into<String>) -> Self {
        Self::Joined { name: name.into() }
    }

    pub fn chat(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Chat {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn left(name: impl Into<String>) -> Self {
        Self::Left { name: name.into() }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Joined { name } => write!(f, "\"{name}\" has joined the chat!"),
            Notice::Chat { name, message } => write!(f, "> {name}: {message}"),
            Notice::Left { name } => write!(f, "\"{name}\" has left the chat!"),
        }
    }
}
