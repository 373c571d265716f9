//! Live reload message protocol.
//!
//! JSON text frames sent from the dev server to browser clients:
//!
//! - `connected`: sent once after the handshake
//! - `reload`: a rebuild succeeded, reload the page
//! - `error`: a rebuild failed, `message` holds the error text

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadMessage {
    Connected {
        /// Server version, shown in the browser console
        version: String,
    },
    Reload,
    Error {
        message: String,
    },
}

impl ReloadMessage {
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> String {
        // Serializing a plain enum of strings cannot fail
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_json() {
        assert_eq!(ReloadMessage::Reload.to_json(), r#"{"type":"reload"}"#);
    }

    #[test]
    fn test_error_json() {
        let json = ReloadMessage::error("missing asset \"a.png\"").to_json();
        assert_eq!(
            json,
            r#"{"type":"error","message":"missing asset \"a.png\""}"#
        );

        let parsed: ReloadMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ReloadMessage::error("missing asset \"a.png\""));
    }

    #[test]
    fn test_connected_carries_version() {
        let json = ReloadMessage::connected().to_json();
        assert!(json.starts_with(r#"{"type":"connected","version":""#));
        assert!(json.contains(env!("CARGO_PKG_VERSION")));
    }
}
