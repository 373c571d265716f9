//! Actor Message Definitions
//!
//! ```text
//! FsActor --Rebuild--> BuildActor --Reload/Error--> WsActor
//!    ^                     |
//!    +-----WatchInputs-----+
//! ```

use std::net::TcpStream;
use std::path::PathBuf;

// =============================================================================
// BuildActor Messages
// =============================================================================

/// Messages to Build Actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildMsg {
    /// Sources changed since the last pass
    Rebuild {
        changed: Vec<PathBuf>,
        /// The config file is among the changes
        config_changed: bool,
    },
    Shutdown,
}

// =============================================================================
// FsActor Messages
// =============================================================================

/// Messages to FileSystem Actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsMsg {
    /// Source files read by the last successful pass
    WatchInputs(Vec<PathBuf>),
}

// =============================================================================
// WsActor Messages
// =============================================================================

/// Messages to WebSocket Actor
#[derive(Debug)]
pub enum WsMsg {
    /// Rebuild succeeded
    Reload,
    /// Rebuild failed with this message
    Error(String),
    /// Accepted socket, handshake pending
    AddClient(TcpStream),
    Shutdown,
}
