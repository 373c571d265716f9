//! Live reload over WebSocket.
//!
//! ```text
//! BuildActor --Reload/Error--> WsActor --JSON--> hotreload.js
//!                                 ^
//!              server (accept) ---+ AddClient
//! ```
//!
//! - `message` - JSON messages understood by the browser client
//! - `server` - listener binding and the accept thread

pub mod message;
pub mod server;

pub use message::ReloadMessage;
