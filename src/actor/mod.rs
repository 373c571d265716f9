//! Actor System for Watch Mode
//!
//! Message-passing concurrency for `sprig serve`:
//!
//! ```text
//! FsActor --> BuildActor --> WsActor
//! (watch)     (rebuild)     (broadcast)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `builder` - Coalescing rebuilds, single writer of the output tree
//! - `ws` - WebSocket broadcast
//! - `coordinator` - Wires up and runs actors

pub mod builder;
pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod ws;

pub use coordinator::Coordinator;
