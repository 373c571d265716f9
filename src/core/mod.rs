//! Core types shared across the codebase.

mod error;
mod state;

pub use error::{BuildError, BuildResult};
pub use state::{build_error, is_shutdown, register_server, set_build_result, setup_shutdown_handler};
