//! Build pass: scan → classify/plan → emit.
//!
//! ```text
//! ┌──────────────────────────── plan (in memory) ───────────────────────────┐
//! │ discover_entries → classify → compile_script / compile_styles / copy     │
//! │                  → copy patterns → HTML page → BuildPlan                 │
//! └──────────────────────────────────────────────────────────────────────────┘
//!                                      │ no errors
//!                                      ▼
//! ┌──────────────────────────── emit (filesystem) ──────────────────────────┐
//! │ clear output dir → write artifacts                                       │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```

mod artifact;
mod emit;
mod html;
mod plan;

pub use artifact::{ArtifactBody, ArtifactKind, OutputArtifact};
pub use emit::{emit, progress_label};
pub use plan::{BuildPlan, plan_build};

use crate::config::ProjectConfig;
use crate::core::BuildResult;

/// Plan and emit one pass without progress output.
pub fn build_once(config: &ProjectConfig) -> BuildResult<BuildPlan> {
    let plan = plan_build(config)?;
    emit(&plan, config, None)?;
    Ok(plan)
}
