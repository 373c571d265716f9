//! One-shot build: `sprig build`.
//!
//! Phases:
//! - **Plan** - discover entries, compile scripts and styles, collect copies
//! - **Emit** - clear the output directory, write the plan
//! - **Report** - artifact counts and elapsed time

use std::time::Instant;

use anyhow::Result;

use crate::config::ProjectConfig;
use crate::{debug, log};
use crate::logger::ProgressLine;
use crate::pipeline::{ArtifactKind, BuildPlan, emit, plan_build, progress_label};

/// Build the project once, reporting progress unless `quiet`.
pub fn build_project(config: &ProjectConfig, quiet: bool) -> Result<BuildPlan> {
    let started = Instant::now();

    let plan = plan_build(config)?;
    debug!("build"; "{} source files read", plan.inputs().len());
    let progress = create_progress(&plan, quiet);
    emit(&plan, config, progress.as_ref())?;
    if let Some(p) = progress {
        p.finish();
    }

    if !quiet {
        log!(
            "build";
            "{} from {} in {}ms -> {}",
            plural_count(plan.artifacts().len(), "file"),
            plural_count(plan.entry_count(), "entry"),
            started.elapsed().as_millis(),
            config.root_relative(&config.build.output).display()
        );
    }
    Ok(plan)
}

fn create_progress(plan: &BuildPlan, quiet: bool) -> Option<ProgressLine> {
    if quiet {
        return None;
    }

    let assets: usize = [
        ArtifactKind::Font,
        ArtifactKind::Image,
        ArtifactKind::Icon,
        ArtifactKind::Passthrough,
    ]
    .into_iter()
    .map(|kind| plan.count(kind))
    .sum();

    Some(ProgressLine::new(&[
        (progress_label(ArtifactKind::Script), plan.count(ArtifactKind::Script)),
        (progress_label(ArtifactKind::Style), plan.count(ArtifactKind::Style)),
        (progress_label(ArtifactKind::Image), assets),
        (progress_label(ArtifactKind::Html), plan.count(ArtifactKind::Html)),
    ]))
}

fn plural_count(count: usize, noun: &str) -> String {
    match (count, noun.strip_suffix('y')) {
        (1, _) => format!("1 {noun}"),
        (_, Some(stem)) => format!("{count} {stem}ies"),
        _ => format!("{count} {noun}s"),
    }
}
