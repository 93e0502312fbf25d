use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

use crate::plan::Step;

/// Runs one external step to completion.
pub trait StepRunner {
    /// `Ok(true)` on a zero exit status, `Ok(false)` on any other exit,
    /// `Err` when the program could not be started.
    fn run(&mut self, step: &Step, dir: &Path) -> Result<bool>;
}

/// Spawns real processes with the terminal attached, so make output streams live.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl StepRunner for SystemRunner {
    fn run(&mut self, step: &Step, dir: &Path) -> Result<bool> {
        tracing::info!(%step, dir = %dir.display(), "running");

        let status = Command::new(step.program)
            .args(&step.args)
            .current_dir(dir)
            .status()
            .with_context(|| {
                format!(
                    "Failed to run '{}'. Is {} installed and on PATH?",
                    step, step.program
                )
            })?;

        tracing::info!(%step, code = ?status.code(), "finished");
        Ok(status.success())
    }
}
