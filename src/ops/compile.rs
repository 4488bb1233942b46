//! Implementation of `phpnar compile`.

use anyhow::{Context, Result};

use crate::builder::{self, BuildPlan};
use crate::core::aol::TargetFamily;
use crate::ops::Pipeline;

/// Options for the compile stage.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Generate the scripts without running them
    pub scripts_only: bool,
}

/// Generate and run the build script of every selected platform, in
/// declaration order. The first failure stops the run.
pub fn compile(pipeline: &mut Pipeline, opts: &CompileOptions) -> Result<Vec<BuildPlan>> {
    pipeline.resolve_effective()?;

    let layout = pipeline.layout();
    let mut plans = Vec::new();
    for (item, aol) in pipeline.targets() {
        let args = pipeline.configure_args(item, aol)?;
        tracing::info!("configure arguments for {}: {}", aol, args);

        let plan = match aol.family() {
            TargetFamily::Unix => builder::unix::generate(layout, aol, pipeline.flags(), &args)?,
            TargetFamily::Windows => {
                builder::windows::generate(layout, aol, pipeline.config().sdk_target(), &args)?
            }
        };

        if !opts.scripts_only {
            tracing::info!("building {}", aol);
            plan.command()
                .exec_streaming()
                .with_context(|| format!("build of {} failed", aol))?;
        }
        plans.push(plan);
    }
    Ok(plans)
}
