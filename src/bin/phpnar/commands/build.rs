//! `phpnar build` command

use anyhow::Result;

use phpnar::ops::{build, CompileOptions};

use super::load_pipeline;
use crate::cli::{CompileArgs, GlobalArgs};

pub fn execute(global: &GlobalArgs, args: CompileArgs) -> Result<()> {
    let mut pipeline = load_pipeline(global)?;
    if pipeline.matrix().effective_len() == 0 {
        tracing::warn!("no platform of the matrix can be built on this host");
    }

    let artifacts = build(
        &mut pipeline,
        &CompileOptions {
            scripts_only: args.scripts_only,
        },
    )?;
    for artifact in &artifacts {
        println!("{}  {}", artifact.classifier, artifact.path.display());
    }
    Ok(())
}
