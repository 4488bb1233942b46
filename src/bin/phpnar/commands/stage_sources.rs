//! `phpnar stage-sources` command

use anyhow::Result;

use phpnar::ops::stage_sources;

use super::load_pipeline;
use crate::cli::GlobalArgs;

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let mut pipeline = load_pipeline(global)?;
    let copied = stage_sources(&mut pipeline)?;
    tracing::info!("{} files copied", copied);
    Ok(())
}
