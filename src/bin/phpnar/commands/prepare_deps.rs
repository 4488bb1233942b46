//! `phpnar prepare-deps` command

use anyhow::Result;

use phpnar::ops::prepare_deps;

use super::load_pipeline;
use crate::cli::GlobalArgs;

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let mut pipeline = load_pipeline(global)?;
    prepare_deps(&mut pipeline)
}
