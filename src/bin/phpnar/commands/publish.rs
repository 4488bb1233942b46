//! `phpnar publish-metadata` command

use anyhow::Result;

use phpnar::ops::publish_metadata;

use super::load_pipeline;
use crate::cli::GlobalArgs;

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let mut pipeline = load_pipeline(global)?;
    let path = publish_metadata(&mut pipeline)?;
    println!("{}", path.display());
    Ok(())
}
