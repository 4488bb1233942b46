//! `phpnar package` command

use anyhow::Result;

use phpnar::ops::package;

use super::load_pipeline;
use crate::cli::GlobalArgs;

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let mut pipeline = load_pipeline(global)?;
    for artifact in package(&mut pipeline)? {
        println!("{}  {}", artifact.classifier, artifact.path.display());
    }
    Ok(())
}
