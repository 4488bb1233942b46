//! `phpnar validate` command

use anyhow::Result;

use phpnar::ops::validate;

use super::load_pipeline;
use crate::cli::GlobalArgs;

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let mut pipeline = load_pipeline(global)?;
    validate(&mut pipeline)?;

    for (_, aol) in pipeline.targets() {
        println!("{} ok", aol);
    }
    Ok(())
}
