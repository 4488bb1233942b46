//! `phpnar compile` command

use anyhow::Result;

use phpnar::ops::{compile, CompileOptions};

use super::load_pipeline;
use crate::cli::{CompileArgs, GlobalArgs};

pub fn execute(global: &GlobalArgs, args: CompileArgs) -> Result<()> {
    let mut pipeline = load_pipeline(global)?;
    let opts = CompileOptions {
        scripts_only: args.scripts_only,
    };

    let plans = compile(&mut pipeline, &opts)?;
    if opts.scripts_only {
        for plan in &plans {
            println!("{}", plan.script().display());
        }
    }
    Ok(())
}
