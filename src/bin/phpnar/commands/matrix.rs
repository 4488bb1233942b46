//! `phpnar matrix` command

use anyhow::Result;

use phpnar::ops::{describe_matrix, format_matrix};

use super::load_pipeline;
use crate::cli::{GlobalArgs, MatrixArgs};

pub fn execute(global: &GlobalArgs, args: MatrixArgs) -> Result<()> {
    let mut pipeline = load_pipeline(global)?;
    let rows = describe_matrix(&mut pipeline)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print!("{}", format_matrix(&rows));
    }
    Ok(())
}
