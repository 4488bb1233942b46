//! Command implementations

pub mod build;
pub mod compile;
pub mod completions;
pub mod matrix;
pub mod package;
pub mod prepare_deps;
pub mod publish;
pub mod stage_sources;
pub mod validate;

use anyhow::{Context, Result};

use phpnar::ops::Pipeline;
use phpnar::util::config::{find_manifest, Overrides};

use crate::cli::GlobalArgs;

/// Locate the manifest and load the pipeline with the command line overrides.
pub fn load_pipeline(args: &GlobalArgs) -> Result<Pipeline> {
    let manifest_path = match &args.manifest_path {
        Some(path) => path.clone(),
        None => {
            let cwd = std::env::current_dir().context("failed to read current directory")?;
            find_manifest(&cwd)?
        }
    };
    tracing::debug!("using manifest {}", manifest_path.display());

    let overrides = Overrides {
        cross_compile: args.cross_compile,
        cross_compile_windows: args.cross_compile_windows,
        configure_args: args.configure_args.clone(),
        php_sdk_home: args.php_sdk_home.clone(),
    };
    Pipeline::load(&manifest_path, &overrides)
}
