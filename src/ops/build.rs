//! Implementation of `phpnar build`.

use anyhow::Result;

use crate::ops::{
    compile, package, prepare_deps, publish_metadata, stage_sources, validate, CompileOptions,
    PackagedArtifact, Pipeline,
};

/// Run every stage in order, stopping at the first failure.
pub fn build(pipeline: &mut Pipeline, opts: &CompileOptions) -> Result<Vec<PackagedArtifact>> {
    validate(pipeline)?;
    prepare_deps(pipeline)?;
    stage_sources(pipeline)?;
    compile(pipeline, opts)?;
    if opts.scripts_only {
        return Ok(Vec::new());
    }
    let artifacts = package(pipeline)?;
    publish_metadata(pipeline)?;
    Ok(artifacts)
}
