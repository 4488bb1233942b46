//! Implementation of `phpnar package`.

use anyhow::{Context, Result};

use crate::ops::Pipeline;
use crate::package::{package_platform, write_manifest, PackagedArtifact, ARTIFACT_MANIFEST};

/// Package every selected platform and write `nar-artifacts.json`.
pub fn package(pipeline: &mut Pipeline) -> Result<Vec<PackagedArtifact>> {
    pipeline.resolve_effective()?;

    let layout = pipeline.layout();
    let format = pipeline.config().archive_format();
    let mut artifacts = Vec::new();
    for (_, aol) in pipeline.targets() {
        let packaged = package_platform(layout, aol, pipeline.version(), format)
            .with_context(|| format!("failed to package {}", aol))?;
        artifacts.extend(packaged);
    }

    let manifest = layout.output_dir.join(ARTIFACT_MANIFEST);
    write_manifest(&manifest, &artifacts)?;
    tracing::info!("{} artifacts recorded in {}", artifacts.len(), manifest.display());

    Ok(artifacts)
}
