//! Implementation of `phpnar publish-metadata`.
//!
//! Downstream NAR consumers locate platform artifacts through
//! `META-INF/nar/<groupId>/<artifactId>/nar.properties`. Every declared
//! platform is recorded, including the ones this host skipped, so a single
//! metadata file describes the whole matrix.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::aol::TargetFamily;
use crate::core::layout::ArtifactRole;
use crate::ops::Pipeline;
use crate::util::properties::Properties;

/// NAR packaging type used in artifact coordinates.
const NAR_TYPE: &str = "nar";

/// Build the registry for the whole declared matrix.
///
/// Entries from a hand-written `nar.properties` in the resources directory
/// are kept unless overwritten.
pub fn nar_properties(pipeline: &mut Pipeline) -> Result<Properties> {
    pipeline.resolve_all()?;

    let layout = pipeline.layout();
    let existing = layout.nar_properties_in(&layout.resources_dir);
    let mut props = if existing.is_file() {
        tracing::debug!("extending {}", existing.display());
        Properties::load(&existing)?
    } else {
        Properties::new()
    };

    let executable = ArtifactRole::Executable.nar_type();
    props.set("libs.binding", executable);

    for (_, aol) in pipeline.matrix().resolved_original() {
        let key = aol.key();
        props.set(format!("{}.output", key), layout.base_name());
        props.set(format!("{}.libs.binding", key), executable);

        let mut roles = vec![ArtifactRole::Executable, ArtifactRole::Devel];
        if aol.family() == TargetFamily::Windows {
            roles.extend([ArtifactRole::Sdk, ArtifactRole::Deps]);
        }
        for role in roles {
            props.set(
                format!("{}.nar.{}", key, role.nar_type()),
                format!(
                    "{}:{}:{}:${{aol}}{}",
                    layout.group_id,
                    layout.artifact_id,
                    NAR_TYPE,
                    role.suffix()
                ),
            );
        }
    }

    Ok(props)
}

/// Write `nar.properties` below the classes directory. Returns its path.
pub fn publish_metadata(pipeline: &mut Pipeline) -> Result<PathBuf> {
    let props = nar_properties(pipeline)?;

    let layout = pipeline.layout();
    let path = layout.nar_properties_in(&layout.classes_dir);
    let header = format!(
        "NAR Properties for {}:{}:{}",
        layout.group_id, layout.artifact_id, layout.version
    );
    props.store(&path, Some(&header))?;
    tracing::info!("wrote {}", path.display());

    Ok(path)
}
