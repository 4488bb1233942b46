//! Packaging of build output into NAR artifacts.

pub mod archive;
pub mod legacy;
pub mod unix;
pub mod windows;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::aol::{Aol, TargetFamily};
use crate::core::layout::{ArtifactRole, Layout};
use crate::core::version::ProductVersion;
use crate::util::config::ArchiveFormat;
use crate::util::fs::write_string;

/// File name of the artifact manifest in the output root.
pub const ARTIFACT_MANIFEST: &str = "nar-artifacts.json";

/// A produced package and what it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagedArtifact {
    pub role: String,
    /// Platform classifier plus role suffix, e.g. `amd64-Linux-gpp-devel`
    pub classifier: String,
    pub path: PathBuf,
}

impl PackagedArtifact {
    pub(crate) fn new(aol: &Aol, role: ArtifactRole, path: PathBuf) -> Self {
        PackagedArtifact {
            role: role.nar_type().to_string(),
            classifier: format!("{}{}", aol.classifier(), role.suffix()),
            path,
        }
    }
}

/// Package one resolved platform.
pub fn package_platform(
    layout: &Layout,
    aol: &Aol,
    version: &ProductVersion,
    format: ArchiveFormat,
) -> Result<Vec<PackagedArtifact>> {
    match aol.family() {
        TargetFamily::Unix => unix::package(layout, aol, version, format),
        TargetFamily::Windows => windows::package(layout, aol, version),
    }
}

/// Write the list of packaged artifacts as JSON.
pub fn write_manifest(path: &Path, artifacts: &[PackagedArtifact]) -> Result<()> {
    let json = serde_json::to_string_pretty(artifacts)
        .context("failed to serialize artifact manifest")?;
    write_string(path, &format!("{}\n", json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::layout::tests::resolved;
    use tempfile::TempDir;

    #[test]
    fn test_artifact_classifier() {
        let aol = resolved("amd64", "Windows");
        let artifact = PackagedArtifact::new(&aol, ArtifactRole::Sdk, PathBuf::from("x.nar"));
        assert_eq!(artifact.classifier, "amd64-Windows-msvc-sdk");
        assert_eq!(artifact.role, "sdk");
    }

    #[test]
    fn test_manifest_json() {
        let tmp = TempDir::new().unwrap();
        let aol = resolved("amd64", "Linux");
        let artifacts = vec![PackagedArtifact::new(
            &aol,
            ArtifactRole::Executable,
            PathBuf::from("/t/php-5.3.10-amd64-Linux-gpp.nar"),
        )];
        let path = tmp.path().join(ARTIFACT_MANIFEST);
        write_manifest(&path, &artifacts).unwrap();

        let read: Vec<PackagedArtifact> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read, artifacts);
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("\"classifier\": \"amd64-Linux-gpp\""));
    }
}
