//! Output directory layout and artifact naming.
//!
//! ```text
//! <output>/<classifier>/                      platform directory
//! <output>/<classifier>/phpnar.build.sh       Unix build script
//! <output>/<classifier>/phpnar.install/       Unix install prefix
//! <output>/<classifier>/phpdev/<tc>/<arch>/   Windows arch directory (deps/)
//! <output>/<classifier>/phpdev/<tc>/<arch>/php-<version>/   Windows build root
//! <output>/<artifactId>-<version>-<classifier>[-role].<ext>
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::aol::{Aol, TargetFamily};
use crate::util::config::NarConfig;

/// Name of the generated Unix build script.
pub const UNIX_SCRIPT_NAME: &str = "phpnar.build.sh";

/// Name of the generated Windows build script.
pub const WINDOWS_SCRIPT_NAME: &str = "phpnar.build.cmd";

/// Install prefix directory name for Unix builds.
pub const UNIX_INSTALL_DIR: &str = "phpnar.install";

/// The role of a packaged artifact, encoded as a classifier suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactRole {
    Executable,
    Devel,
    Sdk,
    Deps,
}

impl ArtifactRole {
    /// Suffix appended to the platform classifier.
    pub fn suffix(&self) -> &'static str {
        match self {
            ArtifactRole::Executable => "",
            ArtifactRole::Devel => "-devel",
            ArtifactRole::Sdk => "-sdk",
            ArtifactRole::Deps => "-deps",
        }
    }

    /// Name used in `nar.properties` (`nar.<name>`).
    pub fn nar_type(&self) -> &'static str {
        match self {
            ArtifactRole::Executable => "executable",
            ArtifactRole::Devel => "devel",
            ArtifactRole::Sdk => "sdk",
            ArtifactRole::Deps => "deps",
        }
    }
}

impl fmt::Display for ArtifactRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.nar_type())
    }
}

/// Project identity plus where everything goes on disk.
#[derive(Debug, Clone)]
pub struct Layout {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub classes_dir: PathBuf,
    pub resources_dir: PathBuf,
    /// Windows toolchain directory name, e.g. `vc9`
    pub toolchain: String,
}

impl Layout {
    pub fn from_config(config: &NarConfig) -> Self {
        Layout {
            group_id: config.project.group_id.clone(),
            artifact_id: config.project.artifact_id.clone(),
            version: config.project.version.clone(),
            source_dir: config.project.source_dir.clone(),
            output_dir: config.project.output_dir.clone(),
            classes_dir: config.project.classes_dir.clone(),
            resources_dir: config.project.resources_dir.clone(),
            toolchain: config.windows_toolchain().to_string(),
        }
    }

    /// `<output>/<classifier>`
    pub fn platform_dir(&self, aol: &Aol) -> PathBuf {
        self.output_dir.join(aol.classifier())
    }

    /// `<platform>/phpnar.install`
    pub fn install_dir(&self, aol: &Aol) -> PathBuf {
        self.platform_dir(aol).join(UNIX_INSTALL_DIR)
    }

    /// `<platform>/phpdev/<toolchain>/<arch>`
    pub fn windows_arch_dir(&self, aol: &Aol) -> PathBuf {
        self.platform_dir(aol)
            .join("phpdev")
            .join(&self.toolchain)
            .join(aol.arch())
    }

    /// `<platform>/phpdev/<toolchain>/<arch>/php-<version>`
    pub fn windows_build_root(&self, aol: &Aol) -> PathBuf {
        self.windows_arch_dir(aol)
            .join(format!("php-{}", self.version))
    }

    /// Where sources are staged and the build runs.
    pub fn source_target_dir(&self, aol: &Aol) -> PathBuf {
        match aol.family() {
            TargetFamily::Windows => self.windows_build_root(aol),
            TargetFamily::Unix => self.platform_dir(aol),
        }
    }

    /// `<artifactId>-<version>`
    pub fn base_name(&self) -> String {
        format!("{}-{}", self.artifact_id, self.version)
    }

    /// `<artifactId>-<version>-<classifier><suffix>.<ext>`
    pub fn artifact_file_name(&self, aol: &Aol, role: ArtifactRole, extension: &str) -> String {
        format!(
            "{}-{}{}.{}",
            self.base_name(),
            aol.classifier(),
            role.suffix(),
            extension
        )
    }

    pub fn artifact_path(&self, aol: &Aol, role: ArtifactRole, extension: &str) -> PathBuf {
        self.output_dir
            .join(self.artifact_file_name(aol, role, extension))
    }

    /// `META-INF/nar/<groupId>/<artifactId>/nar.properties` below `base`.
    pub fn nar_properties_in(&self, base: &Path) -> PathBuf {
        base.join("META-INF")
            .join("nar")
            .join(&self.group_id)
            .join(&self.artifact_id)
            .join("nar.properties")
    }

    /// Uppercase toolchain tag used in upstream package names (`VC9`).
    pub fn toolchain_tag(&self) -> String {
        self.toolchain.to_uppercase()
    }
}

/// Windows architecture name as used by the SDK and package names.
pub fn windows_arch(arch: &str) -> &str {
    if arch == "amd64" {
        "x64"
    } else {
        arch
    }
}
