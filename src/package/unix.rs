//! Packaging of a `make install` tree.

use anyhow::Result;

use crate::core::aol::Aol;
use crate::core::layout::{ArtifactRole, Layout};
use crate::core::version::ProductVersion;
use crate::package::archive::{write_archive_if_stale, ArchiveSpec};
use crate::package::PackagedArtifact;
use crate::util::config::ArchiveFormat;
use crate::util::errors::NarError;

/// Build the executable and devel archives from the install prefix.
///
/// Both are validated before either archive is written.
pub fn package(
    layout: &Layout,
    aol: &Aol,
    version: &ProductVersion,
    format: ArchiveFormat,
) -> Result<Vec<PackagedArtifact>> {
    let root = layout.install_dir(aol);
    let libphp = version.embed_library();

    if !root.join("bin/php").exists() && !root.join("bin/php-cgi").exists() {
        return Err(
            NarError::missing_output("executables bin/php and bin/php-cgi", root.join("bin")).into(),
        );
    }
    let lib = root.join("lib").join(libphp);
    if !lib.exists() {
        return Err(NarError::missing_output(format!("library lib/{}", libphp), lib).into());
    }
    if !root.join("include").is_dir() {
        return Err(NarError::missing_output("include directory", root.join("include")).into());
    }

    let mut artifacts = Vec::new();

    let executable = layout.artifact_path(aol, ArtifactRole::Executable, format.extension());
    let spec = ArchiveSpec::new()
        .path(root.join("bin/php"), "/bin/php")
        .path(root.join("bin/php-cgi"), "/bin/php-cgi")
        .path(root.join("modules"), "/modules");
    write_archive_if_stale(&spec, &executable, format)?;
    artifacts.push(PackagedArtifact::new(aol, ArtifactRole::Executable, executable));

    let devel = layout.artifact_path(aol, ArtifactRole::Devel, format.extension());
    let spec = ArchiveSpec::new()
        .filtered(root.join("bin/php-config"), "/bin/php-config", &root)
        .filtered(root.join("bin/phpize"), "/bin/phpize", &root)
        .path(&lib, &format!("/lib/{}", libphp))
        .path(root.join("include"), "/include");
    write_archive_if_stale(&spec, &devel, format)?;
    artifacts.push(PackagedArtifact::new(aol, ArtifactRole::Devel, devel));

    Ok(artifacts)
}
