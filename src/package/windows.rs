//! Packaging of a Windows SDK build.
//!
//! `nmake snap` already produces zip packages for the binaries and the
//! developer pack; those are copied as they are. The SDK tools and the
//! dependency bundle are archived here. Windows packages are always zip
//! containers regardless of the configured format.

use std::path::Path;

use anyhow::Result;

use crate::core::aol::Aol;
use crate::core::layout::{windows_arch, ArtifactRole, Layout};
use crate::core::version::ProductVersion;
use crate::package::archive::{write_archive, write_archive_if_stale, ArchiveSpec};
use crate::package::legacy;
use crate::package::PackagedArtifact;
use crate::util::config::ArchiveFormat;
use crate::util::errors::NarError;
use crate::util::fs::{copy_file_if_modified, remove_file_if_exists};

pub fn package(
    layout: &Layout,
    aol: &Aol,
    version: &ProductVersion,
) -> Result<Vec<PackagedArtifact>> {
    let format = ArchiveFormat::Nar;
    let ext = format.extension();
    let arch = windows_arch(aol.arch());
    let tag = layout.toolchain_tag();
    let build_root = layout.windows_build_root(aol);
    let release_dir = build_root.join("Release_TS");
    let v = version.as_str();

    let mut artifacts = Vec::new();

    let executable_zip = release_dir.join(format!("php-{}-Win32-{}-{}.zip", v, tag, arch));
    if !executable_zip.exists() {
        return Err(NarError::missing_output("executable package", executable_zip).into());
    }
    let platform_dir = layout.platform_dir(aol);
    let sdk_tools = platform_dir.join("bin");
    if !sdk_tools.is_dir() {
        return Err(NarError::missing_output("php-sdk tools", sdk_tools).into());
    }
    let deps_dir = layout.windows_arch_dir(aol).join("deps");
    if !deps_dir.is_dir() {
        return Err(NarError::missing_output("dependency bundle", deps_dir).into());
    }

    let executable = layout.artifact_path(aol, ArtifactRole::Executable, ext);
    copy_file_if_modified(&executable_zip, &executable)?;
    artifacts.push(PackagedArtifact::new(aol, ArtifactRole::Executable, executable));

    let devel_zip = release_dir.join(format!("php-devel-pack-{}-Win32-{}-{}.zip", v, tag, arch));
    ensure_devel_pack(&build_root, &devel_zip, version, &tag, arch)?;
    let devel = layout.artifact_path(aol, ArtifactRole::Devel, ext);
    copy_file_if_modified(&devel_zip, &devel)?;
    artifacts.push(PackagedArtifact::new(aol, ArtifactRole::Devel, devel));

    let sdk = layout.artifact_path(aol, ArtifactRole::Sdk, ext);
    let spec = ArchiveSpec::new()
        .path(&sdk_tools, "/bin")
        .path(platform_dir.join("script"), "/script");
    write_archive_if_stale(&spec, &sdk, format)?;
    artifacts.push(PackagedArtifact::new(aol, ArtifactRole::Sdk, sdk));

    let deps = layout.artifact_path(aol, ArtifactRole::Deps, ext);
    let spec = ArchiveSpec::new().path(&deps_dir, "/deps");
    write_archive_if_stale(&spec, &deps, format)?;
    artifacts.push(PackagedArtifact::new(aol, ArtifactRole::Deps, deps));

    Ok(artifacts)
}

/// Make sure the upstream developer pack exists, synthesizing it for
/// legacy versions.
///
/// A legacy build tree without `win32/build/config.w32.phpize.in` produced
/// an unusable pack, so an existing one is replaced.
fn ensure_devel_pack(
    build_root: &Path,
    devel_zip: &Path,
    version: &ProductVersion,
    tag: &str,
    arch: &str,
) -> Result<()> {
    let legacy = version.is_legacy_devel_pack();
    let incomplete = !build_root
        .join("win32/build/config.w32.phpize.in")
        .exists();

    if legacy && incomplete && devel_zip.exists() {
        tracing::info!("regenerating incomplete developer pack {}", devel_zip.display());
        remove_file_if_exists(devel_zip)?;
    }

    if devel_zip.exists() {
        return Ok(());
    }
    if !legacy {
        return Err(NarError::missing_output("developer package", devel_zip).into());
    }

    tracing::info!("synthesizing developer pack for {}", version.as_str());
    let spec = legacy::devel_pack_spec(build_root, version, tag, arch);
    write_archive(&spec, devel_zip, ArchiveFormat::Nar)
}
