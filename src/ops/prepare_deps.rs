//! Implementation of `phpnar prepare-deps`.

use anyhow::{Context, Result};

use crate::core::aol::TargetFamily;
use crate::ops::Pipeline;
use crate::util::errors::NarError;
use crate::util::fs::{copy_dir_all, ensure_dir};

/// Create the platform directories and stage the Windows SDK and
/// dependency bundle.
///
/// The SDK is copied unless the platform directory already has
/// `bin/bison.exe`; the deps bundle unless `deps/` already exists.
pub fn prepare_deps(pipeline: &mut Pipeline) -> Result<()> {
    pipeline.resolve_effective()?;

    let layout = pipeline.layout();
    for (item, aol) in pipeline.targets() {
        let platform_dir = layout.platform_dir(aol);
        ensure_dir(&platform_dir)?;

        if aol.family() != TargetFamily::Windows {
            continue;
        }

        if !platform_dir.join("bin/bison.exe").exists() {
            let sdk_home = pipeline.config().windows.php_sdk_home.as_ref().ok_or_else(|| {
                NarError::PrerequisiteMissing("Windows builds need `php-sdk-home`".into())
            })?;
            tracing::info!("copying php-sdk to {}", platform_dir.display());
            copy_dir_all(sdk_home, &platform_dir)
                .with_context(|| format!("failed to stage php-sdk for {}", aol))?;
        }

        let arch_dir = layout.windows_arch_dir(aol);
        ensure_dir(&arch_dir)?;

        let deps_dir = arch_dir.join("deps");
        if !deps_dir.exists() {
            let deps = item.deps_folder.as_ref().ok_or_else(|| {
                NarError::PrerequisiteMissing(format!("Windows build {} needs a `deps-folder`", aol))
            })?;
            tracing::info!("copying dependencies to {}", deps_dir.display());
            copy_dir_all(deps, &deps_dir)
                .with_context(|| format!("failed to stage dependencies for {}", aol))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aol::HostPlatform;
    use crate::ops::pipeline::tests::config;
    use std::fs;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
[project]
group-id = "g"
artifact-id = "php"
version = "5.3.10"

[windows]
php-sdk-home = "sdk"

[[aol]]
arch = "x86"
os = "Windows"
deps-folder = "deps"
"#;

    fn fixture(root: &std::path::Path) {
        fs::create_dir_all(root.join("sdk/bin")).unwrap();
        fs::create_dir_all(root.join("sdk/script")).unwrap();
        fs::write(root.join("sdk/bin/bison.exe"), "bison").unwrap();
        fs::write(root.join("sdk/script/conf_tools.bat"), "").unwrap();
        fs::create_dir_all(root.join("deps/include")).unwrap();
        fs::create_dir_all(root.join("deps/lib")).unwrap();
        fs::write(root.join("deps/lib/zlib.lib"), "z").unwrap();
    }

    #[test]
    fn test_stages_sdk_and_deps() {
        let tmp = TempDir::new().unwrap();
        fixture(tmp.path());
        let mut pipeline =
            Pipeline::new(config(tmp.path(), MANIFEST), HostPlatform::new("Windows", "x86")).unwrap();

        prepare_deps(&mut pipeline).unwrap();

        let platform = tmp.path().join("target/x86-Windows-msvc");
        assert!(platform.join("bin/bison.exe").exists());
        assert!(platform.join("script/conf_tools.bat").exists());
        assert_eq!(
            fs::read_to_string(platform.join("phpdev/vc9/x86/deps/lib/zlib.lib")).unwrap(),
            "z"
        );
    }

    #[test]
    fn test_existing_staging_is_kept() {
        let tmp = TempDir::new().unwrap();
        fixture(tmp.path());
        let mut pipeline =
            Pipeline::new(config(tmp.path(), MANIFEST), HostPlatform::new("Windows", "x86")).unwrap();
        prepare_deps(&mut pipeline).unwrap();

        let staged = tmp.path().join("target/x86-Windows-msvc/bin/bison.exe");
        fs::write(&staged, "patched").unwrap();
        fs::write(tmp.path().join("deps/lib/zlib.lib"), "new").unwrap();

        prepare_deps(&mut pipeline).unwrap();
        assert_eq!(fs::read_to_string(&staged).unwrap(), "patched");
        assert_eq!(
            fs::read_to_string(
                tmp.path()
                    .join("target/x86-Windows-msvc/phpdev/vc9/x86/deps/lib/zlib.lib")
            )
            .unwrap(),
            "z"
        );
    }

    #[test]
    fn test_unix_only_gets_platform_dir() {
        let tmp = TempDir::new().unwrap();
        let manifest = "[project]\ngroup-id = \"g\"\nartifact-id = \"a\"\nversion = \"1\"\n";
        let mut pipeline =
            Pipeline::new(config(tmp.path(), manifest), HostPlatform::new("Linux", "amd64")).unwrap();

        prepare_deps(&mut pipeline).unwrap();
        assert!(tmp.path().join("target/amd64-Linux-gpp").is_dir());
    }
}
