//! Implementation of `phpnar stage-sources`.

use anyhow::{bail, Context, Result};

use crate::ops::Pipeline;
use crate::util::fs::copy_dir_if_modified;

/// Copy the source tree into every selected platform's build directory.
///
/// Only files newer than their staged copy are copied, so an interrupted
/// build keeps its generated files. Returns the number of files copied.
pub fn stage_sources(pipeline: &mut Pipeline) -> Result<usize> {
    pipeline.resolve_effective()?;

    let layout = pipeline.layout();
    if !layout.source_dir.is_dir() {
        bail!(
            "source directory {} does not exist\n\
             hint: extract the PHP sources there or set `source-dir` in [project]",
            layout.source_dir.display()
        );
    }

    let mut total = 0;
    for (_, aol) in pipeline.targets() {
        let target = layout.source_target_dir(aol);
        tracing::info!("copying (modified) sources to {}", target.display());
        let copied = copy_dir_if_modified(&layout.source_dir, &target)
            .with_context(|| format!("failed to stage sources for {}", aol))?;
        tracing::debug!("{} files copied for {}", copied, aol);
        total += copied;
    }
    Ok(total)
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

[build]
cross-compile = true

[[aol]]
arch = "amd64"
os = "Linux"

[[aol]]
arch = "amd64"
os = "Windows"
"#;

    #[test]
    fn test_sources_land_in_family_specific_dirs() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src/main/php");
        fs::create_dir_all(src.join("main")).unwrap();
        fs::write(src.join("configure.in"), "AC_INIT").unwrap();
        fs::write(src.join("main/php.h"), "").unwrap();

        let mut pipeline =
            Pipeline::new(config(tmp.path(), MANIFEST), HostPlatform::new("Linux", "amd64")).unwrap();
        assert_eq!(stage_sources(&mut pipeline).unwrap(), 4);

        let target = tmp.path().join("target");
        assert!(target.join("amd64-Linux-gpp/configure.in").exists());
        assert!(target
            .join("amd64-Windows-msvc/phpdev/vc9/amd64/php-5.3.10/main/php.h")
            .exists());

        // Nothing changed, nothing copied.
        assert_eq!(stage_sources(&mut pipeline).unwrap(), 0);
    }

    #[test]
    fn test_missing_source_dir() {
        let tmp = TempDir::new().unwrap();
        let mut pipeline =
            Pipeline::new(config(tmp.path(), MANIFEST), HostPlatform::new("Linux", "amd64")).unwrap();
        let err = stage_sources(&mut pipeline).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
