//! Implementation of `phpnar validate`.

use anyhow::Result;

use crate::core::aol::TargetFamily;
use crate::ops::Pipeline;
use crate::util::errors::NarError;
use crate::util::process::find_executable;

/// Resolve every selected platform and check the Windows prerequisites.
pub fn validate(pipeline: &mut Pipeline) -> Result<()> {
    pipeline.resolve_effective()?;

    let sdk_home = pipeline.config().windows.php_sdk_home.clone();
    for (item, aol) in pipeline.targets() {
        if aol.family() != TargetFamily::Windows {
            continue;
        }

        let sdk_home = sdk_home.as_ref().ok_or_else(|| {
            NarError::PrerequisiteMissing(
                "Windows builds need `php-sdk-home` in [windows] or --php-sdk-home".into(),
            )
        })?;
        let deps = item.deps_folder.as_ref().ok_or_else(|| {
            NarError::PrerequisiteMissing(format!(
                "Windows build {} needs a `deps-folder` (or `php-deps-home` in [windows])",
                aol
            ))
        })?;

        if !sdk_home.join("bin/bison.exe").exists()
            || !sdk_home.join("script/conf_tools.bat").exists()
        {
            return Err(NarError::PrerequisiteMissing(format!(
                "{} is not a php-sdk; expected bin/bison.exe and script/conf_tools.bat",
                sdk_home.display()
            ))
            .into());
        }

        if !deps.join("include").exists() || !deps.join("lib").exists() {
            return Err(NarError::PrerequisiteMissing(format!(
                "{} does not contain php dependencies; expected include/ and lib/",
                deps.display()
            ))
            .into());
        }

        if find_executable("setenv.cmd").is_none() {
            return Err(NarError::PrerequisiteMissing(
                "setenv.cmd not found on PATH; install the Windows SDK and add it to PATH".into(),
            )
            .into());
        }

        tracing::debug!("{} prerequisites ok", aol);
    }

    Ok(())
}
