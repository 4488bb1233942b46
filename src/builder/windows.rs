//! Batch scripts driving the Windows SDK build.
//!
//! The script activates the SDK environment, runs `buildconf` and
//! `configure` in the build root and finishes with `nmake snap`, which
//! produces the upstream zip packages picked up by packaging. 64-bit builds
//! need their object directory flattened to `Release_TS` first.

use std::path::PathBuf;

use anyhow::Result;

use crate::builder::{write_script, BuildPlan};
use crate::core::aol::Aol;
use crate::core::layout::{windows_arch, Layout, WINDOWS_SCRIPT_NAME};

/// Everything that goes into a Windows build script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowsScript {
    pub arch: String,
    /// `setenv` target, e.g. `win7`
    pub sdk_target: String,
    pub platform_dir: PathBuf,
    pub build_root: PathBuf,
    pub configure_args: String,
}

impl WindowsScript {
    pub fn render(&self) -> String {
        let mut script = String::new();
        let mut line = |l: &str| {
            script.push_str(l);
            script.push('\n');
        };

        line("@echo off");
        line(&format!(
            "call setenv /{} /{} /release",
            windows_arch(&self.arch),
            self.sdk_target
        ));
        line(&format!("cd \"{}\"", self.platform_dir.display()));
        line(r"call bin\phpsdk_setvars.bat");
        line(&format!("cd \"{}\"", self.build_root.display()));
        line("call buildconf");
        line(r"perl -p -i.bak -e 's/PHP_OBJECT_OUT_DIR = \'x64..\'/PHP_OBJECT_OUT_DIR = \'\'/' configure.js");
        line(&format!("call configure {}", self.configure_args));
        if is_64bit(&self.arch) {
            line("perl -p -i.bak -e 's/BUILD_DIR=(.*)/BUILD_DIR=Release_TS/' Makefile");
            line("mkdir Release_TS");
            line(r"mkdir Release_TS\devel");
            line(r"copy x64\Release_TS\devel Release_TS\devel /Y");
        }
        line("call nmake");
        line("call nmake snap");

        script
    }
}

fn is_64bit(arch: &str) -> bool {
    matches!(arch, "amd64" | "ia64")
}

/// Write `phpnar.build.cmd` into the build root and return how to run it.
pub fn generate(
    layout: &Layout,
    aol: &Aol,
    sdk_target: &str,
    configure_args: &str,
) -> Result<BuildPlan> {
    let platform_dir = layout.platform_dir(aol);
    let build_root = layout.windows_build_root(aol);

    let script = WindowsScript {
        arch: aol.arch().to_string(),
        sdk_target: sdk_target.to_string(),
        platform_dir: platform_dir.clone(),
        build_root: build_root.clone(),
        configure_args: configure_args.to_string(),
    };

    let path = build_root.join(WINDOWS_SCRIPT_NAME);
    write_script(&path, &script.render())?;
    tracing::info!("generated {}", path.display());

    Ok(BuildPlan::Windows {
        script: path,
        workdir: platform_dir,
    })
}
