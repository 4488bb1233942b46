//! configure/make/make install scripts for Unix-like targets.

use std::path::Path;

use anyhow::{Context, Result};

use crate::builder::{write_script, BuildPlan};
use crate::core::aol::Aol;
use crate::core::flags::FlagTable;
use crate::core::layout::{Layout, UNIX_SCRIPT_NAME};
use crate::util::errors::NarError;
use crate::util::fs::make_executable;
use crate::util::process::ProcessBuilder;

/// Everything that goes into a Unix build script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnixScript {
    pub install_dir: String,
    pub configure_args: String,
    /// Output of `config.guess`
    pub build_triple: String,
    pub host_triple: String,
    pub arch_flags: String,
    pub c_options: String,
    pub cpp_options: String,
}

impl UnixScript {
    /// Collect the script inputs for `aol` from the flag table.
    ///
    /// `HostOs` and `ArchFlags` are required; compiler options default to
    /// empty and lose any `-Wall`.
    pub fn for_platform(
        aol: &Aol,
        flags: &FlagTable,
        install_dir: &Path,
        configure_args: &str,
        build_triple: &str,
    ) -> Result<Self, NarError> {
        let host_triple = aol.require_property(flags, "HostOs")?;
        let arch_flags = aol.require_property(flags, "ArchFlags")?;
        let c_options = aol.property(flags, "c.options").unwrap_or("");
        let cpp_options = aol.property(flags, "cpp.options").unwrap_or("");

        Ok(UnixScript {
            install_dir: install_dir.display().to_string(),
            configure_args: configure_args.to_string(),
            build_triple: build_triple.trim().to_string(),
            host_triple: host_triple.to_string(),
            arch_flags: arch_flags.to_string(),
            c_options: strip_wall(c_options),
            cpp_options: strip_wall(cpp_options),
        })
    }

    pub fn render(&self) -> String {
        format!(
            "./configure --prefix=\"{install}\" {args} --build={build} --host={host} \
             CFLAGS='{arch} {c}' CXXFLAGS='{arch} {cpp}' LDFLAGS='{arch}{ld}'\n\
             make\n\
             make install\n",
            install = self.install_dir,
            args = self.configure_args,
            build = self.build_triple,
            host = self.host_triple,
            arch = self.arch_flags,
            c = self.c_options,
            cpp = self.cpp_options,
            ld = extra_ldflags(&self.arch_flags),
        )
    }
}

/// Remove `-Wall` tokens from a compiler option string.
pub fn strip_wall(options: &str) -> String {
    options
        .split_whitespace()
        .filter(|token| *token != "-Wall")
        .collect::<Vec<_>>()
        .join(" ")
}

/// Library search path matching the word size selected by `arch_flags`.
pub fn extra_ldflags(arch_flags: &str) -> &'static str {
    let mut tokens = arch_flags.split_whitespace();
    if tokens.clone().any(|t| t == "-m32") {
        " -L/usr/lib32"
    } else if tokens.any(|t| t == "-m64") {
        " -L/usr/lib64"
    } else {
        ""
    }
}

/// Make the staged tree runnable and regenerate `configure`.
///
/// Returns the build triple reported by `config.guess`.
pub fn prepare_tree(platform_dir: &Path) -> Result<String> {
    for helper in ["config.guess", "buildconf"] {
        let path = platform_dir.join(helper);
        if path.exists() {
            make_executable(&path)?;
        }
    }

    let build_dir = platform_dir.join("build");
    if build_dir.is_dir() {
        for entry in std::fs::read_dir(&build_dir)
            .with_context(|| format!("failed to read {}", build_dir.display()))?
        {
            let path = entry?.path();
            if path.is_file() {
                make_executable(&path)?;
            }
        }
    }

    let build_triple = ProcessBuilder::new(platform_dir.join("config.guess"))
        .cwd(platform_dir)
        .exec_streaming()
        .context("failed to find the build host triple (config.guess)")?;
    let build_triple = build_triple.trim().to_string();
    tracing::debug!("build triple is {}", build_triple);

    ProcessBuilder::new(platform_dir.join("buildconf"))
        .arg("--force")
        .cwd(platform_dir)
        .exec_streaming()
        .context("buildconf failed")?;

    Ok(build_triple)
}

/// Prepare the tree, write `phpnar.build.sh` and return how to run it.
pub fn generate(
    layout: &Layout,
    aol: &Aol,
    flags: &FlagTable,
    configure_args: &str,
) -> Result<BuildPlan> {
    let platform_dir = layout.platform_dir(aol);
    let build_triple = prepare_tree(&platform_dir)?;

    let script = UnixScript::for_platform(
        aol,
        flags,
        &layout.install_dir(aol),
        configure_args,
        &build_triple,
    )?;

    let path = platform_dir.join(UNIX_SCRIPT_NAME);
    write_script(&path, &script.render())?;
    make_executable(&path)?;
    tracing::info!("generated {}", path.display());

    Ok(BuildPlan::Unix {
        script: path,
        workdir: platform_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::layout::tests::{layout, resolved};

    fn script() -> UnixScript {
        UnixScript {
            install_dir: "/w/target/amd64-Linux-gpp/phpnar.install".into(),
            configure_args: "--enable-cli --enable-embed=shared".into(),
            build_triple: "x86_64-unknown-linux-gnu".into(),
            host_triple: "x86_64-pc-linux-gnu".into(),
            arch_flags: "-m64".into(),
            c_options: "-O2".into(),
            cpp_options: "-O2 -fPIC".into(),
        }
    }

    #[test]
    fn test_render() {
        assert_eq!(
            script().render(),
            "./configure --prefix=\"/w/target/amd64-Linux-gpp/phpnar.install\" \
             --enable-cli --enable-embed=shared --build=x86_64-unknown-linux-gnu \
             --host=x86_64-pc-linux-gnu CFLAGS='-m64 -O2' CXXFLAGS='-m64 -O2 -fPIC' \
             LDFLAGS='-m64 -L/usr/lib64'\nmake\nmake install\n"
        );
    }

    #[test]
    fn test_ldflags_follow_word_size() {
        assert_eq!(extra_ldflags("-m32"), " -L/usr/lib32");
        assert_eq!(extra_ldflags("-m64 -march=x86-64"), " -L/usr/lib64");
        assert_eq!(extra_ldflags("-arch arm64"), "");
        assert_eq!(extra_ldflags(""), "");
    }

    #[test]
    fn test_strip_wall() {
        assert_eq!(strip_wall("-Wall -O2  -Wall -Wextra"), "-O2 -Wextra");
        assert_eq!(strip_wall("-Wall"), "");
        assert_eq!(strip_wall("-Wall-like"), "-Wall-like");
    }

    #[test]
    fn test_for_platform_reads_flag_table() {
        let flags = FlagTable::bundled();
        let aol = resolved("amd64", "Linux");
        let script = UnixScript::for_platform(
            &aol,
            &flags,
            Path::new("/install"),
            "--enable-cli",
            "x86_64-unknown-linux-gnu\n",
        )
        .unwrap();

        assert_eq!(script.host_triple, "x86_64-pc-linux-gnu");
        assert_eq!(script.arch_flags, "-m64");
        assert_eq!(script.build_triple, "x86_64-unknown-linux-gnu");
        assert!(!script.c_options.contains("-Wall"));
    }

    #[test]
    fn test_missing_required_flag() {
        use crate::core::aol::{AolDescriptor, HostPlatform};
        use crate::util::properties::Properties;

        let flags = FlagTable::from_properties(Properties::parse(
            "amd64.Linux.gpp.HostOs=x86_64-pc-linux-gnu\n",
        ));
        let mut desc = AolDescriptor::new("amd64", "Linux", "gpp");
        let aol = desc
            .resolve(&flags, &HostPlatform::new("Linux", "amd64"))
            .unwrap()
            .clone();

        let err = UnixScript::for_platform(&aol, &flags, Path::new("/i"), "", "b").unwrap_err();
        match err {
            NarError::MissingPlatformFlag { property } => {
                assert_eq!(property, "amd64.Linux.gpp.ArchFlags")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_generate_runs_helpers_and_writes_script() {
        let tmp = tempfile::TempDir::new().unwrap();
        let layout = layout(tmp.path());
        let aol = resolved("amd64", "Linux");
        let platform_dir = layout.platform_dir(&aol);

        std::fs::create_dir_all(platform_dir.join("build")).unwrap();
        std::fs::write(
            platform_dir.join("config.guess"),
            "#!/bin/sh\necho x86_64-unknown-linux-gnu\n",
        )
        .unwrap();
        std::fs::write(
            platform_dir.join("buildconf"),
            "#!/bin/sh\n[ \"$1\" = --force ] && touch configure\n",
        )
        .unwrap();
        std::fs::write(platform_dir.join("build/shtool"), "#!/bin/sh\n").unwrap();

        let plan = generate(&layout, &aol, &FlagTable::bundled(), "--enable-cli").unwrap();

        let script = std::fs::read_to_string(plan.script()).unwrap();
        assert!(script.contains("--build=x86_64-unknown-linux-gnu --host=x86_64-pc-linux-gnu"));
        assert!(script.ends_with("make\nmake install\n"));
        assert!(platform_dir.join("configure").exists());

        use std::os::unix::fs::PermissionsExt;
        for path in [plan.script().to_path_buf(), platform_dir.join("build/shtool")] {
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_ne!(mode & 0o111, 0, "{} is not executable", path.display());
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_buildconf_stops_generation() {
        let tmp = tempfile::TempDir::new().unwrap();
        let layout = layout(tmp.path());
        let aol = resolved("amd64", "Linux");
        let platform_dir = layout.platform_dir(&aol);

        std::fs::create_dir_all(&platform_dir).unwrap();
        std::fs::write(platform_dir.join("config.guess"), "#!/bin/sh\necho host\n").unwrap();
        std::fs::write(platform_dir.join("buildconf"), "#!/bin/sh\necho nope >&2\nexit 1\n")
            .unwrap();

        let err = generate(&layout, &aol, &FlagTable::bundled(), "").unwrap_err();
        let cause = err.downcast_ref::<NarError>().unwrap();
        assert!(matches!(cause, NarError::ExternalCommandFailed { .. }));
        assert!(!platform_dir.join(UNIX_SCRIPT_NAME).exists());
    }
}
