//! Build script synthesis.
//!
//! Each platform family gets its own generator: [`unix`] emits a
//! configure/make/make install shell script, [`windows`] a batch file
//! driving the Windows SDK and nmake. The family is picked once from the
//! resolved platform; see [`BuildPlan`].

pub mod unix;
pub mod windows;

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::fs::{ensure_dir, remove_file_if_exists};
use crate::util::process::ProcessBuilder;

/// A generated script together with how to run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildPlan {
    /// `bash <script>` in the platform directory
    Unix { script: PathBuf, workdir: PathBuf },
    /// `cmd /E:ON /V:ON /c "<script>"` in the platform directory
    Windows { script: PathBuf, workdir: PathBuf },
}

impl BuildPlan {
    pub fn script(&self) -> &Path {
        match self {
            BuildPlan::Unix { script, .. } | BuildPlan::Windows { script, .. } => script,
        }
    }

    /// The process that executes the script.
    pub fn command(&self) -> ProcessBuilder {
        match self {
            BuildPlan::Unix { script, workdir } => {
                ProcessBuilder::new("bash").arg(script).cwd(workdir)
            }
            BuildPlan::Windows { script, workdir } => ProcessBuilder::new("cmd")
                .args(["/E:ON", "/V:ON", "/c"])
                .arg(script)
                .cwd(workdir),
        }
    }
}

/// Write a script, replacing any previous one completely.
///
/// The file handle is flushed and synced before it is dropped so a script
/// is never run half written.
pub fn write_script(path: &Path, contents: &str) -> Result<()> {
    remove_file_if_exists(path)?;
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let mut file = File::create(path)
        .with_context(|| format!("failed to create build script {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .and_then(|_| file.flush())
        .and_then(|_| file.sync_all())
        .with_context(|| format!("error writing build script {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_script_replaces_previous() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/phpnar.build.sh");

        write_script(&path, "first version that is rather long\n").unwrap();
        write_script(&path, "make\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "make\n");
    }

    #[test]
    fn test_commands() {
        let unix = BuildPlan::Unix {
            script: PathBuf::from("/t/phpnar.build.sh"),
            workdir: PathBuf::from("/t"),
        };
        assert_eq!(unix.command().display_command(), "bash /t/phpnar.build.sh");

        let windows = BuildPlan::Windows {
            script: PathBuf::from("C:/t/phpnar.build.cmd"),
            workdir: PathBuf::from("C:/t"),
        };
        assert_eq!(
            windows.command().display_command(),
            "cmd /E:ON /V:ON /c C:/t/phpnar.build.cmd"
        );
    }
}
