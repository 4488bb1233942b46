//! Domain error types.
//!
//! Every variant is fatal for the current run. Operations that add file or
//! stage context wrap these in `anyhow::Error`; callers that need to inspect
//! the kind use `downcast_ref::<NarError>()`.

use std::path::PathBuf;

use thiserror::Error;

/// Common help messages attached to errors when they are reported.
pub mod suggestions {
    /// Shown when a platform triple has no flag table entry.
    pub const UNRESOLVED_PLATFORM: &str =
        "help: Check the `[[aol]]` entries in Nar.toml or add the platform to an `aol-properties` overlay";

    /// Shown when an `[[extension]]` entry is malformed.
    pub const INVALID_FEATURE: &str =
        "help: Every `[[extension]]` needs a `name` and either `enable` or `with`";

    /// Shown when an external build step fails.
    pub const COMMAND_FAILED: &str = "help: Run with `--verbose` to see every command executed";

    /// Shown when packaging finds no build output.
    pub const MISSING_OUTPUT: &str = "help: Run `phpnar compile` first, then package again";

    /// Shown when Windows prerequisites are missing.
    pub const PREREQUISITE: &str =
        "help: See https://wiki.php.net/internals/windows/stepbystepbuild for the Windows build setup";
}

/// Errors raised by the build pipeline.
#[derive(Debug, Error)]
pub enum NarError {
    #[error("unable to resolve platform {arch}/{os}/{linker}")]
    UnresolvedPlatform {
        arch: String,
        os: String,
        linker: String,
    },

    #[error("platform property `{property}` is not defined")]
    MissingPlatformFlag { property: String },

    #[error("invalid extension declaration: {reason}")]
    InvalidFeature { reason: String },

    #[error("`{command}` failed with exit code {}", display_code(.exit_code))]
    ExternalCommandFailed {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("failed to spawn `{command}`")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{what} not found at {}", .path.display())]
    MissingBuildOutput { what: String, path: PathBuf },

    #[error("prerequisite missing: {0}")]
    PrerequisiteMissing(String),
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "<terminated by signal>".to_string(),
    }
}

impl NarError {
    /// The help line printed under the error message.
    pub fn help(&self) -> Option<&'static str> {
        match self {
            NarError::UnresolvedPlatform { .. } | NarError::MissingPlatformFlag { .. } => {
                Some(suggestions::UNRESOLVED_PLATFORM)
            }
            NarError::InvalidFeature { .. } => Some(suggestions::INVALID_FEATURE),
            NarError::ExternalCommandFailed { .. } => Some(suggestions::COMMAND_FAILED),
            NarError::MissingBuildOutput { .. } => Some(suggestions::MISSING_OUTPUT),
            NarError::PrerequisiteMissing(_) => Some(suggestions::PREREQUISITE),
            NarError::SpawnFailed { .. } => None,
        }
    }

    pub(crate) fn invalid_feature(reason: impl Into<String>) -> Self {
        NarError::InvalidFeature {
            reason: reason.into(),
        }
    }

    pub(crate) fn missing_output(what: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        NarError::MissingBuildOutput {
            what: what.into(),
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failure_message() {
        let err = NarError::ExternalCommandFailed {
            command: "bash build.sh".into(),
            exit_code: Some(2),
            stdout: "out".into(),
            stderr: "err".into(),
        };
        assert_eq!(err.to_string(), "`bash build.sh` failed with exit code 2");

        let killed = NarError::ExternalCommandFailed {
            command: "make".into(),
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(killed.to_string().contains("signal"));
    }

    #[test]
    fn test_unresolved_platform_names_triple() {
        let err = NarError::UnresolvedPlatform {
            arch: "sparc".into(),
            os: "SunOS".into(),
            linker: "CC".into(),
        };
        assert_eq!(err.to_string(), "unable to resolve platform sparc/SunOS/CC");
        assert!(err.help().is_some());
    }
}
