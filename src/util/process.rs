//! Subprocess execution utilities.
//!
//! External build tools are opaque to us: they are started, their output is
//! streamed line by line into the log, and a non-zero exit becomes a
//! [`NarError::ExternalCommandFailed`] carrying everything they printed.

use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::util::errors::NarError;

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory. It is created on execution if missing.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Run the command, streaming stdout at info and stderr at warn level.
    ///
    /// Returns the accumulated stdout on success. On a non-zero exit the
    /// error carries the exit code and both complete buffers.
    pub fn exec_streaming(&self) -> Result<String, NarError> {
        let command = self.display_command();
        let spawn_failed = |source| NarError::SpawnFailed {
            command: command.clone(),
            source,
        };

        if let Some(ref cwd) = self.cwd {
            std::fs::create_dir_all(cwd).map_err(spawn_failed)?;
        }

        tracing::debug!("Executing {}", command);

        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(spawn_failed)?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // stderr is drained on a scoped thread so neither pipe can fill up
        // and block the child while the other one is being read.
        let (out_buf, err_buf) = std::thread::scope(|s| {
            let err_handle = s.spawn(move || {
                stderr
                    .map(|pipe| drain_lines(pipe, |line| tracing::warn!("{}", line)))
                    .unwrap_or_default()
            });
            let out_buf = stdout
                .map(|pipe| drain_lines(pipe, |line| tracing::info!("{}", line)))
                .unwrap_or_default();
            let err_buf = err_handle.join().unwrap_or_default();
            (out_buf, err_buf)
        });

        let status = child.wait().map_err(spawn_failed)?;
        if !status.success() {
            tracing::warn!(
                "Error invoking command. Return code {}",
                status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "none".to_string())
            );
            return Err(NarError::ExternalCommandFailed {
                command,
                exit_code: status.code(),
                stdout: out_buf,
                stderr: err_buf,
            });
        }

        Ok(out_buf)
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

fn drain_lines(pipe: impl Read, mut sink: impl FnMut(&str)) -> String {
    let mut buf = String::new();
    let mut reader = BufReader::new(pipe);
    let mut raw = Vec::new();
    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) => break,
            Err(e) => {
                tracing::warn!("stopped reading command output: {}", e);
                buf.push_str(&String::from_utf8_lossy(&raw));
                buf.push_str(&format!("[output truncated: {}]\n", e));
                break;
            }
            Ok(_) => {
                let line = String::from_utf8_lossy(&raw);
                sink(line.trim_end_matches(['\n', '\r']));
                buf.push_str(&line);
            }
        }
    }
    buf
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}
