//! Blocking ffmpeg invocations.
//!
//! Every call runs to completion and captures stderr so failures can be
//! logged and reported. There is no cancellation: if the caller abandons a
//! request, the spawned process is not killed.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Maximum number of stderr bytes kept in an error message.
const STDERR_TAIL: usize = 2000;

/// Handle to the external ffmpeg executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolkit {
    program: PathBuf,
}

/// Failure of a single toolkit invocation.
#[derive(Debug)]
pub enum InvocationError {
    /// The executable could not be started.
    Spawn(std::io::Error),

    /// The process ran and exited unsuccessfully.
    Failed {
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Tail of the captured stderr.
        stderr: String,
    },
}

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationError::Spawn(e) => write!(f, "could not start ffmpeg: {}", e),
            InvocationError::Failed { code, stderr } => match code {
                Some(code) => write!(f, "ffmpeg exited with status {}: {}", code, stderr),
                None => write!(f, "ffmpeg terminated by signal: {}", stderr),
            },
        }
    }
}

impl std::error::Error for InvocationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InvocationError::Spawn(e) => Some(e),
            InvocationError::Failed { .. } => None,
        }
    }
}

impl Toolkit {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Path or name of the executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Runs ffmpeg with `args`, discarding stdout.
    ///
    /// `-hide_banner -nostdin -loglevel error` are always prepended so that
    /// stderr only carries diagnostics.
    pub fn run<I, S>(&self, args: I) -> Result<(), InvocationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut full: Vec<OsString> = ["-hide_banner", "-nostdin", "-loglevel", "error"]
            .iter()
            .map(OsString::from)
            .collect();
        full.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self.capture(&full).map(|_| ())
    }

    /// Runs ffmpeg with exactly `args` and returns its stdout.
    pub fn capture<I, S>(&self, args: I) -> Result<Vec<u8>, InvocationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
        log::trace!("{} {:?}", self.program.display(), args);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(InvocationError::Spawn)?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(InvocationError::Failed {
                code: output.status.code(),
                stderr: stderr_tail(&output.stderr),
            })
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= STDERR_TAIL {
        return text.to_string();
    }
    let mut start = text.len() - STDERR_TAIL;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_spawn_error() {
        let toolkit = Toolkit::new("/nonexistent/djmix-ffmpeg");
        match toolkit.run(["-version"]) {
            Err(InvocationError::Spawn(_)) => {}
            other => panic!("expected spawn error, got {:?}", other),
        }
    }

    #[test]
    fn stderr_is_truncated() {
        let long = "x".repeat(STDERR_TAIL * 2);
        let tail = stderr_tail(long.as_bytes());
        assert!(tail.starts_with("..."));
        assert_eq!(tail.len(), STDERR_TAIL + 3);
        assert_eq!(stderr_tail(b"  short \n"), "short");
    }

    #[test]
    fn failed_display_includes_status() {
        let err = InvocationError::Failed {
            code: Some(1),
            stderr: "Unknown filter".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("status 1"));
        assert!(text.contains("Unknown filter"));
    }
}
