//! Injectable subprocess execution.
//!
//! Every external tool (XSLT processor, FO renderer, text extractor) is
//! invoked through the [`ProcessRunner`] capability so tests can substitute
//! deterministic doubles for each of them. The production [`SystemRunner`]
//! shells out synchronously on the calling thread; there is no timeout and
//! no retry at this layer.

use std::process::Command;

#[cfg(any(test, feature = "test-mocks"))]
use mockall::automock;

/// Captured result of one subprocess invocation.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub exit_code: i32,
    pub stdout_lines: Vec<String>,
    pub stderr_lines: Vec<String>,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout followed by stderr, for line-by-line failure logging.
    pub fn captured_lines(&self) -> Vec<String> {
        let mut lines = self.stdout_lines.clone();
        lines.extend(self.stderr_lines.iter().cloned());
        lines
    }
}

/// Capability for running an external command to completion.
#[cfg_attr(any(test, feature = "test-mocks"), automock)]
pub trait ProcessRunner: Send + Sync {
    /// Run `command` with `args`, blocking until it exits, capturing both
    /// output streams. An `Err` means the process could not be launched at
    /// all; a non-zero exit comes back as a normal [`RunOutput`].
    fn run(&self, command: &str, args: &[String]) -> std::io::Result<RunOutput>;
}

/// Production runner backed by `std::process::Command`.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, command: &str, args: &[String]) -> std::io::Result<RunOutput> {
        let output = Command::new(command).args(args).output()?;
        Ok(RunOutput {
            // A signal-terminated child has no code; report it as -1.
            exit_code: output.status.code().unwrap_or(-1),
            stdout_lines: split_lines(&output.stdout),
            stderr_lines: split_lines(&output.stderr),
        })
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_owned)
        .collect()
}
