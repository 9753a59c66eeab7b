//! Blocking external-command execution with captured output.
//!
//! Everything this tool does to the host ultimately runs through one of the
//! Proxmox or util-linux CLIs, so command invocation is centralized here.

use pvemedia_common::error::{ProvisionError, Result};

/// Captured output from an external command.
#[derive(Debug, Clone)]
pub struct CmdOutput {
    /// Standard output, lossily decoded as UTF-8.
    pub stdout: String,
    /// Standard error, lossily decoded as UTF-8.
    pub stderr: String,
    /// Exit status (-1 if the process was killed by a signal).
    pub status: i32,
}

impl CmdOutput {
    /// Returns whether the command exited with status zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs a command and captures its output, regardless of exit status.
///
/// # Errors
///
/// Returns an error only if the program could not be spawned.
pub fn run(program: &str, args: &[&str]) -> Result<CmdOutput> {
    tracing::debug!(program, ?args, "running external command");
    let output = std::process::Command::new(program)
        .args(args)
        .output()
        .map_err(|e| ProvisionError::Io {
            path: program.into(),
            source: e,
        })?;

    Ok(CmdOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        status: output.status.code().unwrap_or(-1),
    })
}

/// Runs a command and fails on a non-zero exit status.
///
/// # Errors
///
/// Returns [`ProvisionError::CommandFailed`] carrying the program name,
/// exit status, and captured stderr.
pub fn run_checked(program: &str, args: &[&str]) -> Result<CmdOutput> {
    let output = run(program, args)?;
    if !output.success() {
        return Err(ProvisionError::CommandFailed {
            program: program.to_string(),
            status: output.status,
            stderr: output.stderr.trim().to_string(),
        });
    }
    Ok(output)
}
