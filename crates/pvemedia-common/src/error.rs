//! Unified error types for the pvemedia workspace.
//!
//! Every fallible operation in the provisioning core returns [`Result`];
//! the CLI converts into `anyhow` at the boundary.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A block device yielded no UUID, so no safe mount entry can be written.
    #[error("no filesystem UUID found for device {device}")]
    DeviceNotFound {
        /// Device path that was inspected.
        device: PathBuf,
    },

    /// A caller-supplied value is outside its contract.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the rejected input.
        message: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// An external command exited with a non-zero status.
    #[error("{program} exited with status {status}: {stderr}")]
    CommandFailed {
        /// Program that was invoked.
        program: String,
        /// Exit status reported by the program (-1 if killed by signal).
        status: i32,
        /// Captured standard error output.
        stderr: String,
    },

    /// Installing filesystem support packages on the host failed.
    #[error("failed to install packages {packages:?}: {stderr}")]
    PackageInstall {
        /// Packages that were requested.
        packages: Vec<String>,
        /// Captured standard error output from the package manager.
        stderr: String,
    },

    /// Applying the mount table failed; the freshly appended entry has
    /// already been rolled back.
    #[error("mount table apply failed (new entry rolled back): {stderr}")]
    MountApply {
        /// Captured standard error output from the apply step.
        stderr: String,
    },

    /// Deserializing a configuration file failed.
    #[error("configuration parse error: {source}")]
    ConfigParse {
        /// Underlying deserialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ProvisionError>;
