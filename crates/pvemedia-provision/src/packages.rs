//! Host package installation.

use pvemedia_common::error::{ProvisionError, Result};

use crate::process;

/// Capability for installing packages on the host.
pub trait PackageInstaller {
    /// Ensures every listed package is installed.
    ///
    /// A package manager that reports "already installed" with a zero exit
    /// status counts as success; only a genuine failure is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::PackageInstall`] when installation fails.
    fn ensure_installed(&self, packages: &[&str]) -> Result<()>;
}

/// Real installer backed by `apt-get`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AptInstaller;

impl PackageInstaller for AptInstaller {
    fn ensure_installed(&self, packages: &[&str]) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }
        tracing::info!(?packages, "installing host packages");
        // apt-get exits zero when every requested package is already present.
        let mut args = vec!["install", "-y"];
        args.extend_from_slice(packages);
        match process::run_checked("apt-get", &args) {
            Ok(_) => Ok(()),
            Err(ProvisionError::CommandFailed { stderr, .. }) => {
                Err(ProvisionError::PackageInstall {
                    packages: packages.iter().map(ToString::to_string).collect(),
                    stderr,
                })
            }
            Err(other) => Err(other),
        }
    }
}
