//! End-to-end provisioning sequence.
//!
//! Strictly sequential and fail-fast: every step blocks until its external
//! command finishes, and the first failure aborts the whole run. The
//! idempotence guards in the mount and bind-mount registrars make a re-run
//! after a partial failure safe.

use pvemedia_common::config::ProvisionConfig;
use pvemedia_common::error::{ProvisionError, Result};
use pvemedia_common::types::{CtId, IdMapping, MountEntry};

use crate::device::{self, DeviceQuery};
use crate::fstab::{self, MountTable};
use crate::idmap::{self, OwnershipOps};
use crate::lxc::{self, ContainerRuntime};
use crate::media_server;
use crate::packages::PackageInstaller;

/// Host binaries the real capability implementations shell out to.
const REQUIRED_BINARIES: &[&str] = &["pct", "pveam", "blkid", "mount"];

/// Verifies the required host tooling exists before anything is mutated.
///
/// # Errors
///
/// Returns [`ProvisionError::Config`] naming the first missing binary.
pub fn preflight() -> Result<()> {
    for binary in REQUIRED_BINARIES {
        if which::which(binary).is_err() {
            return Err(ProvisionError::Config {
                message: format!("required host tool not found in PATH: {binary}"),
            });
        }
    }
    Ok(())
}

/// Summary of a completed provisioning run.
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    /// ID of the provisioned container.
    pub ct_id: CtId,
    /// Persistent mount entry for the media drive, when one was configured.
    pub mount: Option<MountEntry>,
    /// Whether this run appended the mount entry (vs. found it existing).
    pub mount_newly_added: bool,
    /// Host-side identity of the media service account, when computed.
    pub id_mapping: Option<IdMapping>,
    /// Final container status line.
    pub status: String,
}

/// Sequences the full provisioning run over injected capabilities.
pub struct Provisioner<'a> {
    runtime: &'a dyn ContainerRuntime,
    devices: &'a dyn DeviceQuery,
    table: &'a dyn MountTable,
    packages: &'a dyn PackageInstaller,
    ownership: &'a dyn OwnershipOps,
    config: ProvisionConfig,
}

impl<'a> Provisioner<'a> {
    /// Creates a provisioner over the given capabilities and configuration.
    #[must_use]
    pub fn new(
        runtime: &'a dyn ContainerRuntime,
        devices: &'a dyn DeviceQuery,
        table: &'a dyn MountTable,
        packages: &'a dyn PackageInstaller,
        ownership: &'a dyn OwnershipOps,
        config: ProvisionConfig,
    ) -> Self {
        Self {
            runtime,
            devices,
            table,
            packages,
            ownership,
            config,
        }
    }

    /// Runs the full provisioning sequence.
    ///
    /// Order: validate → template → create → media mount (inspect, register,
    /// bind-mount) → start → media-server install → service-ID remap and
    /// host ownership → status.
    ///
    /// # Errors
    ///
    /// Propagates the first failing step unchanged; nothing is retried.
    pub fn run(&self) -> Result<ProvisionReport> {
        self.config.validate()?;
        let id = self.config.ct_id;

        self.runtime
            .ensure_template(&self.config.template_storage, &self.config.template)?;
        self.runtime.create(&self.config)?;

        let mut mount = None;
        let mut mount_newly_added = false;
        if let Some(device_path) = &self.config.media_device {
            let device = device::inspect(self.devices, device_path)?;
            let registration = fstab::register_mount(
                self.table,
                self.packages,
                &device,
                &self.config.mount_point,
            )?;
            mount_newly_added = registration.newly_added;
            mount = Some(registration.entry);
            let _ = lxc::register_bind_mount(
                self.runtime,
                id,
                &self.config.mount_point,
                &self.config.container_media_path,
            )?;
        }

        self.runtime.start(id)?;
        media_server::install(self.runtime, id)?;

        let mut id_mapping = None;
        if mount.is_some() {
            let (uid, gid) = media_server::service_ids(self.runtime, id)?;
            let mapping = idmap::compute_host_ids(uid, gid)?;
            self.ownership
                .chown_recursive(&self.config.mount_point, &mapping)?;
            id_mapping = Some(mapping);
        }

        let status = self.runtime.status(id)?;
        tracing::info!(id = %id, status = %status, "provisioning complete");

        Ok(ProvisionReport {
            ct_id: id,
            mount,
            mount_newly_added,
            id_mapping,
            status,
        })
    }
}
