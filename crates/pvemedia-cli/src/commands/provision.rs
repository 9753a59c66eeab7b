//! `pvemedia provision` — Create and configure the media container.

use std::path::PathBuf;

use clap::Args;
use pvemedia_common::config::ProvisionConfig;
use pvemedia_common::constants;
use pvemedia_common::types::CtId;
use pvemedia_provision::device::BlkidQuery;
use pvemedia_provision::fstab::Fstab;
use pvemedia_provision::idmap::HostOwnership;
use pvemedia_provision::lxc::PctRuntime;
use pvemedia_provision::orchestrator::{self, ProvisionReport, Provisioner};
use pvemedia_provision::packages::AptInstaller;

use crate::output;

/// Arguments for the `provision` command.
#[derive(Args, Debug)]
pub struct ProvisionArgs {
    /// Load the full configuration from a JSON file (other flags ignored).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Numeric ID for the new container.
    #[arg(long, default_value_t = 200)]
    pub ct_id: u32,

    /// Container hostname.
    #[arg(long, default_value = "jellyfin")]
    pub hostname: String,

    /// Root password for the container (min 5 characters).
    #[arg(long, env = "PVEMEDIA_PASSWORD", default_value = "")]
    pub password: String,

    /// Storage pool for the container root filesystem.
    #[arg(long, default_value = constants::DEFAULT_ROOTFS_STORAGE)]
    pub storage: String,

    /// OS template file name.
    #[arg(long, default_value = constants::DEFAULT_TEMPLATE)]
    pub template: String,

    /// CPU cores for the container.
    #[arg(long, default_value_t = 2)]
    pub cores: u32,

    /// Memory in MiB for the container.
    #[arg(long, default_value_t = 2048)]
    pub memory: u32,

    /// Root filesystem size in GiB.
    #[arg(long, default_value_t = 8)]
    pub disk: u32,

    /// Block device holding the media library (e.g. /dev/sdb1).
    #[arg(long, value_name = "DEVICE")]
    pub media_device: Option<PathBuf>,

    /// Host mount point for the media drive.
    #[arg(long, default_value = constants::DEFAULT_MOUNT_POINT)]
    pub mount_point: PathBuf,

    /// Path where the media drive appears inside the container.
    #[arg(long, default_value = constants::DEFAULT_CONTAINER_MEDIA_PATH)]
    pub container_path: PathBuf,
}

impl ProvisionArgs {
    fn into_config(self) -> anyhow::Result<ProvisionConfig> {
        if let Some(path) = &self.config {
            return Ok(ProvisionConfig::from_file(path)?);
        }
        Ok(ProvisionConfig {
            ct_id: CtId::new(self.ct_id),
            hostname: self.hostname,
            password: self.password,
            storage: self.storage,
            template: self.template,
            cores: self.cores,
            memory_mb: self.memory,
            disk_gb: self.disk,
            media_device: self.media_device,
            mount_point: self.mount_point,
            container_media_path: self.container_path,
            ..ProvisionConfig::default()
        })
    }
}

/// Executes the `provision` command.
///
/// # Errors
///
/// Returns an error if preflight or any provisioning step fails.
pub fn execute(args: ProvisionArgs) -> anyhow::Result<()> {
    let config = args.into_config()?;
    config.validate().map_err(|e| anyhow::anyhow!("{e}"))?;
    orchestrator::preflight().map_err(|e| anyhow::anyhow!("{e}"))?;

    eprintln!();
    eprintln!(
        "  {}pvemedia{} {}v{}{}",
        output::BOLD,
        output::RESET,
        output::DIM,
        env!("CARGO_PKG_VERSION"),
        output::RESET
    );
    eprintln!();
    eprintln!("  Provisioning container {} ({})...", config.ct_id, config.hostname);

    let runtime = PctRuntime::new();
    let devices = BlkidQuery;
    let table = Fstab::system();
    let packages = AptInstaller;
    let ownership = HostOwnership;

    let provisioner = Provisioner::new(&runtime, &devices, &table, &packages, &ownership, config);
    let report = provisioner.run().map_err(|e| anyhow::anyhow!("{e}"))?;

    tracing::info!(id = %report.ct_id, status = %report.status, "provisioning finished");
    print_report(&report);
    Ok(())
}

fn print_report(report: &ProvisionReport) {
    eprintln!();
    eprintln!(
        "  {}{}Container {} provisioned.{}",
        output::GREEN,
        output::BOLD,
        report.ct_id,
        output::RESET
    );
    if let Some(entry) = &report.mount {
        let note = if report.mount_newly_added {
            "registered"
        } else {
            "already present"
        };
        eprintln!("    media mount ({note}): {entry}");
    }
    if let Some(mapping) = &report.id_mapping {
        eprintln!("    media ownership: {}", output::format_mapping(mapping));
    }
    eprintln!("    {}", report.status);
    eprintln!();
}
