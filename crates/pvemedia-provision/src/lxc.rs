//! LXC container runtime driver.
//!
//! Wraps the Proxmox `pct`/`pveam` tooling behind a capability trait so the
//! orchestration sequence can run against a mock runtime in tests.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use pvemedia_common::config::ProvisionConfig;
use pvemedia_common::constants::LXC_CONFIG_DIR;
use pvemedia_common::error::{ProvisionError, Result};
use pvemedia_common::types::CtId;

use crate::process::{self, CmdOutput};

/// Capability over the host's container tooling.
pub trait ContainerRuntime {
    /// Ensures the OS template is present in the template storage,
    /// downloading it when missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the template index or download fails.
    fn ensure_template(&self, storage: &str, template: &str) -> Result<()>;

    /// Creates a container from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if creation fails.
    fn create(&self, config: &ProvisionConfig) -> Result<()>;

    /// Starts a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be started.
    fn start(&self, id: CtId) -> Result<()>;

    /// Stops a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be stopped.
    fn stop(&self, id: CtId) -> Result<()>;

    /// Returns the container status line (e.g. `status: running`).
    ///
    /// # Errors
    ///
    /// Returns an error if the status query fails.
    fn status(&self, id: CtId) -> Result<String>;

    /// Executes a command inside a running container, capturing its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be dispatched; a non-zero
    /// in-container exit status is reported through the output, not an error.
    fn exec(&self, id: CtId, command: &[&str]) -> Result<CmdOutput>;

    /// Returns the raw per-container configuration file contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read.
    fn read_config(&self, id: CtId) -> Result<String>;

    /// Appends one line to the per-container configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    fn append_config(&self, id: CtId, line: &str) -> Result<()>;
}

/// Real runtime backed by `pct` and `pveam`.
#[derive(Debug, Clone)]
pub struct PctRuntime {
    config_dir: PathBuf,
}

impl PctRuntime {
    /// Creates a runtime using the standard Proxmox configuration directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_dir: PathBuf::from(LXC_CONFIG_DIR),
        }
    }

    /// Creates a runtime with a custom configuration directory.
    #[must_use]
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    fn config_path(&self, id: CtId) -> PathBuf {
        self.config_dir.join(format!("{id}.conf"))
    }
}

impl Default for PctRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerRuntime for PctRuntime {
    fn ensure_template(&self, storage: &str, template: &str) -> Result<()> {
        let _ = process::run_checked("pveam", &["update"])?;
        let listing = process::run_checked("pveam", &["list", storage])?;
        if listing.stdout.contains(template) {
            tracing::debug!(template, "template already downloaded");
            return Ok(());
        }
        tracing::info!(template, storage, "downloading template");
        let _ = process::run_checked("pveam", &["download", storage, template])?;
        Ok(())
    }

    fn create(&self, config: &ProvisionConfig) -> Result<()> {
        let id = config.ct_id.to_string();
        let template_ref = format!("{}:vztmpl/{}", config.template_storage, config.template);
        let rootfs = format!("{}:{}", config.storage, config.disk_gb);
        let cores = config.cores.to_string();
        let memory = config.memory_mb.to_string();
        let unprivileged = if config.unprivileged { "1" } else { "0" };
        tracing::info!(id = %config.ct_id, hostname = %config.hostname, "creating container");
        let _ = process::run_checked(
            "pct",
            &[
                "create",
                &id,
                &template_ref,
                "--hostname",
                &config.hostname,
                "--password",
                &config.password,
                "--cores",
                &cores,
                "--memory",
                &memory,
                "--rootfs",
                &rootfs,
                "--unprivileged",
                unprivileged,
                "--net0",
                "name=eth0,bridge=vmbr0,ip=dhcp",
                "--onboot",
                "1",
            ],
        )?;
        Ok(())
    }

    fn start(&self, id: CtId) -> Result<()> {
        let _ = process::run_checked("pct", &["start", &id.to_string()])?;
        Ok(())
    }

    fn stop(&self, id: CtId) -> Result<()> {
        let _ = process::run_checked("pct", &["stop", &id.to_string()])?;
        Ok(())
    }

    fn status(&self, id: CtId) -> Result<String> {
        let out = process::run_checked("pct", &["status", &id.to_string()])?;
        Ok(out.stdout.trim().to_string())
    }

    fn exec(&self, id: CtId, command: &[&str]) -> Result<CmdOutput> {
        let id = id.to_string();
        let mut args = vec!["exec", id.as_str(), "--"];
        args.extend_from_slice(command);
        process::run("pct", &args)
    }

    fn read_config(&self, id: CtId) -> Result<String> {
        let path = self.config_path(id);
        std::fs::read_to_string(&path).map_err(|e| ProvisionError::Io { path, source: e })
    }

    fn append_config(&self, id: CtId, line: &str) -> Result<()> {
        let path = self.config_path(id);
        let mut content =
            std::fs::read_to_string(&path).map_err(|e| ProvisionError::Io {
                path: path.clone(),
                source: e,
            })?;
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(line);
        content.push('\n');
        std::fs::write(&path, content).map_err(|e| ProvisionError::Io { path, source: e })
    }
}

/// Renders a bind-mount declaration for a container configuration file.
#[must_use]
pub fn bind_mount_line(index: u32, host_path: &Path, container_path: &Path) -> String {
    format!(
        "mp{index}: {},mp={},backup=0",
        host_path.display(),
        container_path.display()
    )
}

/// Idempotently registers a bind mount in the container configuration.
///
/// Picks the lowest unused `mp<N>` index. Returns `false` without modifying
/// anything when the host path is already mapped.
///
/// # Errors
///
/// Returns an error if the container configuration cannot be read or written.
pub fn register_bind_mount(
    runtime: &dyn ContainerRuntime,
    id: CtId,
    host_path: &Path,
    container_path: &Path,
) -> Result<bool> {
    let config = runtime.read_config(id)?;
    let host = host_path.display().to_string();
    let mut used = BTreeSet::new();
    for line in config.lines() {
        let Some(rest) = line.strip_prefix("mp") else {
            continue;
        };
        let Some((index, value)) = rest.split_once(':') else {
            continue;
        };
        if let Ok(n) = index.parse::<u32>() {
            let _ = used.insert(n);
            let volume = value.trim();
            if volume == host || volume.starts_with(&format!("{host},")) {
                tracing::info!(id = %id, host = %host, "bind mount already present, skipping");
                return Ok(false);
            }
        }
    }

    let mut index = 0;
    while used.contains(&index) {
        index += 1;
    }
    let line = bind_mount_line(index, host_path, container_path);
    runtime.append_config(id, &line)?;
    tracing::info!(id = %id, line = %line, "registered bind mount");
    Ok(true)
}
