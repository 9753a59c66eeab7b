//! Provisioning configuration model.
//!
//! The original workflow prompted interactively for each value; here every
//! parameter is explicit and validated up front, so a run either starts with
//! a complete, well-formed configuration or not at all.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{ProvisionError, Result};
use crate::types::CtId;

/// Complete configuration for provisioning the media container.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Numeric ID for the new container.
    pub ct_id: CtId,
    /// Container hostname.
    pub hostname: String,
    /// Root password set inside the container.
    pub password: String,
    /// Storage pool for the container root filesystem.
    pub storage: String,
    /// Storage pool holding OS templates.
    pub template_storage: String,
    /// OS template file name.
    pub template: String,
    /// CPU cores assigned to the container.
    pub cores: u32,
    /// Memory in MiB assigned to the container.
    pub memory_mb: u32,
    /// Root filesystem size in GiB.
    pub disk_gb: u32,
    /// Block device holding the media library, if one is attached.
    pub media_device: Option<PathBuf>,
    /// Host directory the media drive is mounted on.
    pub mount_point: PathBuf,
    /// Path where the media drive appears inside the container.
    pub container_media_path: PathBuf,
    /// Whether the container is created unprivileged.
    pub unprivileged: bool,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            ct_id: CtId::new(200),
            hostname: "jellyfin".to_string(),
            password: String::new(),
            storage: constants::DEFAULT_ROOTFS_STORAGE.to_string(),
            template_storage: constants::DEFAULT_TEMPLATE_STORAGE.to_string(),
            template: constants::DEFAULT_TEMPLATE.to_string(),
            cores: 2,
            memory_mb: 2048,
            disk_gb: 8,
            media_device: None,
            mount_point: PathBuf::from(constants::DEFAULT_MOUNT_POINT),
            container_media_path: PathBuf::from(constants::DEFAULT_CONTAINER_MEDIA_PATH),
            unprivileged: true,
        }
    }
}

impl ProvisionConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ProvisionError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Validates the configuration against the host's acceptance rules.
    ///
    /// These mirror what `pct create` would reject anyway, but failing here
    /// keeps the host untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Config`] describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if self.ct_id.as_u32() < constants::MIN_CT_ID {
            return Err(ProvisionError::Config {
                message: format!(
                    "container ID {} is below the minimum {}",
                    self.ct_id,
                    constants::MIN_CT_ID
                ),
            });
        }
        if self.hostname.is_empty()
            || !self
                .hostname
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ProvisionError::Config {
                message: format!("hostname {:?} is not a valid DNS label", self.hostname),
            });
        }
        if self.password.chars().count() < constants::MIN_PASSWORD_LEN {
            return Err(ProvisionError::Config {
                message: format!(
                    "root password must be at least {} characters",
                    constants::MIN_PASSWORD_LEN
                ),
            });
        }
        if self.cores == 0 || self.memory_mb == 0 || self.disk_gb == 0 {
            return Err(ProvisionError::Config {
                message: "cores, memory, and disk size must all be non-zero".to_string(),
            });
        }
        if !self.mount_point.is_absolute() || !self.container_media_path.is_absolute() {
            return Err(ProvisionError::Config {
                message: "mount point and container media path must be absolute".to_string(),
            });
        }
        Ok(())
    }
}
