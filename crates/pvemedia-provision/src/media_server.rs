//! Jellyfin installation and maintenance inside the container.
//!
//! All steps run through [`ContainerRuntime::exec`], one blocking command at
//! a time, failing fast on the first non-zero exit status.

use pvemedia_common::constants::MEDIA_SERVICE_USER;
use pvemedia_common::error::{ProvisionError, Result};
use pvemedia_common::types::CtId;

use crate::lxc::ContainerRuntime;

/// Shell steps that take a fresh Debian container to a running Jellyfin.
const INSTALL_STEPS: &[&str] = &[
    "apt-get update",
    "apt-get install -y curl gnupg ca-certificates",
    "mkdir -p /etc/apt/keyrings",
    "curl -fsSL https://repo.jellyfin.org/jellyfin_team.gpg.key \
     | gpg --dearmor -o /etc/apt/keyrings/jellyfin.gpg",
    "echo \"deb [signed-by=/etc/apt/keyrings/jellyfin.gpg] \
     https://repo.jellyfin.org/debian $(. /etc/os-release && echo $VERSION_CODENAME) main\" \
     > /etc/apt/sources.list.d/jellyfin.list",
    "apt-get update",
    "apt-get install -y jellyfin",
    "systemctl enable --now jellyfin",
];

/// Shell steps that upgrade an existing Jellyfin installation.
const UPDATE_STEPS: &[&str] = &[
    "apt-get update",
    "apt-get install -y --only-upgrade jellyfin",
    "systemctl restart jellyfin",
];

fn run_steps(runtime: &dyn ContainerRuntime, id: CtId, steps: &[&str]) -> Result<()> {
    for step in steps {
        tracing::info!(id = %id, step, "running in-container step");
        let out = runtime.exec(id, &["bash", "-c", step])?;
        if !out.success() {
            return Err(ProvisionError::CommandFailed {
                program: format!("pct exec {id} -- bash -c {step:?}"),
                status: out.status,
                stderr: out.stderr.trim().to_string(),
            });
        }
    }
    Ok(())
}

/// Installs the media server inside the container and starts its service.
///
/// # Errors
///
/// Fails fast on the first step that exits non-zero.
pub fn install(runtime: &dyn ContainerRuntime, id: CtId) -> Result<()> {
    run_steps(runtime, id, INSTALL_STEPS)
}

/// Upgrades the media server package inside the container.
///
/// # Errors
///
/// Fails fast on the first step that exits non-zero.
pub fn update(runtime: &dyn ContainerRuntime, id: CtId) -> Result<()> {
    run_steps(runtime, id, UPDATE_STEPS)
}

/// Queries the in-container uid and gid of the media service account.
///
/// The values come back as decimal text from `id -u` / `id -g`; parse
/// failures surface as [`ProvisionError::InvalidInput`] so a broken
/// container cannot feed garbage into the ID remapping.
///
/// # Errors
///
/// Returns an error if the query commands fail or their output is not a
/// decimal integer.
pub fn service_ids(runtime: &dyn ContainerRuntime, id: CtId) -> Result<(i64, i64)> {
    let uid = query_id(runtime, id, "-u")?;
    let gid = query_id(runtime, id, "-g")?;
    tracing::debug!(id = %id, uid, gid, "resolved media service ids");
    Ok((uid, gid))
}

fn query_id(runtime: &dyn ContainerRuntime, id: CtId, flag: &str) -> Result<i64> {
    let out = runtime.exec(id, &["id", flag, MEDIA_SERVICE_USER])?;
    if !out.success() {
        return Err(ProvisionError::CommandFailed {
            program: format!("pct exec {id} -- id {flag} {MEDIA_SERVICE_USER}"),
            status: out.status,
            stderr: out.stderr.trim().to_string(),
        });
    }
    let raw = out.stdout.trim();
    raw.parse().map_err(|_| ProvisionError::InvalidInput {
        message: format!("unexpected id output for {MEDIA_SERVICE_USER}: {raw:?}"),
    })
}
