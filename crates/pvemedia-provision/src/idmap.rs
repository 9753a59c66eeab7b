//! UID/GID remapping for unprivileged containers.
//!
//! Unprivileged containers shift their identity range by a fixed offset:
//! in-container id `N` owns files on the host as `N + 100000`. The mapping
//! is recomputed on demand and never persisted.

use std::path::Path;

use pvemedia_common::constants::ID_MAP_OFFSET;
use pvemedia_common::error::{ProvisionError, Result};
use pvemedia_common::types::IdMapping;

use crate::process;

/// Computes host-side IDs for an in-container uid/gid pair using the
/// standard unprivileged offset.
///
/// # Errors
///
/// Returns [`ProvisionError::InvalidInput`] for negative inputs or sums
/// that do not fit a `u32`.
pub fn compute_host_ids(container_uid: i64, container_gid: i64) -> Result<IdMapping> {
    compute_host_ids_with_offset(container_uid, container_gid, ID_MAP_OFFSET)
}

/// Computes host-side IDs with an explicit offset.
///
/// # Errors
///
/// Returns [`ProvisionError::InvalidInput`] for negative inputs or sums
/// that do not fit a `u32`.
pub fn compute_host_ids_with_offset(
    container_uid: i64,
    container_gid: i64,
    offset: u32,
) -> Result<IdMapping> {
    let uid = validate_id("uid", container_uid)?;
    let gid = validate_id("gid", container_gid)?;
    let host_uid = uid.checked_add(offset).ok_or_else(|| overflow("uid", uid, offset))?;
    let host_gid = gid.checked_add(offset).ok_or_else(|| overflow("gid", gid, offset))?;
    Ok(IdMapping {
        container_uid: uid,
        container_gid: gid,
        host_uid,
        host_gid,
    })
}

fn validate_id(kind: &str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| ProvisionError::InvalidInput {
        message: format!("container {kind} {value} is not a valid id"),
    })
}

fn overflow(kind: &str, value: u32, offset: u32) -> ProvisionError {
    ProvisionError::InvalidInput {
        message: format!("container {kind} {value} + offset {offset} overflows"),
    }
}

/// Capability for changing file ownership on the host.
pub trait OwnershipOps {
    /// Recursively sets ownership of a host path to the mapped host IDs.
    ///
    /// # Errors
    ///
    /// Returns an error if the ownership change fails.
    fn chown_recursive(&self, path: &Path, mapping: &IdMapping) -> Result<()>;
}

/// Real ownership control backed by `chown -R`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostOwnership;

impl OwnershipOps for HostOwnership {
    fn chown_recursive(&self, path: &Path, mapping: &IdMapping) -> Result<()> {
        let spec = format!("{}:{}", mapping.host_uid, mapping.host_gid);
        let target = path.to_string_lossy();
        tracing::info!(path = %path.display(), owner = %spec, "changing ownership");
        let _ = process::run_checked("chown", &["-R", &spec, &target])?;
        Ok(())
    }
}
