//! Block device inspection.
//!
//! Resolves a device path to its filesystem UUID and type. A device without
//! a UUID is a hard stop: a mount table entry keyed on an empty UUID would
//! match the wrong device, or none at all.

use std::path::Path;

use pvemedia_common::error::{ProvisionError, Result};
use pvemedia_common::types::{BlockDevice, FsKind};

use crate::process;

/// Capability for querying block device metadata.
pub trait DeviceQuery {
    /// Returns the filesystem UUID for a device, or an empty string when
    /// the device carries none.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself cannot be performed.
    fn uuid(&self, device: &Path) -> Result<String>;

    /// Returns the filesystem type string for a device (e.g. `exfat`),
    /// or an empty string when it cannot be determined.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself cannot be performed.
    fn fs_type(&self, device: &Path) -> Result<String>;
}

/// Real device query backed by `blkid`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlkidQuery;

impl BlkidQuery {
    fn probe(tag: &str, device: &Path) -> Result<String> {
        // blkid exits 2 when the tag is absent; that is "no value", not a failure.
        let device_str = device.to_string_lossy();
        let out = process::run("blkid", &["-s", tag, "-o", "value", &device_str])?;
        Ok(out.stdout.trim().to_string())
    }
}

impl DeviceQuery for BlkidQuery {
    fn uuid(&self, device: &Path) -> Result<String> {
        Self::probe("UUID", device)
    }

    fn fs_type(&self, device: &Path) -> Result<String> {
        Self::probe("TYPE", device)
    }
}

/// Resolves a device path to a [`BlockDevice`].
///
/// No side effects: inspection never touches the mount table.
///
/// # Errors
///
/// Returns [`ProvisionError::DeviceNotFound`] when the UUID lookup yields
/// an empty value, and propagates lookup failures.
pub fn inspect(query: &dyn DeviceQuery, device: &Path) -> Result<BlockDevice> {
    let uuid = query.uuid(device)?.trim().to_string();
    if uuid.is_empty() {
        return Err(ProvisionError::DeviceNotFound {
            device: device.to_path_buf(),
        });
    }
    let fs = FsKind::parse(&query.fs_type(device)?);
    tracing::info!(device = %device.display(), uuid, fs = %fs, "inspected block device");
    Ok(BlockDevice {
        path: device.to_path_buf(),
        uuid,
        fs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct FakeQuery {
        uuid: &'static str,
        fs_type: &'static str,
    }

    impl DeviceQuery for FakeQuery {
        fn uuid(&self, _device: &Path) -> Result<String> {
            Ok(self.uuid.to_string())
        }

        fn fs_type(&self, _device: &Path) -> Result<String> {
            Ok(self.fs_type.to_string())
        }
    }

    #[test]
    fn inspect_resolves_uuid_and_type() {
        let query = FakeQuery {
            uuid: "ABCD-1234",
            fs_type: "exfat",
        };
        let dev = inspect(&query, Path::new("/dev/sdb1")).expect("should inspect");
        assert_eq!(dev.uuid, "ABCD-1234");
        assert_eq!(dev.fs, FsKind::Exfat);
        assert_eq!(dev.path, PathBuf::from("/dev/sdb1"));
    }

    #[test]
    fn inspect_fails_on_empty_uuid() {
        let query = FakeQuery {
            uuid: "",
            fs_type: "ext4",
        };
        let err = inspect(&query, Path::new("/dev/sdz9")).expect_err("empty UUID must fail");
        assert!(matches!(err, ProvisionError::DeviceNotFound { .. }));
    }

    #[test]
    fn inspect_fails_on_whitespace_uuid() {
        let query = FakeQuery {
            uuid: "  \n",
            fs_type: "ext4",
        };
        assert!(inspect(&query, Path::new("/dev/sdz9")).is_err());
    }
}
