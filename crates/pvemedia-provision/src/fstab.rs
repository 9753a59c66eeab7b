//! Persistent mount table registration.
//!
//! The mount table is host-global mutable state, so every mutation here is
//! append-only and guarded by a UUID idempotence check: re-running after a
//! partial failure never duplicates an entry.

use std::path::{Path, PathBuf};

use pvemedia_common::constants::{FSTAB_PATH, ID_MAP_OFFSET};
use pvemedia_common::error::{ProvisionError, Result};
use pvemedia_common::types::{BlockDevice, FsKind, MountEntry};

use crate::packages::PackageInstaller;
use crate::process;

/// Capability over the persistent mount table and host mount control.
pub trait MountTable {
    /// Returns the full current contents of the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be read.
    fn read(&self) -> Result<String>;

    /// Appends one entry line to the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be written.
    fn append(&self, line: &str) -> Result<()>;

    /// Removes an exactly matching entry line from the table.
    ///
    /// Used only to roll back a just-appended entry whose apply step failed.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be rewritten.
    fn remove(&self, line: &str) -> Result<()>;

    /// Mounts everything listed in the table (`mount -a` semantics).
    ///
    /// # Errors
    ///
    /// Returns an error if the apply command fails.
    fn apply(&self) -> Result<()>;

    /// Mounts a single mount point using its table entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the mount command fails.
    fn mount(&self, mount_point: &Path) -> Result<()>;

    /// Unmounts a single mount point.
    ///
    /// # Errors
    ///
    /// Returns an error if the unmount command fails.
    fn unmount(&self, mount_point: &Path) -> Result<()>;
}

/// Real mount table backed by `/etc/fstab` and the `mount` tool.
#[derive(Debug, Clone)]
pub struct Fstab {
    path: PathBuf,
}

impl Fstab {
    /// Creates a handle to the system mount table.
    #[must_use]
    pub fn system() -> Self {
        Self {
            path: PathBuf::from(FSTAB_PATH),
        }
    }

    /// Creates a handle to a mount table at a custom path.
    #[must_use]
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    fn io_err(&self, source: std::io::Error) -> ProvisionError {
        ProvisionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl MountTable for Fstab {
    fn read(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|e| self.io_err(e))
    }

    // The table is boot-critical, so new entries go through O_APPEND in a
    // single write; the file is never truncated on this path.
    fn append(&self, line: &str) -> Result<()> {
        use std::io::Write;

        let existing = self.read()?;
        let mut buf = String::with_capacity(line.len() + 2);
        if !existing.is_empty() && !existing.ends_with('\n') {
            buf.push('\n');
        }
        buf.push_str(line);
        buf.push('\n');

        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;
        file.write_all(buf.as_bytes()).map_err(|e| self.io_err(e))
    }

    fn remove(&self, line: &str) -> Result<()> {
        let content = self.read()?;
        let kept: Vec<&str> = content.lines().filter(|l| *l != line).collect();
        let mut out = kept.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        std::fs::write(&self.path, out).map_err(|e| self.io_err(e))
    }

    fn apply(&self) -> Result<()> {
        let _ = process::run_checked("mount", &["-a"])?;
        Ok(())
    }

    fn mount(&self, mount_point: &Path) -> Result<()> {
        let target = mount_point.to_string_lossy();
        let _ = process::run_checked("mount", &[&target])?;
        Ok(())
    }

    fn unmount(&self, mount_point: &Path) -> Result<()> {
        let target = mount_point.to_string_lossy();
        let _ = process::run_checked("umount", &[&target])?;
        Ok(())
    }
}

/// Mount policy selected per filesystem type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountPolicy {
    /// Host packages required to mount the filesystem.
    pub packages: &'static [&'static str],
    /// Mount options written into the table entry.
    pub options: &'static str,
    /// `dump` field.
    pub dump: u8,
    /// `fsck` pass field.
    pub pass: u8,
}

/// exFAT has no POSIX permission bits, so ownership is fixed at mount time
/// to the unprivileged container's root-mapped range.
const EXFAT_OPTIONS: &str = "defaults,nofail,uid=100000,gid=100000,umask=000";

const _: () = assert!(ID_MAP_OFFSET == 100_000);

/// Selects the mount policy for a filesystem type.
///
/// Unrecognized types are not an error: they take the fallback policy with
/// no extra packages.
#[must_use]
pub fn policy_for(fs: &FsKind) -> MountPolicy {
    match fs {
        FsKind::Ntfs => MountPolicy {
            packages: &["ntfs-3g"],
            options: "defaults,nofail",
            dump: 0,
            pass: 2,
        },
        FsKind::Exfat => MountPolicy {
            packages: &["exfatprogs", "exfat-fuse"],
            options: EXFAT_OPTIONS,
            dump: 0,
            pass: 0,
        },
        FsKind::Ext4 | FsKind::Other(_) => MountPolicy {
            packages: &[],
            options: "defaults,nofail",
            dump: 0,
            pass: 2,
        },
    }
}

/// Outcome of a mount registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// The effective mount table entry for the device.
    pub entry: MountEntry,
    /// Whether this call appended the entry (`false` means it already existed).
    pub newly_added: bool,
}

/// Finds an existing table line referencing the given UUID.
///
/// Any non-comment line containing the UUID counts as registered, even when
/// it does not parse as a standard six-field entry; in that case the caller
/// falls back to its computed entry.
fn existing_entry(table: &dyn MountTable, uuid: &str) -> Result<Option<Option<MountEntry>>> {
    let content = table.read()?;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') || !trimmed.contains(uuid) {
            continue;
        }
        return Ok(Some(MountEntry::parse_line(trimmed)));
    }
    Ok(None)
}

/// Registers a persistent mount for a block device.
///
/// Creates the mount point directory, installs filesystem support packages,
/// appends one table entry keyed by the device UUID, and applies the table.
/// Idempotent: if an entry for the UUID already exists the existing entry is
/// returned unchanged and nothing is written.
///
/// If the apply step fails, the freshly appended line is removed again
/// before the error surfaces, so the table is never left durably edited but
/// unapplied.
///
/// # Errors
///
/// Returns [`ProvisionError::PackageInstall`] when support packages cannot
/// be installed, [`ProvisionError::MountApply`] when the apply step fails,
/// and I/O errors for table access.
pub fn register_mount(
    table: &dyn MountTable,
    installer: &dyn PackageInstaller,
    device: &BlockDevice,
    mount_point: &Path,
) -> Result<Registration> {
    std::fs::create_dir_all(mount_point).map_err(|e| ProvisionError::Io {
        path: mount_point.to_path_buf(),
        source: e,
    })?;

    let policy = policy_for(&device.fs);
    let entry = MountEntry {
        uuid: device.uuid.clone(),
        mount_point: mount_point.to_path_buf(),
        fs_type: device.fs.as_str().to_string(),
        options: policy.options.to_string(),
        dump: policy.dump,
        pass: policy.pass,
    };

    if let Some(found) = existing_entry(table, &device.uuid)? {
        tracing::info!(uuid = %device.uuid, "mount entry already registered, skipping");
        return Ok(Registration {
            entry: found.unwrap_or(entry),
            newly_added: false,
        });
    }

    if !policy.packages.is_empty() {
        installer.ensure_installed(policy.packages)?;
    }

    let line = entry.to_line();
    table.append(&line)?;
    tracing::info!(entry = %line, "appended mount table entry");

    if let Err(e) = table.apply() {
        tracing::warn!(error = %e, "mount apply failed, rolling back new entry");
        table.remove(&line)?;
        let stderr = match e {
            ProvisionError::CommandFailed { stderr, .. } => stderr,
            other => other.to_string(),
        };
        return Err(ProvisionError::MountApply { stderr });
    }

    Ok(Registration {
        entry,
        newly_added: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;

    /// In-memory mount table; `fail_apply` simulates a failing `mount -a`.
    struct MemoryTable {
        content: RefCell<String>,
        fail_apply: bool,
    }

    impl MemoryTable {
        fn new(initial: &str) -> Self {
            Self {
                content: RefCell::new(initial.to_string()),
                fail_apply: false,
            }
        }

        fn failing(initial: &str) -> Self {
            Self {
                content: RefCell::new(initial.to_string()),
                fail_apply: true,
            }
        }
    }

    impl MountTable for MemoryTable {
        fn read(&self) -> Result<String> {
            Ok(self.content.borrow().clone())
        }

        fn append(&self, line: &str) -> Result<()> {
            let mut content = self.content.borrow_mut();
            content.push_str(line);
            content.push('\n');
            Ok(())
        }

        fn remove(&self, line: &str) -> Result<()> {
            let kept: Vec<String> = self
                .content
                .borrow()
                .lines()
                .filter(|l| *l != line)
                .map(String::from)
                .collect();
            let mut out = kept.join("\n");
            if !out.is_empty() {
                out.push('\n');
            }
            *self.content.borrow_mut() = out;
            Ok(())
        }

        fn apply(&self) -> Result<()> {
            if self.fail_apply {
                return Err(ProvisionError::CommandFailed {
                    program: "mount".into(),
                    status: 32,
                    stderr: "wrong fs type".into(),
                });
            }
            Ok(())
        }

        fn mount(&self, _mount_point: &Path) -> Result<()> {
            Ok(())
        }

        fn unmount(&self, _mount_point: &Path) -> Result<()> {
            Ok(())
        }
    }

    struct RecordingInstaller {
        requested: RefCell<Vec<String>>,
    }

    impl RecordingInstaller {
        fn new() -> Self {
            Self {
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl PackageInstaller for RecordingInstaller {
        fn ensure_installed(&self, packages: &[&str]) -> Result<()> {
            self.requested
                .borrow_mut()
                .extend(packages.iter().map(ToString::to_string));
            Ok(())
        }
    }

    fn exfat_device() -> BlockDevice {
        BlockDevice {
            path: PathBuf::from("/dev/sdb1"),
            uuid: "ABCD-1234".into(),
            fs: FsKind::Exfat,
        }
    }

    fn scratch_mount_point() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let mp = dir.path().join("media");
        (dir, mp)
    }

    #[test]
    fn exfat_entry_carries_ownership_options() {
        let table = MemoryTable::new("");
        let installer = RecordingInstaller::new();
        let (_dir, mp) = scratch_mount_point();

        let reg = register_mount(&table, &installer, &exfat_device(), &mp)
            .expect("registration should succeed");
        assert!(reg.newly_added);
        assert_eq!(
            reg.entry.options,
            "defaults,nofail,uid=100000,gid=100000,umask=000"
        );
        assert_eq!((reg.entry.dump, reg.entry.pass), (0, 0));
        assert_eq!(
            *installer.requested.borrow(),
            vec!["exfatprogs".to_string(), "exfat-fuse".to_string()]
        );
    }

    #[test]
    fn ntfs_policy_has_plain_options() {
        let policy = policy_for(&FsKind::Ntfs);
        assert_eq!(policy.options, "defaults,nofail");
        assert_eq!(policy.packages, &["ntfs-3g"]);
        assert_eq!((policy.dump, policy.pass), (0, 2));
    }

    #[test]
    fn unknown_fs_falls_back_with_no_packages() {
        let policy = policy_for(&FsKind::parse("btrfs"));
        assert_eq!(policy.options, "defaults,nofail");
        assert!(policy.packages.is_empty());
    }

    #[test]
    fn register_twice_appends_once() {
        let table = MemoryTable::new("# /etc/fstab\n/dev/sda1 / ext4 defaults 0 1\n");
        let installer = RecordingInstaller::new();
        let (_dir, mp) = scratch_mount_point();
        let device = exfat_device();

        let first = register_mount(&table, &installer, &device, &mp).expect("first");
        assert!(first.newly_added);

        let second = register_mount(&table, &installer, &device, &mp).expect("second");
        assert!(!second.newly_added);
        assert_eq!(second.entry, first.entry);

        let occurrences = table
            .read()
            .expect("read")
            .lines()
            .filter(|l| l.contains("ABCD-1234"))
            .count();
        assert_eq!(occurrences, 1);
    }

    #[test]
    fn apply_failure_rolls_back_the_appended_line() {
        let table = MemoryTable::failing("");
        let installer = RecordingInstaller::new();
        let (_dir, mp) = scratch_mount_point();

        let err = register_mount(&table, &installer, &exfat_device(), &mp)
            .expect_err("apply failure must surface");
        assert!(matches!(err, ProvisionError::MountApply { .. }));
        assert!(!table.read().expect("read").contains("ABCD-1234"));
    }

    #[test]
    fn fstab_append_preserves_existing_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fstab");
        std::fs::write(&path, "# header\n/dev/sda1 / ext4 defaults 0 1\n").expect("seed");

        let fstab = Fstab::at(path.clone());
        fstab
            .append("UUID=ABCD-1234 /mnt/media exfat defaults,nofail 0 0")
            .expect("append");

        let content = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(
            content,
            "# header\n/dev/sda1 / ext4 defaults 0 1\nUUID=ABCD-1234 /mnt/media exfat defaults,nofail 0 0\n"
        );
    }

    #[test]
    fn fstab_append_guards_missing_trailing_newline() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fstab");
        std::fs::write(&path, "/dev/sda1 / ext4 defaults 0 1").expect("seed");

        let fstab = Fstab::at(path.clone());
        fstab.append("UUID=X /mnt/x ext4 defaults,nofail 0 2").expect("append");

        let content = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(
            content,
            "/dev/sda1 / ext4 defaults 0 1\nUUID=X /mnt/x ext4 defaults,nofail 0 2\n"
        );
    }

    #[test]
    fn fstab_remove_drops_only_the_matching_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fstab");
        std::fs::write(
            &path,
            "# header\nUUID=X /mnt/x ext4 defaults,nofail 0 2\nUUID=Y /mnt/y ext4 defaults 0 2\n",
        )
        .expect("seed");

        let fstab = Fstab::at(path.clone());
        fstab.remove("UUID=X /mnt/x ext4 defaults,nofail 0 2").expect("remove");

        let content = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(content, "# header\nUUID=Y /mnt/y ext4 defaults 0 2\n");
    }

    #[test]
    fn end_to_end_exfat_line_matches_expected_format() {
        let table = MemoryTable::new("");
        let installer = RecordingInstaller::new();
        let dir = tempfile::tempdir().expect("tempdir");
        let mp = dir.path().join("bjorne");

        let reg =
            register_mount(&table, &installer, &exfat_device(), &mp).expect("registration");
        let expected = format!(
            "UUID=ABCD-1234 {} exfat defaults,nofail,uid=100000,gid=100000,umask=000 0 0",
            mp.display()
        );
        assert_eq!(reg.entry.to_line(), expected);
        assert!(table.read().expect("read").contains(&expected));
    }
}
