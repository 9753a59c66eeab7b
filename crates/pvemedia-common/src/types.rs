//! Domain primitive types used across the pvemedia workspace.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Numeric identifier of an LXC container on the Proxmox host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CtId(u32);

impl CtId {
    /// Creates a container ID from its numeric value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Filesystem type reported for a block device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FsKind {
    /// NTFS (requires `ntfs-3g` on the host).
    Ntfs,
    /// exFAT (no POSIX permission bits; mounted with fixed ownership).
    Exfat,
    /// ext4.
    Ext4,
    /// Any other filesystem type, carried verbatim.
    Other(String),
}

impl FsKind {
    /// Parses a `blkid` TYPE value into a filesystem kind.
    ///
    /// The kernel's in-tree NTFS driver reports `ntfs3`; both spellings
    /// map to [`FsKind::Ntfs`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ntfs" | "ntfs3" => Self::Ntfs,
            "exfat" => Self::Exfat,
            "ext4" => Self::Ext4,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the type string as it appears in a mount table entry.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ntfs => "ntfs",
            Self::Exfat => "exfat",
            Self::Ext4 => "ext4",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for FsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A block device resolved to its UUID and filesystem type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDevice {
    /// Device node path (e.g. `/dev/sdb1`).
    pub path: PathBuf,
    /// Filesystem UUID; always non-empty for a successfully inspected device.
    pub uuid: String,
    /// Detected filesystem type.
    pub fs: FsKind,
}

/// One persistent mount table entry, keyed by filesystem UUID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountEntry {
    /// Filesystem UUID.
    pub uuid: String,
    /// Host directory the filesystem is mounted on.
    pub mount_point: PathBuf,
    /// Filesystem type field.
    pub fs_type: String,
    /// Comma-separated mount options.
    pub options: String,
    /// `dump` field (column 5).
    pub dump: u8,
    /// `fsck` pass field (column 6).
    pub pass: u8,
}

impl MountEntry {
    /// Renders the entry as a single mount table line (no trailing newline).
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "UUID={} {} {} {} {} {}",
            self.uuid,
            self.mount_point.display(),
            self.fs_type,
            self.options,
            self.dump,
            self.pass
        )
    }

    /// Parses a mount table line into an entry.
    ///
    /// Returns `None` for comments, blank lines, lines without the six
    /// standard fields, or entries not keyed by `UUID=`.
    #[must_use]
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 6 {
            return None;
        }
        let uuid = fields[0].strip_prefix("UUID=")?;
        Some(Self {
            uuid: uuid.to_string(),
            mount_point: PathBuf::from(fields[1]),
            fs_type: fields[2].to_string(),
            options: fields[3].to_string(),
            dump: fields[4].parse().ok()?,
            pass: fields[5].parse().ok()?,
        })
    }
}

impl fmt::Display for MountEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_line())
    }
}

/// Host-side identity for an in-container user of an unprivileged container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdMapping {
    /// UID inside the container.
    pub container_uid: u32,
    /// GID inside the container.
    pub container_gid: u32,
    /// Corresponding UID on the host.
    pub host_uid: u32,
    /// Corresponding GID on the host.
    pub host_gid: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_kind_parse_known_types() {
        assert_eq!(FsKind::parse("ntfs"), FsKind::Ntfs);
        assert_eq!(FsKind::parse("ntfs3"), FsKind::Ntfs);
        assert_eq!(FsKind::parse("exFAT"), FsKind::Exfat);
        assert_eq!(FsKind::parse("ext4"), FsKind::Ext4);
    }

    #[test]
    fn fs_kind_parse_unknown_type_carried_verbatim() {
        assert_eq!(FsKind::parse("btrfs"), FsKind::Other("btrfs".into()));
    }

    #[test]
    fn mount_entry_line_roundtrip() {
        let entry = MountEntry {
            uuid: "ABCD-1234".into(),
            mount_point: PathBuf::from("/mnt/bjorne"),
            fs_type: "exfat".into(),
            options: "defaults,nofail,uid=100000,gid=100000,umask=000".into(),
            dump: 0,
            pass: 0,
        };
        let line = entry.to_line();
        assert_eq!(
            line,
            "UUID=ABCD-1234 /mnt/bjorne exfat defaults,nofail,uid=100000,gid=100000,umask=000 0 0"
        );
        assert_eq!(MountEntry::parse_line(&line), Some(entry));
    }

    #[test]
    fn mount_entry_parse_skips_comments_and_non_uuid_lines() {
        assert_eq!(MountEntry::parse_line("# /etc/fstab"), None);
        assert_eq!(MountEntry::parse_line(""), None);
        assert_eq!(
            MountEntry::parse_line("/dev/sda1 / ext4 defaults 0 1"),
            None
        );
    }
}
