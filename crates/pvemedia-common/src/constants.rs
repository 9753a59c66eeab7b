//! System-wide constants and default paths.

/// UID/GID offset applied to unprivileged containers by the host.
///
/// An in-container id `N` appears on the host as `N + 100000`.
pub const ID_MAP_OFFSET: u32 = 100_000;

/// Persistent mount table consulted at boot.
pub const FSTAB_PATH: &str = "/etc/fstab";

/// Directory holding per-container LXC configuration files (`<id>.conf`).
pub const LXC_CONFIG_DIR: &str = "/etc/pve/lxc";

/// Lowest container ID Proxmox VE accepts for user containers.
pub const MIN_CT_ID: u32 = 100;

/// Minimum root password length accepted by `pct create`.
pub const MIN_PASSWORD_LEN: usize = 5;

/// Default OS template used for the media container.
pub const DEFAULT_TEMPLATE: &str = "debian-12-standard_12.7-1_amd64.tar.zst";

/// Default storage pool holding downloaded templates.
pub const DEFAULT_TEMPLATE_STORAGE: &str = "local";

/// Default storage pool for the container root filesystem.
pub const DEFAULT_ROOTFS_STORAGE: &str = "local-lvm";

/// Default host-side mount point for the external media drive.
pub const DEFAULT_MOUNT_POINT: &str = "/mnt/media";

/// Default path where the media drive appears inside the container.
pub const DEFAULT_CONTAINER_MEDIA_PATH: &str = "/media";

/// Service account the media server runs as inside the container.
pub const MEDIA_SERVICE_USER: &str = "jellyfin";

/// Application name used in CLI output.
pub const APP_NAME: &str = "pvemedia";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "pvemedia";
