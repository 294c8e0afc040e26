//! Boot bring-up constants.
//!
//! Centralized location for every path, filesystem type and file content the
//! bring-up touches.

/// Absolute system paths
pub mod paths {
    pub const TMP: &str = "/tmp";
    pub const DEV: &str = "/dev";
    pub const DEV_PTS: &str = "/dev/pts";
    pub const DEV_SHM: &str = "/dev/shm";
    pub const RUN: &str = "/run";
    pub const PROC: &str = "/proc";
    pub const SYS: &str = "/sys";
    pub const CGROUP: &str = "/sys/fs/cgroup";
    pub const PERM: &str = "/perm";
    pub const ETC: &str = "/etc";
    pub const ETC_SSL: &str = "/etc/ssl";

    pub const SYS_BLOCK: &str = "/sys/block";
    pub const PROC_CMDLINE: &str = "/proc/cmdline";

    pub const RESOLV_CONF: &str = "/etc/resolv.conf";
    pub const TMP_RESOLV_CONF: &str = "/tmp/resolv.conf";
    pub const LOCALTIME: &str = "/etc/localtime";
    pub const CA_BUNDLE: &str = "/etc/ssl/ca-bundle.pem";
    pub const HOSTS: &str = "/etc/hosts";
}

/// Symlink targets created at boot
pub mod links {
    /// DNS servers learned by the kernel's IP autoconfiguration
    pub const PNP_RESOLV: &str = "/proc/net/pnp";

    /// Legacy root images only hold 8.3 file names
    pub const LEGACY_LOCALTIME: &str = "/localtim";

    pub const LEGACY_CACERTS: &str = "/cacerts";
}

pub mod fstype {
    pub const TMPFS: &str = "tmpfs";
    pub const DEVTMPFS: &str = "devtmpfs";
    pub const DEVPTS: &str = "devpts";
    pub const PROC: &str = "proc";
    pub const SYSFS: &str = "sysfs";
    pub const CGROUP2: &str = "cgroup2";

    /// Permanent storage filesystem types, tried in order
    pub const PERM_CANDIDATES: &[&str] = &["ext4", "vfat"];
}

pub mod files {
    /// Additional disk declarations, relative to the permanent storage mountpoint
    pub const ADDITIONAL_DISKS: &str = "mount-disks.json";

    /// Static hosts file for legacy root images (loopback only)
    pub const LEGACY_HOSTS: &str = "127.0.0.1 localhost\n::1 localhost\n";

    /// Mount options for the legacy /etc tmpfs
    pub const LEGACY_ETC_OPTIONS: &str = "size=1M";

    pub const DIR_MODE: u32 = 0o755;
}

/// Kernel command line conventions
pub mod rootdev {
    pub const PARTUUID_PREFIX: &str = "PARTUUID=";

    /// Boot disk assumed when the command line does not name one
    pub const DEFAULT_DISK_PREFIX: &str = "/dev/mmcblk0p";
}

/// Environment variables
pub mod envs {
    pub const ROOT: &str = "BOOTMOUNT_ROOT";
    pub const PERM: &str = "BOOTMOUNT_PERM";
    pub const SKIP_ADDITIONAL_DISKS: &str = "BOOTMOUNT_SKIP_ADDITIONAL_DISKS";
}
