//! Configuration for the boot bring-up.

use crate::constants::paths;
use bootmount_shared::errors::{BootError, BootResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Paths and switches for one bring-up run.
///
/// Defaults describe the live system. `root` prefixes every filesystem side
/// effect (symlinks, directories, `/etc/hosts`) and every mount target, which
/// lets the whole sequence run against a staging directory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BootOptions {
    /// Root directory all system paths are resolved under.
    ///
    /// Default: /
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Permanent storage mountpoint (system path, below `root`).
    ///
    /// Default: /perm
    #[serde(default = "default_perm_mountpoint")]
    pub perm_mountpoint: PathBuf,

    /// Block device directory scanned during partition UUID resolution.
    ///
    /// Default: /sys/block
    #[serde(default = "default_sys_block_dir")]
    pub sys_block_dir: PathBuf,

    /// Directory holding block device nodes.
    ///
    /// Default: /dev
    #[serde(default = "default_dev_dir")]
    pub dev_dir: PathBuf,

    /// Kernel command line, used to locate the permanent storage partition.
    ///
    /// Default: /proc/cmdline
    #[serde(default = "default_cmdline_path")]
    pub cmdline_path: PathBuf,

    /// Mount the disks declared in `<perm>/mount-disks.json`.
    ///
    /// Default: true
    #[serde(default = "default_additional_disks")]
    pub additional_disks: bool,
}

fn default_root() -> PathBuf {
    PathBuf::from("/")
}

fn default_perm_mountpoint() -> PathBuf {
    PathBuf::from(paths::PERM)
}

fn default_sys_block_dir() -> PathBuf {
    PathBuf::from(paths::SYS_BLOCK)
}

fn default_dev_dir() -> PathBuf {
    PathBuf::from(paths::DEV)
}

fn default_cmdline_path() -> PathBuf {
    PathBuf::from(paths::PROC_CMDLINE)
}

fn default_additional_disks() -> bool {
    true
}

impl Default for BootOptions {
    fn default() -> Self {
        Self {
            root: default_root(),
            perm_mountpoint: default_perm_mountpoint(),
            sys_block_dir: default_sys_block_dir(),
            dev_dir: default_dev_dir(),
            cmdline_path: default_cmdline_path(),
            additional_disks: default_additional_disks(),
        }
    }
}

impl BootOptions {
    /// Parse options from a JSON document; missing keys take their defaults.
    pub fn from_json(json: &str) -> BootResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| BootError::Config(format!("invalid boot options: {}", e)))
    }

    /// Reject relative paths: every path here is interpreted from `/`.
    pub fn sanitize(&self) -> BootResult<()> {
        let fields: [(&str, &Path); 5] = [
            ("root", self.root.as_path()),
            ("perm_mountpoint", self.perm_mountpoint.as_path()),
            ("sys_block_dir", self.sys_block_dir.as_path()),
            ("dev_dir", self.dev_dir.as_path()),
            ("cmdline_path", self.cmdline_path.as_path()),
        ];

        for (name, path) in fields {
            if !path.is_absolute() {
                return Err(BootError::Config(format!(
                    "{} must be an absolute path, got {}",
                    name,
                    path.display()
                )));
            }
        }
        Ok(())
    }
}
