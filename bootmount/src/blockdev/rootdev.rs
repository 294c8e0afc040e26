//! Locating partitions of the boot disk by their role.
//!
//! The image layout places the boot, root and permanent-storage filesystems at
//! fixed partition numbers on the disk the kernel booted from. The kernel
//! command line names the root partition (`root=`); its siblings are derived
//! from it.

use bootmount_shared::errors::{BootError, BootResult};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use super::PartitionLocator;
use crate::constants::rootdev;

/// Partition roles of the appliance image, numbered by their slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionRole {
    Boot = 1,
    Root = 2,
    Perm = 4,
}

impl PartitionRole {
    pub fn number(self) -> u8 {
        self as u8
    }
}

/// Given a logical role, return the device node to use on this boot.
pub trait PermDeviceLookup {
    fn partition(&self, role: PartitionRole) -> BootResult<PathBuf>;
}

/// Derives sibling partitions from the kernel command line's `root=`.
///
/// - `root=PARTUUID=2e18c40c-02` → sibling UUID `2e18c40c-04`, resolved on disk
/// - `root=/dev/mmcblk0p2` → `/dev/mmcblk0p4`
/// - anything else → `/dev/mmcblk0p4`
pub struct CmdlineRootDevice {
    cmdline_path: PathBuf,
    locator: Arc<dyn PartitionLocator>,
}

impl CmdlineRootDevice {
    pub fn new(cmdline_path: impl Into<PathBuf>, locator: Arc<dyn PartitionLocator>) -> Self {
        Self {
            cmdline_path: cmdline_path.into(),
            locator,
        }
    }

    fn read_cmdline(&self) -> Option<String> {
        fs::read_to_string(&self.cmdline_path)
            .inspect_err(|e| {
                tracing::warn!(
                    path = %self.cmdline_path.display(),
                    error = %e,
                    "Cannot read kernel command line, assuming default boot disk"
                )
            })
            .ok()
    }
}

impl PermDeviceLookup for CmdlineRootDevice {
    fn partition(&self, role: PartitionRole) -> BootResult<PathBuf> {
        let cmdline = self.read_cmdline().unwrap_or_default();

        let root = root_arg(&cmdline);

        let device = if let Some(root_uuid) = root.and_then(strip_partuuid) {
            let uuid = sibling_partuuid(root_uuid, role)?;
            self.locator.locate(&uuid)?
        } else if let Some(root_device) = root.filter(|arg| arg.starts_with("/dev/")) {
            sibling_device(root_device, role)
        } else {
            PathBuf::from(format!("{}{}", rootdev::DEFAULT_DISK_PREFIX, role.number()))
        };

        tracing::debug!(role = ?role, device = %device.display(), "Located partition");
        Ok(device)
    }
}

fn root_arg(cmdline: &str) -> Option<&str> {
    cmdline
        .split_whitespace()
        .filter_map(|param| param.strip_prefix("root="))
        .last()
}

/// `PARTUUID=<uuid>` → `<uuid>`, prefix matched case-insensitively.
fn strip_partuuid(arg: &str) -> Option<&str> {
    let prefix = rootdev::PARTUUID_PREFIX;
    match arg.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => Some(&arg[prefix.len()..]),
        _ => None,
    }
}

/// Replace the trailing partition number (two hex digits) of a PARTUUID.
fn sibling_partuuid(root_uuid: &str, role: PartitionRole) -> BootResult<String> {
    let split = root_uuid.len().checked_sub(2).filter(|&at| {
        root_uuid.is_char_boundary(at) && root_uuid[at..].chars().all(|c| c.is_ascii_hexdigit())
    });

    match split {
        Some(at) => Ok(format!("{}{:02x}", &root_uuid[..at], role.number())),
        None => Err(BootError::InvalidArgument(format!(
            "root PARTUUID {} does not end in a partition number",
            root_uuid
        ))),
    }
}

/// `/dev/sda2` → `/dev/sda4`, `/dev/mmcblk0p2` → `/dev/mmcblk0p4`.
fn sibling_device(root_device: &str, role: PartitionRole) -> PathBuf {
    let ends_in_digit = |s: &str| s.ends_with(|c: char| c.is_ascii_digit());

    let disk = root_device.trim_end_matches(|c: char| c.is_ascii_digit());
    let disk = match disk.strip_suffix('p') {
        Some(base) if ends_in_digit(base) => base,
        _ => disk,
    };
    let separator = if ends_in_digit(disk) { "p" } else { "" };

    PathBuf::from(format!("{}{}{}", disk, separator, role.number()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingLocator {
        asked: RefCell<Vec<String>>,
    }

    impl PartitionLocator for RecordingLocator {
        fn locate(&self, part_uuid: &str) -> BootResult<PathBuf> {
            self.asked.borrow_mut().push(part_uuid.to_string());
            Ok(PathBuf::from("/dev/sda4"))
        }
    }

    fn lookup_with(cmdline: &str) -> (TempDir, CmdlineRootDevice, Arc<RecordingLocator>) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cmdline");
        fs::write(&path, cmdline).unwrap();
        let locator = Arc::new(RecordingLocator::default());
        let lookup = CmdlineRootDevice::new(path, Arc::clone(&locator) as Arc<dyn PartitionLocator>);
        (dir, lookup, locator)
    }

    #[test]
    fn test_partuuid_sibling_is_resolved() {
        let (_dir, lookup, locator) =
            lookup_with("console=ttyS0 root=PARTUUID=2e18c40c-02 rootwait\n");

        let device = lookup.partition(PartitionRole::Perm).unwrap();
        assert_eq!(device, PathBuf::from("/dev/sda4"));
        assert_eq!(*locator.asked.borrow(), vec!["2e18c40c-04".to_string()]);
    }

    #[test]
    fn test_gpt_partuuid_sibling() {
        let (_dir, lookup, locator) =
            lookup_with("root=PARTUUID=60c24cc1-f3f9-427a-8199-76baa2d60002");

        lookup.partition(PartitionRole::Perm).unwrap();
        assert_eq!(
            *locator.asked.borrow(),
            vec!["60c24cc1-f3f9-427a-8199-76baa2d60004".to_string()]
        );
    }

    #[test]
    fn test_device_path_siblings() {
        assert_eq!(
            sibling_device("/dev/mmcblk0p2", PartitionRole::Perm),
            PathBuf::from("/dev/mmcblk0p4")
        );
        assert_eq!(
            sibling_device("/dev/sda2", PartitionRole::Perm),
            PathBuf::from("/dev/sda4")
        );
        assert_eq!(
            sibling_device("/dev/nvme0n1p2", PartitionRole::Boot),
            PathBuf::from("/dev/nvme0n1p1")
        );
    }

    #[test]
    fn test_device_root_arg() {
        let (_dir, lookup, locator) = lookup_with("root=/dev/vda2 ro");
        assert_eq!(
            lookup.partition(PartitionRole::Perm).unwrap(),
            PathBuf::from("/dev/vda4")
        );
        assert!(locator.asked.borrow().is_empty());
    }

    #[test]
    fn test_default_without_root_arg() {
        let (_dir, lookup, _) = lookup_with("console=ttyS0");
        assert_eq!(
            lookup.partition(PartitionRole::Perm).unwrap(),
            PathBuf::from("/dev/mmcblk0p4")
        );
    }

    #[test]
    fn test_unreadable_cmdline_uses_default() {
        let lookup = CmdlineRootDevice::new(
            "/nonexistent/cmdline",
            Arc::new(RecordingLocator::default()),
        );
        assert_eq!(
            lookup.partition(PartitionRole::Root).unwrap(),
            PathBuf::from("/dev/mmcblk0p2")
        );
    }

    #[test]
    fn test_malformed_partuuid() {
        assert!(sibling_partuuid("x", PartitionRole::Perm).is_err());
        assert!(sibling_partuuid("abcd-zz", PartitionRole::Perm).is_err());
    }
}
