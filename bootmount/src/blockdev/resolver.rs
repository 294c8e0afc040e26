//! Partition UUID resolution by scanning the block device tree.

use bootmount_shared::errors::{BootError, BootResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use super::PartitionLocator;
use super::table::DiskOpener;

/// Result of inspecting one entry of the block device tree.
#[derive(Debug)]
enum ScanStep {
    /// The partition was found at this device node; stop scanning.
    Found(PathBuf),
    /// Nothing here; keep scanning.
    Continue,
    /// The scan cannot proceed at all.
    Abort(BootError),
}

/// Finds the device node of a partition by its partition UUID.
///
/// Every symlink under the block directory (`/sys/block/sda` → `../devices/...`)
/// names a device node under the device directory. Each one is opened
/// read-only and its partition table compared against the requested UUID.
/// Devices that cannot be opened or have no readable table are skipped.
///
/// Nothing is cached: device names may differ between calls.
pub struct BlockDeviceResolver {
    sys_block_dir: PathBuf,
    dev_dir: PathBuf,
    opener: Box<dyn DiskOpener>,
}

impl BlockDeviceResolver {
    pub fn new(
        sys_block_dir: impl Into<PathBuf>,
        dev_dir: impl Into<PathBuf>,
        opener: Box<dyn DiskOpener>,
    ) -> Self {
        Self {
            sys_block_dir: sys_block_dir.into(),
            dev_dir: dev_dir.into(),
            opener,
        }
    }

    /// Resolve `part_uuid` to `<device><n>`, where `n` is the 1-based position
    /// of the partition in its table.
    ///
    /// The first match in traversal order wins. Fails with
    /// [`BootError::NotFound`] if no device carries the UUID.
    pub fn resolve(&self, part_uuid: &str) -> BootResult<PathBuf> {
        let walker = WalkDir::new(&self.sys_block_dir).sort_by_file_name();

        for entry in walker {
            match self.inspect(entry, part_uuid) {
                ScanStep::Found(device) => {
                    debug!(part_uuid, device = %device.display(), "Resolved partition UUID");
                    return Ok(device);
                }
                ScanStep::Continue => continue,
                ScanStep::Abort(e) => return Err(e),
            }
        }

        Err(BootError::NotFound(format!(
            "could not find partition with UUID {}",
            part_uuid
        )))
    }

    fn inspect(&self, entry: walkdir::Result<DirEntry>, part_uuid: &str) -> ScanStep {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return ScanStep::Abort(BootError::Storage(format!(
                    "cannot scan {} for partition with UUID {}: {}",
                    self.sys_block_dir.display(),
                    part_uuid,
                    e
                )));
            }
            Err(e) => {
                warn!(part_uuid, error = %e, "Error while searching for partition");
                return ScanStep::Continue;
            }
        };

        // Only symlinks represent block devices
        if entry.depth() == 0 || !entry.path_is_symlink() {
            debug!(path = %entry.path().display(), "Skipping non-device entry");
            return ScanStep::Continue;
        }

        let device = self.dev_dir.join(entry.file_name());
        self.match_device(&device, part_uuid)
    }

    fn match_device(&self, device: &Path, part_uuid: &str) -> ScanStep {
        let mut disk = match self.opener.open(device) {
            Ok(disk) => disk,
            Err(e) => {
                debug!(part_uuid, device = %device.display(), error = %e, "Skipping unreadable device");
                return ScanStep::Continue;
            }
        };

        let table = match disk.partition_table() {
            Ok(table) => table,
            Err(e) => {
                debug!(part_uuid, device = %device.display(), error = %e, "Skipping device without partition table");
                return ScanStep::Continue;
            }
        };

        match table.find(part_uuid) {
            Some(number) => ScanStep::Found(partition_node(device, number)),
            None => ScanStep::Continue,
        }
    }
}

impl PartitionLocator for BlockDeviceResolver {
    fn locate(&self, part_uuid: &str) -> BootResult<PathBuf> {
        self.resolve(part_uuid)
    }
}

/// `/dev/sda` + 1 → `/dev/sda1`. The number is appended without a separator.
fn partition_node(device: &Path, number: usize) -> PathBuf {
    let mut node = OsString::from(device.as_os_str());
    node.push(number.to_string());
    PathBuf::from(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockdev::native::NativeDiskOpener;
    use crate::blockdev::native::testing::gpt_image;
    use crate::blockdev::table::{Disk, Partition, PartitionTable};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::os::unix::fs::{PermissionsExt, symlink};
    use std::rc::Rc;
    use tempfile::TempDir;

    struct FakeDisk(Option<PartitionTable>);

    impl Disk for FakeDisk {
        fn partition_table(&mut self) -> BootResult<PartitionTable> {
            self.0
                .clone()
                .ok_or_else(|| BootError::Storage("no table".into()))
        }
    }

    /// Devices missing from `tables` fail to open; `None` tables fail to read.
    #[derive(Default)]
    struct FakeOpener {
        tables: HashMap<PathBuf, Option<PartitionTable>>,
        opened: Rc<RefCell<Vec<PathBuf>>>,
    }

    impl DiskOpener for FakeOpener {
        fn open(&self, device: &Path) -> BootResult<Box<dyn Disk>> {
            self.opened.borrow_mut().push(device.to_path_buf());
            match self.tables.get(device) {
                Some(table) => Ok(Box::new(FakeDisk(table.clone()))),
                None => Err(BootError::Storage(format!("open {}", device.display()))),
            }
        }
    }

    struct Fixture {
        _dir: TempDir,
        sys_block: PathBuf,
        dev: PathBuf,
    }

    impl Fixture {
        fn new(devices: &[&str]) -> Self {
            let dir = TempDir::new().unwrap();
            let sys_block = dir.path().join("sys/block");
            let dev = dir.path().join("dev");
            std::fs::create_dir_all(&sys_block).unwrap();
            std::fs::create_dir_all(dir.path().join("sys/devices")).unwrap();
            for name in devices {
                symlink(format!("../devices/{}", name), sys_block.join(name)).unwrap();
            }
            Self {
                _dir: dir,
                sys_block,
                dev,
            }
        }

        fn resolver(&self, opener: FakeOpener) -> BlockDeviceResolver {
            BlockDeviceResolver::new(&self.sys_block, &self.dev, Box::new(opener))
        }

        fn dev(&self, name: &str) -> PathBuf {
            self.dev.join(name)
        }
    }

    fn table(uuids: &[&str]) -> Option<PartitionTable> {
        Some(PartitionTable::new(
            uuids.iter().map(|u| Partition::new(*u)).collect(),
        ))
    }

    #[test]
    fn test_resolves_one_based_index() {
        let fx = Fixture::new(&["sda"]);
        let mut opener = FakeOpener::default();
        opener
            .tables
            .insert(fx.dev("sda"), table(&["1111", "2222", "3333"]));

        let device = fx.resolver(opener).resolve("3333").unwrap();
        assert_eq!(device, fx.dev("sda3"));
    }

    #[test]
    fn test_case_insensitive_both_ways() {
        let fx = Fixture::new(&["sda"]);
        let mut opener = FakeOpener::default();
        opener.tables.insert(fx.dev("sda"), table(&["AAAA-1111"]));
        let resolver = fx.resolver(opener);

        assert_eq!(resolver.resolve("aaaa-1111").unwrap(), fx.dev("sda1"));
        assert_eq!(resolver.resolve("AAAA-1111").unwrap(), fx.dev("sda1"));
    }

    #[test]
    fn test_not_found_names_uuid() {
        let fx = Fixture::new(&["sda"]);
        let mut opener = FakeOpener::default();
        opener.tables.insert(fx.dev("sda"), table(&["1111"]));

        let err = fx.resolver(opener).resolve("dead-beef").unwrap_err();
        assert!(matches!(err, BootError::NotFound(_)));
        assert!(err.to_string().contains("dead-beef"));
    }

    #[test]
    fn test_unreadable_devices_are_skipped() {
        // loop0 fails to open, ram0 has no table, sdb carries the partition
        let fx = Fixture::new(&["loop0", "ram0", "sdb"]);
        let mut opener = FakeOpener::default();
        opener.tables.insert(fx.dev("ram0"), None);
        opener.tables.insert(fx.dev("sdb"), table(&["x", "target"]));

        assert_eq!(fx.resolver(opener).resolve("target").unwrap(), fx.dev("sdb2"));
    }

    #[test]
    fn test_scan_stops_at_first_match() {
        let fx = Fixture::new(&["sda", "sdb", "sdc"]);
        let opened = Rc::new(RefCell::new(Vec::new()));
        let mut opener = FakeOpener {
            opened: Rc::clone(&opened),
            ..Default::default()
        };
        opener.tables.insert(fx.dev("sda"), table(&["other"]));
        opener.tables.insert(fx.dev("sdb"), table(&["dup"]));
        opener.tables.insert(fx.dev("sdc"), table(&["dup"]));

        assert_eq!(fx.resolver(opener).resolve("dup").unwrap(), fx.dev("sdb1"));
        assert_eq!(*opened.borrow(), vec![fx.dev("sda"), fx.dev("sdb")]);
    }

    #[test]
    fn test_non_symlinks_are_ignored() {
        let fx = Fixture::new(&[]);
        std::fs::write(fx.sys_block.join("sda"), b"").unwrap();
        let mut opener = FakeOpener::default();
        opener.tables.insert(fx.dev("sda"), table(&["1111"]));

        assert!(fx.resolver(opener).resolve("1111").is_err());
    }

    #[test]
    fn test_missing_block_dir_is_hard_failure() {
        let dir = TempDir::new().unwrap();
        let resolver = BlockDeviceResolver::new(
            dir.path().join("absent"),
            dir.path().join("dev"),
            Box::new(FakeOpener::default()),
        );

        let err = resolver.resolve("1111").unwrap_err();
        assert!(matches!(err, BootError::Storage(_)));
    }

    #[test]
    fn test_resolves_gpt_image_with_native_opener() {
        let fx = Fixture::new(&["loop0", "sdz"]);
        std::fs::create_dir_all(&fx.dev).unwrap();
        std::fs::write(fx.dev("loop0"), b"").unwrap();
        gpt_image(
            &fx.dev("sdz"),
            &[
                (1, "11111111-2222-4333-8444-555555555555"),
                (3, "aaaaaaaa-bbbb-4ccc-8ddd-eeeeeeeeeeee"),
            ],
        );
        let resolver = BlockDeviceResolver::new(&fx.sys_block, &fx.dev, Box::new(NativeDiskOpener));

        let device = resolver
            .resolve("AAAAAAAA-BBBB-4CCC-8DDD-EEEEEEEEEEEE")
            .unwrap();
        assert_eq!(device, fx.dev("sdz3"));
    }

    #[test]
    fn test_unreadable_entries_are_skipped() {
        let fx = Fixture::new(&["sdb"]);
        let locked = fx.sys_block.join("holders");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        let mut opener = FakeOpener::default();
        opener.tables.insert(fx.dev("sdb"), table(&["target"]));

        // "holders" sorts before "sdb"; its contents cannot be listed
        // unless running as root
        let device = fx.resolver(opener).resolve("target");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(device.unwrap(), fx.dev("sdb1"));
    }

    #[test]
    fn test_partition_node_appends_without_separator() {
        assert_eq!(
            partition_node(Path::new("/dev/mmcblk0"), 4),
            PathBuf::from("/dev/mmcblk04")
        );
    }
}
