//! Block device discovery.
//!
//! Device enumeration order is not stable across boots, so partitions are
//! addressed by partition UUID:
//! - [`BlockDeviceResolver`]: partition UUID → device node, by scanning `/sys/block`
//! - [`CmdlineRootDevice`]: logical role (boot/root/perm) → device node for this boot
//! - [`NativeDiskOpener`]: reads GPT (falling back to MBR) partition tables

use bootmount_shared::errors::BootResult;
use std::path::PathBuf;

pub use native::NativeDiskOpener;
pub use resolver::BlockDeviceResolver;
pub use rootdev::{CmdlineRootDevice, PartitionRole, PermDeviceLookup};
pub use table::{Disk, DiskOpener, Partition, PartitionTable};

mod native;
mod resolver;
mod rootdev;
mod table;

/// Maps a partition UUID to the device node currently carrying it.
pub trait PartitionLocator {
    fn locate(&self, part_uuid: &str) -> BootResult<PathBuf>;
}
