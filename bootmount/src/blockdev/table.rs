//! Partition table capability consumed by the resolver.

use bootmount_shared::errors::BootResult;
use std::path::Path;

/// One slot of a partition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Partition UUID as reported by the table; empty for unused slots.
    pub uuid: String,
}

impl Partition {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self { uuid: uuid.into() }
    }

    pub fn unused() -> Self {
        Self {
            uuid: String::new(),
        }
    }

    pub fn is_used(&self) -> bool {
        !self.uuid.is_empty()
    }
}

/// Partitions in table order. Slot `i` is partition number `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionTable {
    pub partitions: Vec<Partition>,
}

impl PartitionTable {
    pub fn new(partitions: Vec<Partition>) -> Self {
        Self { partitions }
    }

    /// 1-based number of the first partition whose UUID equals `part_uuid`,
    /// ignoring ASCII case.
    pub fn find(&self, part_uuid: &str) -> Option<usize> {
        self.partitions
            .iter()
            .position(|p| p.is_used() && p.uuid.eq_ignore_ascii_case(part_uuid))
            .map(|index| index + 1)
    }
}

/// A block device opened read-only.
pub trait Disk {
    fn partition_table(&mut self) -> BootResult<PartitionTable>;
}

/// Opens block device nodes read-only.
pub trait DiskOpener {
    fn open(&self, device: &Path) -> BootResult<Box<dyn Disk>>;
}
