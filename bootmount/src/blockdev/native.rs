//! Native partition table reader.
//!
//! GPT is tried first (partition GUIDs); devices without a GPT header fall back
//! to MBR, where the kernel's PARTUUID is `SSSSSSSS-PP`: the little-endian disk
//! signature and the partition number, both in hex.

use bootmount_shared::errors::{BootError, BootResult};
use std::fs::File;
use std::io::Seek;
use std::path::{Path, PathBuf};

use super::table::{Disk, DiskOpener, Partition, PartitionTable};

const SECTOR_SIZE: u32 = 512;

#[derive(Debug, Default, Clone, Copy)]
pub struct NativeDiskOpener;

impl DiskOpener for NativeDiskOpener {
    fn open(&self, device: &Path) -> BootResult<Box<dyn Disk>> {
        let file = File::open(device)
            .map_err(|e| BootError::Storage(format!("open {}: {}", device.display(), e)))?;
        Ok(Box::new(NativeDisk {
            path: device.to_path_buf(),
            file,
        }))
    }
}

struct NativeDisk {
    path: PathBuf,
    file: File,
}

impl NativeDisk {
    fn read_gpt(&mut self) -> BootResult<PartitionTable> {
        let disk = gpt::GptConfig::new()
            .writable(false)
            .open_from_device(&mut self.file)
            .map_err(|e| BootError::Storage(format!("gpt: {}", e)))?;

        // Slot i is partition number i + 1, gaps included
        let partitions = disk.partitions();
        let last = partitions.keys().next_back().copied().unwrap_or(0);
        let slots = (1..=last)
            .map(|number| match partitions.get(&number) {
                Some(p) => Partition::new(p.part_guid.to_string()),
                None => Partition::unused(),
            })
            .collect();

        Ok(PartitionTable::new(slots))
    }

    fn read_mbr(&mut self) -> BootResult<PartitionTable> {
        self.file
            .rewind()
            .map_err(|e| BootError::Storage(format!("mbr: {}", e)))?;
        let mbr = mbrman::MBR::read_from(&mut self.file, SECTOR_SIZE)
            .map_err(|e| BootError::Storage(format!("mbr: {}", e)))?;

        let signature = u32::from_le_bytes(mbr.header.disk_signature);
        let slots = mbr
            .iter()
            .map(|(number, entry)| {
                if entry.is_used() {
                    Partition::new(mbr_partuuid(signature, number))
                } else {
                    Partition::unused()
                }
            })
            .collect();

        Ok(PartitionTable::new(slots))
    }
}

impl Disk for NativeDisk {
    fn partition_table(&mut self) -> BootResult<PartitionTable> {
        match self.read_gpt() {
            Ok(table) => Ok(table),
            Err(gpt_err) => self.read_mbr().map_err(|mbr_err| {
                BootError::Storage(format!(
                    "no partition table on {} ({}; {})",
                    self.path.display(),
                    gpt_err,
                    mbr_err
                ))
            }),
        }
    }
}

fn mbr_partuuid(signature: u32, number: usize) -> String {
    format!("{:08x}-{:02x}", signature, number)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Disk images with real partition tables.

    use std::collections::BTreeMap;
    use std::fs::File;
    use std::path::Path;

    const IMAGE_SIZE: u64 = 1024 * 1024;
    const PARTITION_SECTORS: u64 = 64;

    fn blank_image(path: &Path) -> File {
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .unwrap();
        file.set_len(IMAGE_SIZE).unwrap();
        file
    }

    /// GPT image behind a protective MBR, carrying `(number, guid)` partitions.
    /// Numbers may leave gaps.
    pub fn gpt_image(path: &Path, partitions: &[(u32, &str)]) {
        let mut file = blank_image(path);
        let blocks = u32::try_from(IMAGE_SIZE / 512 - 1).unwrap();
        gpt::mbr::ProtectiveMBR::with_lb_size(blocks)
            .overwrite_lba0(&mut file)
            .unwrap();
        let mut disk = gpt::GptConfig::new()
            .writable(true)
            .create_from_device(&mut file, None)
            .unwrap();

        let table: BTreeMap<u32, gpt::partition::Partition> = partitions
            .iter()
            .map(|&(number, guid)| {
                let first_lba = 64 + u64::from(number) * PARTITION_SECTORS;
                let partition = gpt::partition::Partition {
                    part_type_guid: gpt::partition_types::LINUX_FS,
                    part_guid: uuid::Uuid::parse_str(guid).unwrap(),
                    first_lba,
                    last_lba: first_lba + PARTITION_SECTORS - 1,
                    flags: 0,
                    name: format!("part{}", number),
                };
                (number, partition)
            })
            .collect();
        disk.update_partitions(table).unwrap();
        disk.write().unwrap();
    }

    /// MBR image with the given primary slots (1-4) in use.
    pub fn mbr_image(path: &Path, signature: u32, used: &[usize]) {
        let mut file = blank_image(path);
        let mut mbr = mbrman::MBR::new_from(&mut file, 512, signature.to_le_bytes()).unwrap();
        for &number in used {
            mbr[number] = mbrman::MBRPartitionEntry {
                boot: mbrman::BOOT_INACTIVE,
                first_chs: mbrman::CHS::empty(),
                sys: 0x83,
                last_chs: mbrman::CHS::empty(),
                starting_lba: (number as u32) * 64,
                sectors: 64,
            };
        }
        mbr.write_into(&mut file).unwrap();
    }
}
