//! Mounting user-declared additional disks.
//!
//! Disks are declared by partition UUID in `<perm>/mount-disks.json` and
//! mounted in document order once permanent storage is available.

use bootmount_shared::errors::{BootError, BootResult};
use std::io::ErrorKind;
use tracing::{info, warn};

use crate::boot::BootEnv;
use crate::constants::files;
use crate::fs::{MountRequest, mount_fs};

pub use config::{AdditionalDisks, DiskMount};

mod config;

/// Mount every valid entry of the additional disks document.
///
/// A missing document means there is nothing to do. Invalid entries are
/// logged and skipped; the first entry that fails to resolve or mount aborts
/// the remaining ones. Returns the number of disks mounted.
pub fn mount_additional_disks(env: &BootEnv) -> BootResult<usize> {
    let file = env.perm_mountpoint.join(files::ADDITIONAL_DISKS);

    let data = match std::fs::read(env.root.path(&file)) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("No additional disks to mount");
            return Ok(0);
        }
        Err(e) => {
            return Err(BootError::Storage(format!(
                "read {}: {}",
                file.display(),
                e
            )));
        }
    };

    let extra = AdditionalDisks::parse(&data)?;

    let mut mounted = 0;
    for disk in &extra.disks {
        if let Err(e) = disk.validate() {
            warn!(error = %e, "Skipping invalid additional disk entry");
            continue;
        }

        mount_disk(env, disk).map_err(|e| {
            BootError::Storage(format!(
                "can not mount disk with partUUID {}: {}",
                disk.part_uuid, e
            ))
        })?;
        mounted += 1;
    }

    Ok(mounted)
}

fn mount_disk(env: &BootEnv, disk: &DiskMount) -> BootResult<()> {
    let device = env.locator.locate(&disk.part_uuid)?;
    let source = device.to_string_lossy();
    let target = env.root.path(&disk.mountpoint);

    mount_fs(
        env.mounter.as_ref(),
        &MountRequest::new(&source, &target, &disk.fs_type).data(&disk.options),
    )
}
