//! Additional disk declarations (`mount-disks.json`).

use bootmount_shared::errors::{BootError, BootResult};
use serde::{Deserialize, Serialize};

use crate::constants::files;

/// The document stored on permanent storage.
///
/// ```json
/// {"disks": [{"partUUID": "…", "type": "ext4", "mountpoint": "/data", "options": ""}]}
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AdditionalDisks {
    #[serde(default)]
    pub disks: Vec<DiskMount>,
}

impl AdditionalDisks {
    pub fn parse(data: &[u8]) -> BootResult<Self> {
        serde_json::from_slice(data).map_err(|e| {
            BootError::Config(format!("can not parse {}: {}", files::ADDITIONAL_DISKS, e))
        })
    }
}

/// One declared extra mount.
///
/// Missing keys deserialize as empty strings so an incomplete entry is
/// reported by [`DiskMount::validate`] instead of failing the whole document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskMount {
    #[serde(rename = "partUUID", default)]
    pub part_uuid: String,

    #[serde(rename = "type", default)]
    pub fs_type: String,

    #[serde(default)]
    pub mountpoint: String,

    /// Mount options passed verbatim to the kernel; may be empty.
    #[serde(default)]
    pub options: String,
}

impl DiskMount {
    pub fn validate(&self) -> BootResult<()> {
        if self.part_uuid.is_empty() {
            return Err(BootError::InvalidArgument(
                "partUUID is needed to mount the disk".to_string(),
            ));
        }
        if self.fs_type.is_empty() {
            return Err(BootError::InvalidArgument(format!(
                "type is needed to mount disk {}",
                self.part_uuid
            )));
        }
        if self.mountpoint.is_empty() {
            return Err(BootError::InvalidArgument(format!(
                "no mountpoint set for disk {}",
                self.part_uuid
            )));
        }
        Ok(())
    }
}
