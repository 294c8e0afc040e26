//! Early-boot filesystem bring-up.
//!
//! Establishes the mount topology an appliance image needs before any
//! workload starts:
//!
//! 1. ephemeral filesystems (`/tmp`, `/dev`, `/proc`, `/sys`, `/run`, cgroup2)
//! 2. the permanent storage partition on `/perm`
//! 3. a compatibility `/etc` for legacy read-only root images
//! 4. additional disks declared by partition UUID in `/perm/mount-disks.json`
//!
//! ```ignore
//! use bootmount::{BootOptions, bring_up};
//!
//! let report = bring_up(&BootOptions::default())?;
//! println!("{} additional disks mounted", report.additional_disks);
//! ```

pub mod blockdev;
pub mod boot;
pub mod constants;
pub mod disks;
pub mod fs;
pub mod options;
pub mod pipeline;
pub mod util;

pub use blockdev::{BlockDeviceResolver, PartitionLocator};
pub use boot::{BootEnv, BootReport, bring_up, mount_system_filesystems};
pub use bootmount_shared::errors::{BootError, BootResult};
pub use disks::{DiskMount, mount_additional_disks};
pub use options::BootOptions;
