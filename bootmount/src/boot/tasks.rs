//! Tasks of the system mount sequence.

use bootmount_shared::errors::{BootError, BootResult};
use nix::mount::MsFlags;
use tracing::{debug, warn};

use super::{BootEnv, PERM_STEP};
use super::compat;
use crate::blockdev::PartitionRole;
use crate::constants::{files, fstype, paths};
use crate::fs::{MountRequest, mount_fs};
use crate::pipeline::{PipelineTask, TaskStatus};

/// Mount one filesystem, optionally creating its mountpoint first.
pub struct MountTask {
    name: &'static str,
    source: &'static str,
    target: &'static str,
    fstype: &'static str,
    flags: MsFlags,
    data: &'static str,
    create_dir: bool,
}

impl MountTask {
    /// Source and filesystem type are the same for pseudo filesystems.
    pub fn new(name: &'static str, fstype: &'static str, target: &'static str) -> Self {
        Self {
            name,
            source: fstype,
            target,
            fstype,
            flags: MsFlags::empty(),
            data: "",
            create_dir: false,
        }
    }

    pub fn flags(mut self, flags: MsFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn create_dir(mut self) -> Self {
        self.create_dir = true;
        self
    }
}

impl PipelineTask<BootEnv> for MountTask {
    fn run(&self, env: &BootEnv) -> BootResult<TaskStatus> {
        if self.create_dir {
            env.root.create_dir_all(self.target, files::DIR_MODE)?;
        }

        let target = env.root.path(self.target);
        let request = MountRequest::new(self.source, &target, self.fstype)
            .flags(self.flags)
            .data(self.data);
        mount_fs(env.mounter.as_ref(), &request)?;
        Ok(TaskStatus::Done)
    }

    fn name(&self) -> &str {
        self.name
    }
}

pub struct SymlinkTask {
    name: &'static str,
    original: &'static str,
    link: &'static str,
}

impl SymlinkTask {
    pub fn new(name: &'static str, original: &'static str, link: &'static str) -> Self {
        Self {
            name,
            original,
            link,
        }
    }
}

impl PipelineTask<BootEnv> for SymlinkTask {
    fn run(&self, env: &BootEnv) -> BootResult<TaskStatus> {
        env.root.symlink(self.original, self.link)?;
        Ok(TaskStatus::Done)
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Rebuild /etc in memory when the root filesystem cannot hold symlinks.
///
/// Old root images have no `/etc/resolv.conf`; that absence is the marker.
pub struct LegacyCompatTask;

impl PipelineTask<BootEnv> for LegacyCompatTask {
    fn run(&self, env: &BootEnv) -> BootResult<TaskStatus> {
        match env.root.exists_no_follow(paths::RESOLV_CONF) {
            Ok(true) => Ok(TaskStatus::NotNeeded),
            Ok(false) => {
                debug!("No {} on root filesystem, entering legacy compat", paths::RESOLV_CONF);
                compat::mount_compat(env)?;
                Ok(TaskStatus::Done)
            }
            // Only a missing file marks a legacy root
            Err(e) => {
                warn!(error = %e, "Cannot inspect root filesystem, assuming modern layout");
                Ok(TaskStatus::NotNeeded)
            }
        }
    }

    fn name(&self) -> &str {
        "legacy_compat"
    }
}

/// Mount the permanent storage partition, trying each filesystem type in turn.
pub struct PermStorageTask;

impl PipelineTask<BootEnv> for PermStorageTask {
    fn run(&self, env: &BootEnv) -> BootResult<TaskStatus> {
        let device = env.perm_device.partition(PartitionRole::Perm)?;
        let source = device.to_string_lossy();
        let target = env.root.path(&env.perm_mountpoint);

        let mut failures = Vec::new();
        for kind in fstype::PERM_CANDIDATES {
            match mount_fs(
                env.mounter.as_ref(),
                &MountRequest::new(&source, &target, kind),
            ) {
                Ok(()) => return Ok(TaskStatus::Done),
                Err(e) if e.is_busy() => {
                    debug!(device = %source, "Permanent storage already mounted");
                    return Ok(TaskStatus::AlreadyMounted);
                }
                Err(e) => {
                    warn!(
                        device = %source,
                        fstype = kind,
                        error = %e,
                        "Could not mount permanent storage partition"
                    );
                    failures.push(format!("{}: {}", kind, e));
                }
            }
        }

        Err(BootError::Storage(format!(
            "could not mount permanent storage partition {} on {} ({})",
            source,
            env.perm_mountpoint.display(),
            failures.join("; ")
        )))
    }

    fn name(&self) -> &str {
        PERM_STEP
    }
}
