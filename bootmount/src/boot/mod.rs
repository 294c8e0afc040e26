//! Boot mount orchestration.
//!
//! ## Architecture
//!
//! The system mounts are a fixed, table-driven sequence. Each step carries its
//! failure policy:
//!
//! ```text
//!   1. /tmp              tmpfs       fatal
//!   2. /tmp/resolv.conf  symlink     fatal
//!   3. legacy compat     (if needed) fatal
//!   4. /dev              devtmpfs    fatal unless already mounted
//!   5. /dev/pts          devpts      fatal
//!   6. /dev/shm          tmpfs       fatal
//!   7. /run              tmpfs       warn
//!   8. /proc             proc        fatal unless already mounted
//!   9. /sys              sysfs       fatal unless already mounted
//!  10. /perm             ext4|vfat   warn
//!  11. /sys/fs/cgroup    cgroup2     warn
//! ```
//!
//! Additional disks are mounted afterwards, once `/perm` is available.

mod compat;
mod tasks;

use bootmount_shared::errors::BootResult;
use nix::mount::MsFlags;
use std::path::PathBuf;
use std::sync::Arc;

use crate::blockdev::{
    BlockDeviceResolver, CmdlineRootDevice, NativeDiskOpener, PartitionLocator, PermDeviceLookup,
};
use crate::constants::{fstype, links, paths};
use crate::disks;
use crate::fs::{Mounter, NativeMounter, SystemRoot};
use crate::options::BootOptions;
use crate::pipeline::{
    BoxedTask, ExecutionPlan, PipelineExecutor, PipelineMetrics, Step, StepOutcome,
};

use tasks::{LegacyCompatTask, MountTask, PermStorageTask, SymlinkTask};

/// Name of the permanent storage step in [`PipelineMetrics`].
pub const PERM_STEP: &str = "perm";

/// Everything the boot sequence acts on.
pub struct BootEnv {
    pub root: SystemRoot,
    /// Permanent storage mountpoint as a system path.
    pub perm_mountpoint: PathBuf,
    pub mounter: Box<dyn Mounter>,
    pub locator: Arc<dyn PartitionLocator>,
    pub perm_device: Box<dyn PermDeviceLookup>,
}

impl BootEnv {
    /// Environment acting on the live kernel and block devices.
    pub fn native(options: &BootOptions) -> Self {
        let resolver: Arc<dyn PartitionLocator> = Arc::new(BlockDeviceResolver::new(
            &options.sys_block_dir,
            &options.dev_dir,
            Box::new(NativeDiskOpener),
        ));

        Self {
            root: SystemRoot::new(&options.root),
            perm_mountpoint: options.perm_mountpoint.clone(),
            mounter: Box::new(NativeMounter),
            perm_device: Box::new(CmdlineRootDevice::new(
                &options.cmdline_path,
                Arc::clone(&resolver),
            )),
            locator: resolver,
        }
    }
}

// ============================================================================
// EXECUTION PLAN
// ============================================================================

fn system_mount_plan() -> ExecutionPlan<BootEnv> {
    let private = MsFlags::MS_NOSUID | MsFlags::MS_NODEV | MsFlags::MS_RELATIME;

    let steps: Vec<Step<BoxedTask<BootEnv>>> = vec![
        Step::fatal(Box::new(
            MountTask::new("tmp", fstype::TMPFS, paths::TMP).flags(private),
        )),
        Step::fatal(Box::new(SymlinkTask::new(
            "resolv_conf",
            links::PNP_RESOLV,
            paths::TMP_RESOLV_CONF,
        ))),
        Step::fatal(Box::new(LegacyCompatTask)),
        // Network-root and initramfs boots mount these before us
        Step::tolerate_busy(Box::new(MountTask::new(
            "dev",
            fstype::DEVTMPFS,
            paths::DEV,
        ))),
        Step::fatal(Box::new(
            MountTask::new("dev_pts", fstype::DEVPTS, paths::DEV_PTS).create_dir(),
        )),
        Step::fatal(Box::new(
            MountTask::new("dev_shm", fstype::TMPFS, paths::DEV_SHM).create_dir(),
        )),
        Step::warn(Box::new(MountTask::new("run", fstype::TMPFS, paths::RUN))),
        Step::tolerate_busy(Box::new(MountTask::new(
            "proc",
            fstype::PROC,
            paths::PROC,
        ))),
        Step::tolerate_busy(Box::new(MountTask::new(
            "sys",
            fstype::SYSFS,
            paths::SYS,
        ))),
        Step::warn(Box::new(PermStorageTask)),
        Step::warn(Box::new(MountTask::new(
            "cgroup",
            fstype::CGROUP2,
            paths::CGROUP,
        ))),
    ];

    ExecutionPlan::new(steps)
}

/// Perform the system mounts in order.
///
/// Returns the first fatal error; tolerated failures are logged and recorded
/// in the returned metrics.
pub fn mount_system_filesystems(env: &BootEnv) -> BootResult<PipelineMetrics> {
    let metrics = PipelineExecutor::execute(system_mount_plan(), env)?;
    tracing::info!(
        duration_ms = metrics.total_duration_ms as u64,
        warnings = metrics.warnings().count(),
        "System filesystems mounted"
    );
    Ok(metrics)
}

// ============================================================================
// BRING-UP
// ============================================================================

/// Outcome of a full bring-up.
#[derive(Debug, Clone)]
pub struct BootReport {
    pub system: PipelineMetrics,
    /// Additional disks mounted; zero when skipped or none declared.
    pub additional_disks: usize,
}

/// Run the system mount sequence, then mount additional disks.
///
/// Additional disks are only attempted when permanent storage mounted, since
/// their declarations live there.
pub fn run(env: &BootEnv, additional_disks: bool) -> BootResult<BootReport> {
    let system = mount_system_filesystems(env)?;

    let perm_ready = matches!(
        system.outcome(PERM_STEP),
        Some(StepOutcome::Completed | StepOutcome::AlreadyMounted)
    );
    let additional_disks = if !additional_disks {
        0
    } else if !perm_ready {
        tracing::warn!("Permanent storage unavailable, skipping additional disks");
        0
    } else {
        disks::mount_additional_disks(env)?
    };

    Ok(BootReport {
        system,
        additional_disks,
    })
}

/// Bring up the filesystem topology of the live system.
pub fn bring_up(options: &BootOptions) -> BootResult<BootReport> {
    options.sanitize()?;
    let env = BootEnv::native(options);
    run(&env, options.additional_disks)
}
