//! Kernel mount interface and filesystem side effects.
//!
//! Everything that touches the mount table goes through the [`Mounter`] trait so
//! the boot sequence can be driven against a recording fake in tests:
//! - [`NativeMounter`]: mount(2) via `nix`
//! - [`SystemRoot`]: maps absolute system paths under a configurable root

use bootmount_shared::errors::{BootError, BootResult};
use nix::errno::Errno;
use nix::mount::MsFlags;
use std::path::Path;

pub use native::NativeMounter;
pub use root::SystemRoot;

mod native;
mod root;

/// One (source, target, fstype, flags, data) tuple for mount(2).
#[derive(Debug, Clone, Copy)]
pub struct MountRequest<'a> {
    pub source: &'a str,
    pub target: &'a Path,
    pub fstype: &'a str,
    pub flags: MsFlags,
    pub data: Option<&'a str>,
}

impl<'a> MountRequest<'a> {
    pub fn new(source: &'a str, target: &'a Path, fstype: &'a str) -> Self {
        Self {
            source,
            target,
            fstype,
            flags: MsFlags::empty(),
            data: None,
        }
    }

    pub fn flags(mut self, flags: MsFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the options string. An empty string means no options.
    pub fn data(mut self, data: &'a str) -> Self {
        self.data = if data.is_empty() { None } else { Some(data) };
        self
    }
}

/// The kernel mount interface.
///
/// Implementations return the raw errno so callers can tell "already mounted"
/// apart from real failures.
pub trait Mounter {
    fn mount(&self, request: &MountRequest<'_>) -> Result<(), Errno>;
}

/// Mount and convert the errno into a [`BootError`] naming the mount.
///
/// `EBUSY` becomes [`BootError::Busy`], everything else [`BootError::Mount`].
pub fn mount_fs(mounter: &dyn Mounter, request: &MountRequest<'_>) -> BootResult<()> {
    mounter.mount(request).map_err(|errno| {
        let message = format!(
            "{} ({}) on {}: {}",
            request.fstype,
            request.source,
            request.target.display(),
            errno
        );
        if errno == Errno::EBUSY {
            BootError::Busy(message)
        } else {
            BootError::Mount(message)
        }
    })?;

    tracing::info!(
        fstype = request.fstype,
        source = request.source,
        target = %request.target.display(),
        "Mounted filesystem"
    );
    Ok(())
}
