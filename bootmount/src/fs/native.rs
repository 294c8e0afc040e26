//! Native mount using mount(2) syscall.
//!
//! Requires CAP_SYS_ADMIN capability.

use nix::errno::Errno;
use nix::mount::mount;
use tracing::debug;

use super::{MountRequest, Mounter};

#[derive(Debug, Default, Clone, Copy)]
pub struct NativeMounter;

impl Mounter for NativeMounter {
    fn mount(&self, request: &MountRequest<'_>) -> Result<(), Errno> {
        debug!(
            source = request.source,
            target = %request.target.display(),
            fstype = request.fstype,
            flags = ?request.flags,
            "mount(2)"
        );
        mount(
            Some(request.source),
            request.target,
            Some(request.fstype),
            request.flags,
            request.data,
        )
    }
}
