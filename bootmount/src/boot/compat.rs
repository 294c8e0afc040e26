//! Compatibility path for legacy root filesystems.
//!
//! Root images built by older tooling are FAT: no symlinks and 8.3 file names
//! only. The boot-time links normally shipped in `/etc` are recreated on a
//! tmpfs mounted over it.

use bootmount_shared::errors::BootResult;
use nix::mount::MsFlags;

use super::BootEnv;
use crate::constants::{files, fstype, links, paths};
use crate::fs::{MountRequest, mount_fs};

pub(super) fn mount_compat(env: &BootEnv) -> BootResult<()> {
    let etc = env.root.path(paths::ETC);
    mount_fs(
        env.mounter.as_ref(),
        &MountRequest::new(fstype::TMPFS, &etc, fstype::TMPFS)
            .flags(MsFlags::MS_NOSUID | MsFlags::MS_NODEV | MsFlags::MS_RELATIME)
            .data(files::LEGACY_ETC_OPTIONS),
    )?;

    env.root.symlink(links::PNP_RESOLV, paths::RESOLV_CONF)?;
    env.root.symlink(links::LEGACY_LOCALTIME, paths::LOCALTIME)?;
    env.root.create_dir(paths::ETC_SSL, files::DIR_MODE)?;
    env.root.symlink(links::LEGACY_CACERTS, paths::CA_BUNDLE)?;
    env.root
        .write_file(paths::HOSTS, files::LEGACY_HOSTS.as_bytes())?;

    tracing::info!("Legacy /etc prepared on tmpfs");
    Ok(())
}
