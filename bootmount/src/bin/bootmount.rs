//! Boot bring-up binary.
//!
//! Runs once, early in boot, before any workload. Mounts the system
//! filesystems and permanent storage, then the additional disks declared on
//! permanent storage. Exits non-zero on a fatal error; deciding what to do
//! about it (halt, reboot, emergency shell) is up to the caller.

use std::path::PathBuf;
use std::process::ExitCode;

use bootmount::constants::envs;
use bootmount::util::{self, DEFAULT_LOG_LEVEL};
use bootmount::{BootOptions, BootResult, bring_up};
use clap::Parser;

/// Early-boot filesystem bring-up
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Mounts system filesystems, permanent storage and additional disks"
)]
struct BootArgs {
    /// Boot options as JSON string
    ///
    /// Keys: root, perm_mountpoint, sys_block_dir, dev_dir, cmdline_path,
    /// additional_disks. Missing keys take their defaults; the flags below
    /// override the document.
    #[arg(long)]
    config: Option<String>,

    /// Root directory all system paths are resolved under
    #[arg(long, env = envs::ROOT)]
    root: Option<PathBuf>,

    /// Permanent storage mountpoint
    #[arg(long, env = envs::PERM)]
    perm: Option<PathBuf>,

    /// Do not mount the disks declared in mount-disks.json
    #[arg(long, env = envs::SKIP_ADDITIONAL_DISKS)]
    skip_additional_disks: bool,
}

impl BootArgs {
    fn options(&self) -> BootResult<BootOptions> {
        let mut options = match &self.config {
            Some(json) => BootOptions::from_json(json)?,
            None => BootOptions::default(),
        };

        if let Some(root) = &self.root {
            options.root = root.clone();
        }
        if let Some(perm) = &self.perm {
            options.perm_mountpoint = perm.clone();
        }
        if self.skip_additional_disks {
            options.additional_disks = false;
        }
        Ok(options)
    }
}

fn main() -> ExitCode {
    let args = BootArgs::parse();

    // No log directory exists this early; the console is all there is
    util::register_to_tracing(std::io::stderr, util::env_filter(DEFAULT_LOG_LEVEL));

    let result = args.options().and_then(|options| {
        tracing::debug!(?options, "Boot options");
        bring_up(&options)
    });

    match result {
        Ok(report) => {
            tracing::info!(
                warnings = report.system.warnings().count(),
                additional_disks = report.additional_disks,
                "Filesystem bring-up complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Filesystem bring-up failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = BootArgs::parse_from([
            "bootmount",
            "--config",
            r#"{"root": "/mnt/a", "perm_mountpoint": "/data"}"#,
            "--root",
            "/mnt/b",
            "--skip-additional-disks",
        ]);

        let options = args.options().unwrap();
        assert_eq!(options.root, PathBuf::from("/mnt/b"));
        assert_eq!(options.perm_mountpoint, PathBuf::from("/data"));
        assert!(!options.additional_disks);
    }

    #[test]
    fn test_bad_config_rejected() {
        let args = BootArgs::parse_from(["bootmount", "--config", "nope"]);
        assert!(args.options().is_err());
    }
}
