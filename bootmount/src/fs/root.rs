//! System root used for every filesystem side effect.

use bootmount_shared::errors::{BootError, BootResult};
use std::fs;
use std::os::unix::fs::{DirBuilderExt, symlink};
use std::path::{Path, PathBuf};

/// Maps absolute system paths (`/etc/hosts`) below a root directory.
///
/// In production the root is `/`; tests point it at a temporary directory.
#[derive(Debug, Clone)]
pub struct SystemRoot {
    root: PathBuf,
}

impl SystemRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve an absolute system path below this root.
    pub fn path(&self, system_path: impl AsRef<Path>) -> PathBuf {
        let system_path = system_path.as_ref();
        let relative = system_path.strip_prefix("/").unwrap_or(system_path);
        self.root.join(relative)
    }

    /// Whether anything (including a dangling symlink) exists at the path.
    pub fn exists_no_follow(&self, system_path: &str) -> BootResult<bool> {
        match fs::symlink_metadata(self.path(system_path)) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BootError::Storage(format!("lstat {}: {}", system_path, e))),
        }
    }

    /// Create `link` pointing at `original`. The link contents stay absolute.
    pub fn symlink(&self, original: &str, link: &str) -> BootResult<()> {
        symlink(original, self.path(link)).map_err(|e| {
            BootError::Storage(format!("symlink {} -> {}: {}", link, original, e))
        })
    }

    pub fn create_dir(&self, system_path: &str, mode: u32) -> BootResult<()> {
        fs::DirBuilder::new()
            .mode(mode)
            .create(self.path(system_path))
            .map_err(|e| BootError::Storage(format!("mkdir {}: {}", system_path, e)))
    }

    pub fn create_dir_all(&self, system_path: &str, mode: u32) -> BootResult<()> {
        fs::DirBuilder::new()
            .recursive(true)
            .mode(mode)
            .create(self.path(system_path))
            .map_err(|e| BootError::Storage(format!("mkdir {}: {}", system_path, e)))
    }

    pub fn write_file(&self, system_path: &str, contents: &[u8]) -> BootResult<()> {
        fs::write(self.path(system_path), contents)
            .map_err(|e| BootError::Storage(format!("write {}: {}", system_path, e)))
    }
}

impl Default for SystemRoot {
    fn default() -> Self {
        Self::new("/")
    }
}
