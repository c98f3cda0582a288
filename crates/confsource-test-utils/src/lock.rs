//! Keeping a file from being deleted for the duration of a test.

use std::fs;
use std::path::{Path, PathBuf};

/// True when the current process runs as root, which bypasses Unix
/// permission checks.
pub fn is_root() -> bool {
    #[cfg(unix)]
    {
        match std::process::Command::new("id").arg("-u").output() {
            Ok(output) => String::from_utf8_lossy(&output.stdout).trim() == "0",
            Err(_) => false,
        }
    }
    #[cfg(not(unix))]
    {
        false
    }
}

/// Blocks deletion of a file while leaving it readable.
///
/// - Unix: the parent directory is made read-only; restored on drop.
/// - Windows: the file is held open without delete sharing; closed on drop.
pub struct DeleteBlocker {
    #[cfg(unix)]
    dir: PathBuf,
    #[cfg(windows)]
    _handle: fs::File,
    #[cfg(not(any(unix, windows)))]
    _path: PathBuf,
}

impl DeleteBlocker {
    /// Block deletion of `path`.
    ///
    /// Returns `None` where the environment cannot block it (root on Unix).
    pub fn new(path: &Path) -> Option<Self> {
        Self::block(path)
    }

    #[cfg(unix)]
    fn block(path: &Path) -> Option<Self> {
        use std::os::unix::fs::PermissionsExt;

        if is_root() {
            return None;
        }
        let dir = path.parent()?.to_path_buf();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).ok()?;
        Some(Self { dir })
    }

    #[cfg(windows)]
    fn block(path: &Path) -> Option<Self> {
        use std::os::windows::fs::OpenOptionsExt;

        const FILE_SHARE_READ: u32 = 0x1;
        const FILE_SHARE_WRITE: u32 = 0x2;

        let handle = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE)
            .open(path)
            .ok()?;
        Some(Self { _handle: handle })
    }

    #[cfg(not(any(unix, windows)))]
    fn block(_path: &Path) -> Option<Self> {
        None
    }
}

#[cfg(unix)]
impl Drop for DeleteBlocker {
    fn drop(&mut self) {
        use std::os::unix::fs::PermissionsExt;

        let _ = fs::set_permissions(&self.dir, fs::Permissions::from_mode(0o755));
    }
}
