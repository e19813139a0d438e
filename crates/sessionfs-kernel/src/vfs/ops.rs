//! Session filesystem operations trait.
//!
//! One method per call the driver layer forwards. Everything is
//! path-based with explicit offsets, so no per-handle state is kept.

use super::VfsResult;
use super::types::{DirEntry, FileAttr};

/// Filesystem calls a driver dispatches into the core.
///
/// Paths are absolute within the mount (`/`, `/<session>`,
/// `/<session>/<file>`). Calls are synchronous end to end; `release` on an
/// `input` file may block while the backend runs.
pub trait SessionFsOps: Send + Sync {
    // ========================================================================
    // Reading
    // ========================================================================

    /// Get file attributes.
    fn getattr(&self, path: &str) -> VfsResult<FileAttr>;

    /// Read directory entries (without `.` and `..`).
    fn readdir(&self, path: &str) -> VfsResult<Vec<DirEntry>>;

    /// Read up to `size` bytes starting at `offset`.
    ///
    /// Returns fewer bytes at end of file and none past it.
    fn read(&self, path: &str, offset: u64, size: u32) -> VfsResult<Vec<u8>>;

    // ========================================================================
    // Writing
    // ========================================================================

    /// Write `data` at `offset`. Returns the number of bytes written.
    fn write(&self, path: &str, offset: u64, data: &[u8]) -> VfsResult<u32>;

    /// Create a directory.
    fn mkdir(&self, path: &str, mode: u32) -> VfsResult<FileAttr>;

    // ========================================================================
    // Handle lifecycle
    // ========================================================================

    /// Validate that `path` can be opened.
    fn open(&self, path: &str) -> VfsResult<()>;

    /// Close a handle previously opened on `path`.
    fn release(&self, path: &str) -> VfsResult<()>;

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Read entire file contents.
    fn read_all(&self, path: &str) -> VfsResult<Vec<u8>> {
        let attr = self.getattr(path)?;
        let size = u32::try_from(attr.size).unwrap_or(u32::MAX);
        self.read(path, 0, size)
    }

    /// Open, write the whole of `data` from offset 0, and release.
    fn write_all(&self, path: &str, data: &[u8]) -> VfsResult<()> {
        self.open(path)?;
        let written = self.write(path, 0, data);
        let released = self.release(path);
        written?;
        released
    }
}
