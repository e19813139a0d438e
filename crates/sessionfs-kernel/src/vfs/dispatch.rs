//! Driver-facing call table.
//!
//! A native filesystem driver speaks in paths, raw buffers and signed
//! result codes: `0` (or a byte count) on success, `-errno` on failure.
//! [`DriverDispatch`] adapts any [`SessionFsOps`] to that contract so the
//! driver glue stays a thin forwarding layer.

use std::sync::Arc;

use super::error::VfsError;
use super::ops::SessionFsOps;
use super::types::{FileAttr, FileType};

/// Forwards raw driver calls to a [`SessionFsOps`] implementation.
#[derive(Debug)]
pub struct DriverDispatch<O: SessionFsOps + ?Sized> {
    ops: Arc<O>,
}

impl<O: SessionFsOps + ?Sized> Clone for DriverDispatch<O> {
    fn clone(&self) -> Self {
        Self {
            ops: Arc::clone(&self.ops),
        }
    }
}

fn code(op: &'static str, path: &str, err: VfsError) -> i32 {
    let errno = err.errno();
    tracing::debug!(op, path, errno, error = %err, "driver call failed");
    -errno
}

fn byte_count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

impl<O: SessionFsOps + ?Sized> DriverDispatch<O> {
    /// Wrap an operations implementation.
    pub fn new(ops: Arc<O>) -> Self {
        Self { ops }
    }

    /// The wrapped operations.
    pub fn ops(&self) -> &Arc<O> {
        &self.ops
    }

    /// Fill `stbuf` with the attributes of `path`.
    pub fn getattr(&self, path: &str, stbuf: &mut FileAttr) -> i32 {
        match self.ops.getattr(path) {
            Ok(attr) => {
                *stbuf = attr;
                0
            }
            Err(e) => code("getattr", path, e),
        }
    }

    /// Create a session directory.
    pub fn mkdir(&self, path: &str, mode: u32) -> i32 {
        match self.ops.mkdir(path, mode) {
            Ok(_) => 0,
            Err(e) => code("mkdir", path, e),
        }
    }

    /// Open `path`.
    pub fn open(&self, path: &str) -> i32 {
        match self.ops.open(path) {
            Ok(()) => 0,
            Err(e) => code("open", path, e),
        }
    }

    /// Read into `buf` from `offset`; returns bytes copied.
    pub fn read(&self, path: &str, buf: &mut [u8], offset: i64) -> i32 {
        let Ok(offset) = u64::try_from(offset) else {
            return -libc::EINVAL;
        };
        let size = u32::try_from(buf.len().min(i32::MAX as usize)).unwrap_or(u32::MAX);
        match self.ops.read(path, offset, size) {
            Ok(data) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                byte_count(n)
            }
            Err(e) => code("read", path, e),
        }
    }

    /// Write `buf` at `offset`; returns bytes accepted.
    pub fn write(&self, path: &str, buf: &[u8], offset: i64) -> i32 {
        let Ok(offset) = u64::try_from(offset) else {
            return -libc::EINVAL;
        };
        if buf.len() > i32::MAX as usize {
            return -libc::EINVAL;
        }
        match self.ops.write(path, offset, buf) {
            Ok(n) => byte_count(n as usize),
            Err(e) => code("write", path, e),
        }
    }

    /// Close a handle on `path`. Closing `input` runs the backend.
    pub fn release(&self, path: &str) -> i32 {
        match self.ops.release(path) {
            Ok(()) => 0,
            Err(e) => code("release", path, e),
        }
    }

    /// List `path`, feeding `.`, `..` and then each entry to `filler`.
    ///
    /// `filler` returns `true` when the driver's buffer is full, which stops
    /// the listing early without an error.
    pub fn readdir<F>(&self, path: &str, mut filler: F) -> i32
    where
        F: FnMut(&str, FileType) -> bool,
    {
        let entries = match self.ops.readdir(path) {
            Ok(entries) => entries,
            Err(e) => return code("readdir", path, e),
        };
        if filler(".", FileType::Directory) || filler("..", FileType::Directory) {
            return 0;
        }
        for entry in &entries {
            if filler(&entry.name, entry.kind) {
                break;
            }
        }
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::EchoBackend;
    use crate::session::SessionRegistry;
    use crate::vfs::SessionRouter;

    fn dispatch() -> DriverDispatch<SessionRouter> {
        dispatch_capped(crate::session::DEFAULT_MAX_INPUT)
    }

    fn dispatch_capped(max_input: usize) -> DriverDispatch<SessionRouter> {
        let registry =
            SessionRegistry::new(Arc::new(EchoBackend::default())).with_max_input(max_input);
        DriverDispatch::new(Arc::new(SessionRouter::new(Arc::new(registry))))
    }

    #[test]
    fn test_full_request_cycle() {
        let fs = dispatch();
        assert_eq!(fs.mkdir("/chat", 0o755), 0);
        assert_eq!(fs.open("/chat/input"), 0);
        assert_eq!(fs.write("/chat/input", b"hello", 0), 5);
        assert_eq!(fs.release("/chat/input"), 0);

        let mut attr = FileAttr::file(0, 0);
        assert_eq!(fs.getattr("/chat/output", &mut attr), 0);
        assert_eq!(attr.size, 15);

        let mut buf = [0u8; 64];
        let n = fs.read("/chat/output", &mut buf, 0);
        assert_eq!(&buf[..n as usize], b"You said: hello");
        assert_eq!(fs.read("/chat/output", &mut buf, 15), 0);
    }

    #[test]
    fn test_negative_errno_codes() {
        let fs = dispatch();
        let mut attr = FileAttr::directory(0);
        assert_eq!(fs.getattr("/ghost/input", &mut attr), -libc::ENOENT);
        assert_eq!(fs.open("/ghost"), -libc::ENOENT);

        fs.mkdir("/chat", 0o755);
        assert_eq!(fs.write("/chat/output", b"x", 0), -libc::EACCES);
        assert_eq!(fs.mkdir("/chat/nested", 0o755), -libc::EACCES);

        let mut buf = [0u8; 4];
        assert_eq!(fs.read("/chat", &mut buf, 0), -libc::EISDIR);
        assert_eq!(fs.read("/chat/input", &mut buf, -1), -libc::EINVAL);
    }

    #[test]
    fn test_write_rejects_negative_offset() {
        let fs = dispatch();
        fs.mkdir("/s", 0o755);
        assert_eq!(fs.write("/s/input", b"abc", -1), -libc::EINVAL);
        assert_eq!(fs.write("/s/input", b"abc", i64::MIN), -libc::EINVAL);

        let mut attr = FileAttr::directory(0);
        assert_eq!(fs.getattr("/s/input", &mut attr), 0);
        assert_eq!(attr.size, 0);
    }

    #[test]
    fn test_write_over_cap_is_efbig() {
        let fs = dispatch_capped(4);
        fs.mkdir("/s", 0o755);
        assert_eq!(fs.write("/s/input", b"abcd", 0), 4);
        assert_eq!(fs.write("/s/input", b"e", 4), -libc::EFBIG);
        assert_eq!(fs.write("/s/input", b"x", 1 << 26), -libc::EFBIG);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_unallocatable_write_is_enomem() {
        let fs = dispatch_capped(usize::MAX);
        fs.mkdir("/s", 0o755);
        assert_eq!(fs.write("/s/input", b"x", i64::MAX), -libc::ENOMEM);
    }

    #[test]
    fn test_small_read_buffer() {
        let fs = dispatch();
        fs.mkdir("/s", 0o755);
        fs.write("/s/input", b"abcdef", 0);
        let mut buf = [0u8; 4];
        assert_eq!(fs.read("/s/input", &mut buf, 1), 4);
        assert_eq!(&buf, b"bcde");
    }

    #[test]
    fn test_readdir_adds_dot_entries() {
        let fs = dispatch();
        fs.mkdir("/beta", 0o755);
        fs.mkdir("/alpha", 0o755);

        let mut names = Vec::new();
        assert_eq!(
            fs.readdir("/", |name, _| {
                names.push(name.to_string());
                false
            }),
            0
        );
        assert_eq!(names, [".", "..", "alpha", "beta"]);

        let mut names = Vec::new();
        fs.readdir("/alpha", |name, kind| {
            names.push((name.to_string(), kind));
            false
        });
        assert_eq!(names[2], ("input".to_string(), FileType::File));
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn test_readdir_stops_when_full() {
        let fs = dispatch();
        for name in ["/a", "/b", "/c"] {
            fs.mkdir(name, 0o755);
        }
        let mut seen = 0;
        fs.readdir("/", |_, _| {
            seen += 1;
            seen == 3
        });
        assert_eq!(seen, 3);
    }

    #[test]
    fn test_readdir_missing() {
        let fs = dispatch();
        assert_eq!(fs.readdir("/ghost", |_, _| false), -libc::ENOENT);
    }
}
