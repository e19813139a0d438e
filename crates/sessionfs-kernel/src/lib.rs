//! sessionfs kernel.
//!
//! Exposes named sessions as directories holding three virtual files:
//! write a request to `input`, close it, and read the backend's reply from
//! `output` (or the failure from `error`).
//!
//! ```
//! use std::sync::Arc;
//! use sessionfs_kernel::{EchoBackend, SessionFsOps, SessionRegistry, SessionRouter};
//!
//! let registry = Arc::new(SessionRegistry::new(Arc::new(EchoBackend::default())));
//! let fs = SessionRouter::new(registry);
//! fs.mkdir("/chat", 0o755).unwrap();
//! fs.write_all("/chat/input", b"hello").unwrap();
//! assert_eq!(fs.read_all("/chat/output").unwrap(), b"You said: hello");
//! ```

pub mod backend;
pub mod config;
pub mod session;
pub mod vfs;

pub use backend::{Backend, BackendError, CommandBackend, EchoBackend, RejectBackend};
pub use config::{BackendConfig, ConfigError, Permissions, SessionFsConfig};
pub use session::{DEFAULT_MAX_INPUT, FinalizeOutcome, SessionFile, SessionRegistry, SessionView};
pub use vfs::{
    DirEntry, DriverDispatch, FileAttr, FileType, SessionFsOps, SessionRouter, VfsError,
    VfsResult,
};
