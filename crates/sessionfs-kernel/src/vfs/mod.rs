//! Session virtual filesystem.
//!
//! Key components:
//!
//! - [`SessionFsOps`] - One method per filesystem call the driver forwards
//! - [`SessionRouter`] - The implementation: path resolution + attribute
//!   synthesis on top of a [`SessionRegistry`](crate::session::SessionRegistry)
//! - [`DriverDispatch`] - Signed result-code adapter for native drivers
//!
//! ## Design Decisions
//!
//! - **Path-based, no inodes**: every call re-resolves its path.
//! - **Explicit offset/size**: read/write carry their offset, so open
//!   handles hold no cursor.
//! - **Trigger on release**: closing `input` is the only call that reaches
//!   the backend.

mod dispatch;
mod error;
mod ops;
mod path;
mod router;
mod types;

pub use dispatch::DriverDispatch;
pub use error::{VfsError, VfsResult};
pub use ops::SessionFsOps;
pub use path::{MAX_NAME_LEN, VirtualPath, session_file, validate_session_name};
pub use router::SessionRouter;
pub use types::{DirEntry, FileAttr, FileType};
