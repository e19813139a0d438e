//! VFS error types.

use thiserror::Error;

/// Error returned by session filesystem operations.
///
/// Backend failures are deliberately absent: they never fail a filesystem
/// call and are folded into a session's `error` file instead.
#[derive(Debug, Error)]
pub enum VfsError {
    /// Unknown session or virtual file.
    #[error("not found: {0}")]
    NotFound(String),

    /// Session directory already exists where a new one cannot be created.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Write to a read-only virtual file, or create at an invalid depth.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Expected a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Read or write addressed a directory.
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// Invalid path or session name.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Session name too long.
    #[error("file name too long")]
    NameTooLong,

    /// A buffer could not grow to hold the requested bytes.
    #[error("out of memory growing {0}")]
    OutOfMemory(String),

    /// A write would grow `input` past the configured limit.
    #[error("file too large: {0}")]
    FileTooLarge(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl VfsError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an AlreadyExists error.
    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists(path.into())
    }

    /// Create a PermissionDenied error.
    pub fn permission_denied(path: impl Into<String>) -> Self {
        Self::PermissionDenied(path.into())
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// Create an IsADirectory error.
    pub fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory(path.into())
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Create an OutOfMemory error.
    pub fn out_of_memory(what: impl Into<String>) -> Self {
        Self::OutOfMemory(what.into())
    }

    /// Create a FileTooLarge error.
    pub fn file_too_large(path: impl Into<String>) -> Self {
        Self::FileTooLarge(path.into())
    }

    /// Create an Other error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Positive POSIX errno for this error.
    ///
    /// Driver layers negate this before handing it back to the kernel.
    pub fn errno(&self) -> i32 {
        match self {
            VfsError::NotFound(_) => libc::ENOENT,
            VfsError::AlreadyExists(_) => libc::EEXIST,
            VfsError::PermissionDenied(_) => libc::EACCES,
            VfsError::NotADirectory(_) => libc::ENOTDIR,
            VfsError::IsADirectory(_) => libc::EISDIR,
            VfsError::InvalidPath(_) => libc::EINVAL,
            VfsError::NameTooLong => libc::ENAMETOOLONG,
            VfsError::OutOfMemory(_) => libc::ENOMEM,
            VfsError::FileTooLarge(_) => libc::EFBIG,
            VfsError::Other(_) => libc::EIO,
        }
    }
}

/// VFS result type.
pub type VfsResult<T> = Result<T, VfsError>;
