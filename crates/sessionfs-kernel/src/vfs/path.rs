//! Path → virtual file address resolution.
//!
//! Every operation re-resolves its path; nothing here is cached.

use std::str::FromStr;

use super::error::{VfsError, VfsResult};
use crate::session::SessionFile;

/// Longest accepted session name, in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// Shape of a path inside the mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VirtualPath<'a> {
    /// `/`
    Root,
    /// `/<name>`
    Session(&'a str),
    /// `/<name>/<file>`; `file` is everything after the first separator
    /// and may not name a real session file.
    File {
        /// Session name.
        session: &'a str,
        /// Raw file component.
        file: &'a str,
    },
}

impl<'a> VirtualPath<'a> {
    /// Split `path` into its address.
    ///
    /// The leading `/` is stripped; the text before the next `/` is the
    /// session name and the rest, if any, is the file name. Relative paths
    /// resolve to nothing.
    pub fn parse(path: &'a str) -> VfsResult<Self> {
        let rest = path
            .strip_prefix('/')
            .ok_or_else(|| VfsError::not_found(path))?;
        if rest.is_empty() {
            return Ok(VirtualPath::Root);
        }
        Ok(match rest.split_once('/') {
            None => VirtualPath::Session(rest),
            Some((session, file)) => VirtualPath::File { session, file },
        })
    }
}

/// Resolve the raw file component of a [`VirtualPath::File`].
pub fn session_file(path: &str, file: &str) -> VfsResult<SessionFile> {
    SessionFile::from_str(file).map_err(|_| VfsError::not_found(path))
}

/// Check that `name` can be used as a new session directory.
pub fn validate_session_name(name: &str) -> VfsResult<()> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(VfsError::invalid_path(name));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(VfsError::NameTooLong);
    }
    Ok(())
}
