//! Core VFS types.
//!
//! These are the filesystem-visible shapes the router synthesizes; the
//! session registry never sees them.

use serde::{Deserialize, Serialize};

/// File type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl FileType {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }

    /// `S_IFMT` bits for this type.
    pub fn mode_bits(&self) -> u32 {
        match self {
            FileType::File => libc::S_IFREG as u32,
            FileType::Directory => libc::S_IFDIR as u32,
        }
    }
}

/// File attributes (metadata).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttr {
    /// Size in bytes.
    pub size: u64,
    /// File type.
    pub kind: FileType,
    /// Unix permissions (e.g., 0o644).
    pub perm: u32,
    /// Number of hard links.
    pub nlink: u32,
}

impl FileAttr {
    /// Attributes for a regular file of `size` bytes.
    pub fn file(size: u64, perm: u32) -> Self {
        Self {
            size,
            kind: FileType::File,
            perm,
            nlink: 1,
        }
    }

    /// Attributes for a directory.
    pub fn directory(perm: u32) -> Self {
        Self {
            size: 0,
            kind: FileType::Directory,
            perm,
            nlink: 2, // . and ..
        }
    }

    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Full `st_mode` value: type bits plus permissions.
    pub fn mode(&self) -> u32 {
        self.kind.mode_bits() | self.perm
    }
}

/// Directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (not full path).
    pub name: String,
    /// Entry type.
    pub kind: FileType,
}

impl DirEntry {
    /// Create a new directory entry.
    pub fn new(name: impl Into<String>, kind: FileType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create a file entry.
    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, FileType::File)
    }

    /// Create a directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self::new(name, FileType::Directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type() {
        assert!(FileType::File.is_file());
        assert!(!FileType::File.is_dir());
        assert!(FileType::Directory.is_dir());
    }

    #[test]
    fn test_file_attr_constructors() {
        let file = FileAttr::file(1024, 0o666);
        assert!(file.is_file());
        assert_eq!(file.size, 1024);
        assert_eq!(file.nlink, 1);
        assert_eq!(file.mode(), libc::S_IFREG as u32 | 0o666);

        let dir = FileAttr::directory(0o755);
        assert!(dir.is_dir());
        assert_eq!(dir.perm, 0o755);
        assert_eq!(dir.nlink, 2);
        assert_eq!(dir.mode(), libc::S_IFDIR as u32 | 0o755);
    }

    #[test]
    fn test_dir_entry() {
        let file = DirEntry::file("input");
        assert_eq!(file.name, "input");
        assert!(file.kind.is_file());

        let dir = DirEntry::directory("chat");
        assert!(dir.kind.is_dir());
    }
}
