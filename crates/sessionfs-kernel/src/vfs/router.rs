//! Filesystem operation router.
//!
//! Resolves each path to a virtual file address, forwards to the
//! [`SessionRegistry`], and synthesizes the attributes a filesystem client
//! expects. The registry never sees modes, link counts or directory entries.

use std::sync::Arc;

use super::error::{VfsError, VfsResult};
use super::ops::SessionFsOps;
use super::path::{VirtualPath, session_file, validate_session_name};
use super::types::{DirEntry, FileAttr};
use crate::backend::BackendError;
use crate::config::{Permissions, SessionFsConfig};
use crate::session::{SessionFile, SessionRegistry};

/// Routes filesystem calls onto a session registry.
#[derive(Debug, Clone)]
pub struct SessionRouter {
    registry: Arc<SessionRegistry>,
    perms: Permissions,
}

impl SessionRouter {
    /// Create a router with default permissions.
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self::with_permissions(registry, Permissions::default())
    }

    /// Create a router reporting the given permission bits.
    pub fn with_permissions(registry: Arc<SessionRegistry>, perms: Permissions) -> Self {
        Self { registry, perms }
    }

    /// Build a fresh registry and router from configuration.
    pub fn from_config(config: &SessionFsConfig) -> Result<Self, BackendError> {
        let backend = config.backend.build()?;
        let registry = Arc::new(SessionRegistry::new(backend).with_max_input(config.max_input));
        Ok(Self::with_permissions(registry, config.permissions))
    }

    /// The registry behind this router.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    fn file_perm(&self, file: SessionFile) -> u32 {
        if file.is_writable() {
            self.perms.input
        } else {
            self.perms.output
        }
    }

    fn session_dir(&self, path: &str, name: &str) -> VfsResult<FileAttr> {
        if self.registry.contains(name) {
            Ok(FileAttr::directory(self.perms.dir))
        } else {
            Err(VfsError::not_found(path))
        }
    }

    /// Resolve `/<session>/<file>` to a known session and a real file.
    fn resolve_file(&self, path: &str, session: &str, file: &str) -> VfsResult<SessionFile> {
        if !self.registry.contains(session) {
            return Err(VfsError::not_found(path));
        }
        session_file(path, file)
    }
}

impl SessionFsOps for SessionRouter {
    fn getattr(&self, path: &str) -> VfsResult<FileAttr> {
        match VirtualPath::parse(path)? {
            VirtualPath::Root => Ok(FileAttr::directory(self.perms.dir)),
            VirtualPath::Session(name) => self.session_dir(path, name),
            VirtualPath::File { session, file } => {
                let file = session_file(path, file)?;
                let size = self
                    .registry
                    .file_len(session, file)
                    .map_err(|_| VfsError::not_found(path))?;
                Ok(FileAttr::file(size, self.file_perm(file)))
            }
        }
    }

    fn readdir(&self, path: &str) -> VfsResult<Vec<DirEntry>> {
        match VirtualPath::parse(path)? {
            VirtualPath::Root => {
                let mut names = self.registry.list_sessions();
                names.sort();
                Ok(names.into_iter().map(DirEntry::directory).collect())
            }
            VirtualPath::Session(name) => {
                self.session_dir(path, name)?;
                Ok(SessionFile::ALL
                    .iter()
                    .map(|file| {
                        let file_name: &str = file.as_ref();
                        DirEntry::file(file_name)
                    })
                    .collect())
            }
            VirtualPath::File { session, file } => {
                self.resolve_file(path, session, file)?;
                Err(VfsError::not_a_directory(path))
            }
        }
    }

    fn read(&self, path: &str, offset: u64, size: u32) -> VfsResult<Vec<u8>> {
        match VirtualPath::parse(path)? {
            VirtualPath::Root => Err(VfsError::is_a_directory(path)),
            VirtualPath::Session(name) => {
                self.session_dir(path, name)?;
                Err(VfsError::is_a_directory(path))
            }
            VirtualPath::File { session, file } => {
                let file = self.resolve_file(path, session, file)?;
                self.registry
                    .read_slice(session, file, offset, size as usize)
                    .map_err(|e| match e {
                        VfsError::NotFound(_) => VfsError::not_found(path),
                        other => other,
                    })
            }
        }
    }

    fn write(&self, path: &str, offset: u64, data: &[u8]) -> VfsResult<u32> {
        match VirtualPath::parse(path)? {
            VirtualPath::Root => Err(VfsError::is_a_directory(path)),
            VirtualPath::Session(name) => {
                self.session_dir(path, name)?;
                Err(VfsError::is_a_directory(path))
            }
            VirtualPath::File { session, file } => {
                let file = self.resolve_file(path, session, file)?;
                if !file.is_writable() {
                    return Err(VfsError::permission_denied(path));
                }
                let len = u32::try_from(data.len())
                    .map_err(|_| VfsError::other(format!("write of {} bytes too large", data.len())))?;
                tracing::debug!(path, offset, len, "write input");
                self.registry
                    .write_input(session, offset, data)
                    .map_err(|e| match e {
                        VfsError::NotFound(_) => VfsError::not_found(path),
                        other => other,
                    })?;
                Ok(len)
            }
        }
    }

    fn mkdir(&self, path: &str, mode: u32) -> VfsResult<FileAttr> {
        match VirtualPath::parse(path)? {
            VirtualPath::Root => Err(VfsError::already_exists(path)),
            VirtualPath::Session(name) => {
                validate_session_name(name)?;
                tracing::debug!(path, mode = format_args!("{mode:o}"), "mkdir session");
                self.registry.create_session(name);
                Ok(FileAttr::directory(self.perms.dir))
            }
            VirtualPath::File { .. } => Err(VfsError::permission_denied(path)),
        }
    }

    fn open(&self, path: &str) -> VfsResult<()> {
        self.getattr(path).map(|_| ())
    }

    fn release(&self, path: &str) -> VfsResult<()> {
        let Ok(VirtualPath::File { session, file }) = VirtualPath::parse(path) else {
            return Ok(());
        };
        if !matches!(session_file(path, file), Ok(SessionFile::Input)) {
            return Ok(());
        }
        match self.registry.finalize(session) {
            Ok(outcome) => {
                tracing::debug!(path, ?outcome, "input released");
                Ok(())
            }
            Err(VfsError::NotFound(_)) => {
                tracing::debug!(path, "release on unknown session ignored");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{EchoBackend, RejectBackend};
    use crate::vfs::FileType;

    fn router() -> SessionRouter {
        SessionRouter::new(Arc::new(SessionRegistry::new(Arc::new(EchoBackend::default()))))
    }

    #[test]
    fn test_getattr_root() {
        let fs = router();
        let attr = fs.getattr("/").unwrap();
        assert!(attr.is_dir());
        assert_eq!(attr.perm, 0o755);
        assert_eq!(attr.nlink, 2);
    }

    #[test]
    fn test_getattr_session_dir() {
        let fs = router();
        assert!(matches!(fs.getattr("/chat"), Err(VfsError::NotFound(_))));
        fs.mkdir("/chat", 0o755).unwrap();
        assert!(fs.getattr("/chat").unwrap().is_dir());
    }

    #[test]
    fn test_getattr_session_files() {
        let fs = router();
        fs.mkdir("/chat", 0o755).unwrap();
        fs.write("/chat/input", 0, b"hello").unwrap();

        let input = fs.getattr("/chat/input").unwrap();
        assert!(input.is_file());
        assert_eq!(input.size, 5);
        assert_eq!(input.perm, 0o666);
        assert_eq!(input.nlink, 1);

        let output = fs.getattr("/chat/output").unwrap();
        assert_eq!(output.size, 0);
        assert_eq!(output.perm, 0o444);

        assert!(matches!(fs.getattr("/chat/notes"), Err(VfsError::NotFound(_))));
        assert!(matches!(fs.getattr("/chat/input/x"), Err(VfsError::NotFound(_))));
    }

    #[test]
    fn test_getattr_unknown_session_file_is_not_found() {
        let fs = router();
        assert!(matches!(fs.getattr("/ghost/input"), Err(VfsError::NotFound(_))));
        assert!(matches!(fs.getattr("/ghost/bogus"), Err(VfsError::NotFound(_))));
    }

    #[test]
    fn test_mkdir_rules() {
        let fs = router();
        assert!(matches!(fs.mkdir("/", 0o755), Err(VfsError::AlreadyExists(_))));
        assert!(matches!(fs.mkdir("/a/b", 0o755), Err(VfsError::PermissionDenied(_))));
        assert!(matches!(fs.mkdir("/..", 0o755), Err(VfsError::InvalidPath(_))));
        assert!(matches!(fs.mkdir("relative", 0o755), Err(VfsError::NotFound(_))));
        assert!(fs.mkdir("/fine", 0o700).unwrap().is_dir());
    }

    #[test]
    fn test_open_matches_getattr() {
        let fs = router();
        fs.mkdir("/chat", 0o755).unwrap();
        for path in ["/", "/chat", "/chat/input", "/chat/output", "/chat/error"] {
            assert!(fs.open(path).is_ok(), "{path}");
        }
        for path in ["/ghost", "/ghost/input", "/chat/other"] {
            assert!(matches!(fs.open(path), Err(VfsError::NotFound(_))), "{path}");
        }
    }

    #[test]
    fn test_read_directory_is_error() {
        let fs = router();
        fs.mkdir("/chat", 0o755).unwrap();
        assert!(matches!(fs.read("/", 0, 10), Err(VfsError::IsADirectory(_))));
        assert!(matches!(fs.read("/chat", 0, 10), Err(VfsError::IsADirectory(_))));
        assert!(matches!(fs.write("/chat", 0, b"x"), Err(VfsError::IsADirectory(_))));
    }

    #[test]
    fn test_read_past_end_is_empty() {
        let fs = router();
        fs.mkdir("/chat", 0o755).unwrap();
        fs.write("/chat/input", 0, b"abc").unwrap();
        assert!(fs.read("/chat/input", 3, 10).unwrap().is_empty());
        assert!(fs.read("/chat/input", 100, 10).unwrap().is_empty());
        assert!(fs.read("/chat/output", 0, 10).unwrap().is_empty());
    }

    #[test]
    fn test_write_only_input() {
        let fs = router();
        fs.mkdir("/chat", 0o755).unwrap();
        assert_eq!(fs.write("/chat/input", 0, b"hi").unwrap(), 2);
        assert!(matches!(
            fs.write("/chat/output", 0, b"x"),
            Err(VfsError::PermissionDenied(_))
        ));
        assert!(matches!(
            fs.write("/chat/error", 0, b"x"),
            Err(VfsError::PermissionDenied(_))
        ));
        assert!(matches!(fs.write("/chat/other", 0, b"x"), Err(VfsError::NotFound(_))));
        assert!(matches!(fs.write("/ghost/input", 0, b"x"), Err(VfsError::NotFound(_))));
    }

    #[test]
    fn test_release_input_triggers_backend() {
        let fs = router();
        fs.mkdir("/chat", 0o755).unwrap();
        fs.write("/chat/input", 0, b"hello").unwrap();

        fs.release("/chat/output").unwrap();
        assert!(fs.read_all("/chat/output").unwrap().is_empty());

        fs.release("/chat/input").unwrap();
        assert_eq!(fs.read_all("/chat/output").unwrap(), b"You said: hello");
        assert!(fs.read_all("/chat/error").unwrap().is_empty());
    }

    #[test]
    fn test_release_failure_lands_in_error_file() {
        let registry = Arc::new(SessionRegistry::new(Arc::new(RejectBackend::new("quota exceeded"))));
        let fs = SessionRouter::new(registry);
        fs.mkdir("/chat", 0o755).unwrap();
        fs.write_all("/chat/input", b"hello").unwrap();

        assert!(fs.read_all("/chat/output").unwrap().is_empty());
        assert_eq!(fs.read_all("/chat/error").unwrap(), b"Error: quota exceeded");
    }

    #[test]
    fn test_release_unknown_or_odd_paths_ok() {
        let fs = router();
        assert!(fs.release("/ghost/input").is_ok());
        assert!(fs.release("/").is_ok());
        assert!(fs.release("/ghost").is_ok());
        assert!(fs.release("nope").is_ok());
    }

    #[test]
    fn test_readdir() {
        let fs = router();
        assert!(fs.readdir("/").unwrap().is_empty());
        fs.mkdir("/b", 0o755).unwrap();
        fs.mkdir("/a", 0o755).unwrap();
        fs.mkdir("/b", 0o755).unwrap();

        let root = fs.readdir("/").unwrap();
        assert_eq!(root, vec![DirEntry::directory("a"), DirEntry::directory("b")]);

        let session = fs.readdir("/a").unwrap();
        let names: Vec<_> = session.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["input", "output", "error"]);
        assert!(session.iter().all(|e| e.kind == FileType::File));

        assert!(matches!(fs.readdir("/ghost"), Err(VfsError::NotFound(_))));
        assert!(matches!(fs.readdir("/a/input"), Err(VfsError::NotADirectory(_))));
    }

    #[test]
    fn test_custom_permissions() {
        let registry = Arc::new(SessionRegistry::new(Arc::new(EchoBackend::default())));
        let perms = Permissions {
            dir: 0o700,
            input: 0o600,
            output: 0o400,
        };
        let fs = SessionRouter::with_permissions(registry, perms);
        fs.mkdir("/s", 0o755).unwrap();
        assert_eq!(fs.getattr("/").unwrap().perm, 0o700);
        assert_eq!(fs.getattr("/s/input").unwrap().perm, 0o600);
        assert_eq!(fs.getattr("/s/error").unwrap().perm, 0o400);
    }

    #[test]
    fn test_from_config() {
        let config = SessionFsConfig::from_ron_str(r#"(backend: Echo(prefix: "> "))"#).unwrap();
        let fs = SessionRouter::from_config(&config).unwrap();
        fs.mkdir("/s", 0o755).unwrap();
        fs.write_all("/s/input", b"ping").unwrap();
        assert_eq!(fs.read_all("/s/output").unwrap(), b"> ping");
        assert_eq!(fs.registry().len(), 1);
    }

    #[test]
    fn test_from_config_applies_input_cap() {
        let config = SessionFsConfig {
            max_input: 4,
            ..SessionFsConfig::default()
        };
        let fs = SessionRouter::from_config(&config).unwrap();
        fs.mkdir("/s", 0o755).unwrap();
        assert_eq!(fs.write("/s/input", 0, b"abcd").unwrap(), 4);
        let err = fs.write("/s/input", 4, b"e").unwrap_err();
        assert!(matches!(err, VfsError::FileTooLarge(_)), "{err:?}");
        assert_eq!(fs.getattr("/s/input").unwrap().size, 4);
    }
}
