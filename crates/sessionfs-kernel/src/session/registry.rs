//! Session registry.
//!
//! Owns every session's buffers. Locking is two-level:
//!
//! - the name → session map is a `DashMap`, touched only long enough to
//!   insert or clone out a session handle;
//! - each session sits behind its own `Mutex`, held for the whole of any
//!   read, write or finalize on that session.
//!
//! A slow backend inside [`SessionRegistry::finalize`] therefore stalls only
//! the session being finalized.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use super::types::{Session, SessionFile, SessionView};
use crate::backend::{Backend, BackendError};
use crate::vfs::{VfsError, VfsResult};

/// Prefix of the text stored in `error` when the backend fails.
pub const ERROR_PREFIX: &str = "Error: ";

/// Default cap on the size of a session's `input`, in bytes.
pub const DEFAULT_MAX_INPUT: usize = 16 * 1024 * 1024;

/// Outcome of a [`SessionRegistry::finalize`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// Backend replied; `output` holds the reply.
    Replied,
    /// Backend failed; `error` holds the rendered failure.
    Failed,
}

/// Thread-safe map of named sessions plus the backend that serves them.
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Mutex<Session>>>,
    backend: Arc<dyn Backend>,
    max_input: usize,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.len())
            .field("max_input", &self.max_input)
            .finish_non_exhaustive()
    }
}

impl SessionRegistry {
    /// Create an empty registry whose sessions are served by `backend`.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            sessions: DashMap::new(),
            backend,
            max_input: DEFAULT_MAX_INPUT,
        }
    }

    /// Cap `input` at `max_input` bytes; writes that would exceed it fail
    /// with [`VfsError::FileTooLarge`].
    pub fn with_max_input(mut self, max_input: usize) -> Self {
        self.max_input = max_input;
        self
    }

    /// Clone out the handle for `name`, releasing the map shard immediately.
    fn handle(&self, name: &str) -> VfsResult<Arc<Mutex<Session>>> {
        self.sessions
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| VfsError::not_found(name))
    }

    /// Create `name`, or reset it to empty buffers if it already exists.
    ///
    /// An existing session is reset in place so that handles already cloned
    /// out by concurrent callers keep pointing at the live session.
    #[tracing::instrument(skip(self), name = "registry.create_session")]
    pub fn create_session(&self, name: &str) {
        let handle = {
            let entry = self.sessions.entry(name.to_string()).or_default();
            Arc::clone(entry.value())
        };
        handle.lock().reset();
        tracing::debug!("session ready");
    }

    /// Snapshot of a session's buffers.
    pub fn lookup(&self, name: &str) -> Option<SessionView> {
        let handle = self.handle(name).ok()?;
        let session = handle.lock();
        Some(session.view())
    }

    /// True if `name` is a known session.
    pub fn contains(&self, name: &str) -> bool {
        self.sessions.contains_key(name)
    }

    /// Current length of one of a session's files.
    pub fn file_len(&self, name: &str, file: SessionFile) -> VfsResult<u64> {
        let handle = self.handle(name)?;
        let session = handle.lock();
        Ok(session.buffer(file).len() as u64)
    }

    /// Bytes `[offset, offset + max_len)` of a file, clamped to its length.
    ///
    /// An offset at or past the end yields an empty vector, not an error.
    pub fn read_slice(
        &self,
        name: &str,
        file: SessionFile,
        offset: u64,
        max_len: usize,
    ) -> VfsResult<Vec<u8>> {
        let handle = self.handle(name)?;
        let session = handle.lock();
        let data = session.buffer(file);

        let Ok(start) = usize::try_from(offset) else {
            return Ok(Vec::new());
        };
        if start >= data.len() {
            return Ok(Vec::new());
        }
        let end = start.saturating_add(max_len).min(data.len());
        Ok(data[start..end].to_vec())
    }

    /// Insert `bytes` into the session's `input` at `offset`.
    ///
    /// Offset 0 truncates `input` first. Any other offset inserts without
    /// overwriting what follows; an offset past the end zero-fills the gap.
    /// Returns the number of bytes accepted.
    ///
    /// Zero-filling is bounded by the registry's input cap; a write whose
    /// result would exceed it is rejected before anything is allocated.
    pub fn write_input(&self, name: &str, offset: u64, bytes: &[u8]) -> VfsResult<usize> {
        let handle = self.handle(name)?;
        let mut session = handle.lock();
        let input = &mut session.input;

        let offset = usize::try_from(offset).map_err(|_| VfsError::out_of_memory("input"))?;
        let kept = if offset == 0 { 0 } else { input.len() };
        let new_len = kept.max(offset).saturating_add(bytes.len());
        if new_len > self.max_input {
            return Err(VfsError::file_too_large(format!(
                "{name}/input: {new_len} bytes exceeds limit of {}",
                self.max_input
            )));
        }
        if offset == 0 {
            input.clear();
        }
        let gap = offset.saturating_sub(input.len());
        input
            .try_reserve(gap.saturating_add(bytes.len()))
            .map_err(|_| VfsError::out_of_memory("input"))?;

        if gap > 0 {
            input.resize(offset, 0);
        }
        drop(input.splice(offset..offset, bytes.iter().copied()));
        Ok(bytes.len())
    }

    /// Send the session's `input` to the backend and store the result.
    ///
    /// Success replaces `output` and clears `error`; failure clears `output`
    /// and stores the rendered failure in `error`. The session lock is held
    /// across the backend call so the two files never disagree.
    #[tracing::instrument(skip(self), name = "registry.finalize")]
    pub fn finalize(&self, name: &str) -> VfsResult<FinalizeOutcome> {
        let handle = self.handle(name)?;
        let mut session = handle.lock();

        let request = String::from_utf8_lossy(&session.input).into_owned();
        let result = self.backend.respond(&request);
        Ok(store_result(&mut session, result))
    }

    /// Names of all sessions, in no particular order.
    pub fn list_sessions(&self) -> Vec<String> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no session has been created.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

fn store_result(session: &mut Session, result: Result<String, BackendError>) -> FinalizeOutcome {
    match result {
        Ok(reply) => {
            session.output = reply.into_bytes();
            session.error.clear();
            tracing::debug!(bytes = session.output.len(), "backend replied");
            FinalizeOutcome::Replied
        }
        Err(e) => {
            tracing::warn!(error = %e, "backend failed");
            session.output.clear();
            session.error = format!("{ERROR_PREFIX}{e}").into_bytes();
            FinalizeOutcome::Failed
        }
    }
}
