//! Session state and the three virtual files it backs.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// One of the three virtual files inside a session directory.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionFile {
    /// Request bytes written by the client. The only writable file.
    Input,
    /// Reply text from the last successful trigger.
    Output,
    /// Rendered failure from the last failed trigger.
    Error,
}

impl SessionFile {
    /// All session files, in listing order.
    pub const ALL: [SessionFile; 3] = [SessionFile::Input, SessionFile::Output, SessionFile::Error];

    /// Whether clients may write this file.
    pub fn is_writable(&self) -> bool {
        matches!(self, SessionFile::Input)
    }
}

/// Buffers owned by a single session.
///
/// Only reachable through the registry, which guards each session with its
/// own lock.
#[derive(Debug, Default, Clone)]
pub(crate) struct Session {
    pub(crate) input: Vec<u8>,
    pub(crate) output: Vec<u8>,
    pub(crate) error: Vec<u8>,
}

impl Session {
    pub(crate) fn buffer(&self, file: SessionFile) -> &[u8] {
        match file {
            SessionFile::Input => &self.input,
            SessionFile::Output => &self.output,
            SessionFile::Error => &self.error,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.input.clear();
        self.output.clear();
        self.error.clear();
    }

    pub(crate) fn view(&self) -> SessionView {
        SessionView {
            input: self.input.clone(),
            output: self.output.clone(),
            error: self.error.clone(),
        }
    }
}

/// Read-only snapshot of a session's buffers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionView {
    /// Contents of `input`.
    pub input: Vec<u8>,
    /// Contents of `output`.
    pub output: Vec<u8>,
    /// Contents of `error`.
    pub error: Vec<u8>,
}

impl SessionView {
    /// Bytes of the given file.
    pub fn get(&self, file: SessionFile) -> &[u8] {
        match file {
            SessionFile::Input => &self.input,
            SessionFile::Output => &self.output,
            SessionFile::Error => &self.error,
        }
    }

    /// True when all three buffers are empty.
    pub fn is_empty(&self) -> bool {
        self.input.is_empty() && self.output.is_empty() && self.error.is_empty()
    }
}
