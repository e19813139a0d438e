//! Mount configuration.
//!
//! Loaded from a RON file. Every field has a default, so an empty `()`
//! document describes an echo-backed mount.
//!
//! ```ron
//! (
//!     permissions: (dir: 0o755, input: 0o666, output: 0o444),
//!     max_input: 1048576,
//!     backend: Command(
//!         program: "llm",
//!         args: ["-m", "small"],
//!         timeout_ms: 30000,
//!     ),
//! )
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{Backend, BackendError, CommandBackend, EchoBackend, RejectBackend};
use crate::session::DEFAULT_MAX_INPUT;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The file is not valid RON for [`SessionFsConfig`].
    #[error("invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Permission bits reported for each kind of virtual node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
    /// Root and session directories.
    pub dir: u32,
    /// The writable `input` file.
    pub input: u32,
    /// The read-only `output` and `error` files.
    pub output: u32,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            dir: 0o755,
            input: 0o666,
            output: 0o444,
        }
    }
}

/// Which backend serves the mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendConfig {
    /// Reply with the request behind a fixed prefix.
    Echo {
        /// Text placed before the request.
        #[serde(default = "default_echo_prefix")]
        prefix: String,
    },
    /// Pipe the request through an external program.
    Command {
        /// Program to run.
        program: String,
        /// Arguments passed to the program.
        #[serde(default)]
        args: Vec<String>,
        /// Per-request deadline in milliseconds.
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },
    /// Fail every request with a fixed message.
    Reject {
        /// Failure message.
        message: String,
    },
}

fn default_echo_prefix() -> String {
    EchoBackend::DEFAULT_PREFIX.to_string()
}

fn default_timeout_ms() -> u64 {
    CommandBackend::DEFAULT_TIMEOUT.as_millis() as u64
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Echo {
            prefix: default_echo_prefix(),
        }
    }
}

impl BackendConfig {
    /// Instantiate the configured backend.
    pub fn build(&self) -> Result<Arc<dyn Backend>, BackendError> {
        Ok(match self {
            BackendConfig::Echo { prefix } => Arc::new(EchoBackend::new(prefix.clone())),
            BackendConfig::Command {
                program,
                args,
                timeout_ms,
            } => Arc::new(CommandBackend::new(
                program,
                args.clone(),
                Duration::from_millis(*timeout_ms),
            )?),
            BackendConfig::Reject { message } => Arc::new(RejectBackend::new(message.clone())),
        })
    }
}

/// Top-level mount configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionFsConfig {
    /// Permission bits for synthesized attributes.
    pub permissions: Permissions,
    /// Largest `input` a session may hold, in bytes.
    pub max_input: usize,
    /// Backend serving every session.
    pub backend: BackendConfig,
}

impl Default for SessionFsConfig {
    fn default() -> Self {
        Self {
            permissions: Permissions::default(),
            max_input: DEFAULT_MAX_INPUT,
            backend: BackendConfig::default(),
        }
    }
}

impl SessionFsConfig {
    /// Parse a RON document.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Read and parse a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&text)
    }
}
