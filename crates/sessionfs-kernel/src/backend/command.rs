//! Backend that pipes each request through an external program.
//!
//! The request is written to the program's stdin and its stdout becomes the
//! reply. The program runs on a small private tokio runtime so a deadline
//! can be enforced; a process that overruns it is killed.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::runtime::{Builder, Runtime};

use super::{Backend, BackendError};

/// Runs `program args...` once per request.
///
/// `respond` blocks on the private runtime, so it must not be called from
/// inside another tokio runtime's worker thread.
pub struct CommandBackend {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
    runtime: Runtime,
}

impl std::fmt::Debug for CommandBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBackend")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl CommandBackend {
    /// Default deadline for one request.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a command backend.
    pub fn new(
        program: impl Into<PathBuf>,
        args: Vec<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("sessionfs-backend")
            .enable_io()
            .enable_time()
            .build()?;
        Ok(Self {
            program: program.into(),
            args,
            timeout,
            runtime,
        })
    }

    async fn run(&self, request: &str) -> Result<String, BackendError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(BackendError::Spawn)?;

        let stdin = child.stdin.take();
        let feed = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(request.as_bytes()).await {
                // The program is free to ignore its input.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
            // stdin drops here, closing the pipe
        };

        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        fed?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::failed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8(output.stdout)?)
    }
}

impl Backend for CommandBackend {
    fn respond(&self, request: &str) -> Result<String, BackendError> {
        tracing::debug!(program = %self.program.display(), bytes = request.len(), "running backend command");
        self.runtime.block_on(async {
            match tokio::time::timeout(self.timeout, self.run(request)).await {
                Ok(result) => result,
                Err(_) => Err(BackendError::TimedOut(self.timeout)),
            }
        })
    }
}
