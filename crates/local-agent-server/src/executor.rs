// local-agent-server/src/executor.rs
// ============================================================================
// Module: Host Executor
// Description: Fixed-primitive process execution for tool handlers.
// Purpose: Run host programs without a shell, with timeouts and output caps.
// Dependencies: async-trait, thiserror, tokio
// ============================================================================

//! ## Overview
//! Tools never build command strings. They build an [`Invocation`] (a program
//! plus discrete arguments) from the fixed table in [`crate::platform`] and
//! hand it to a [`HostExecutor`]. Two capabilities exist:
//!
//! - [`HostExecutor::launch_detached`]: launch, do not track. The child is
//!   started with null stdio in its own process group and no handle is kept.
//! - [`HostExecutor::run_fixed`]: run to completion under a timeout, returning
//!   capped stdout. Non-zero exit is an error carrying stderr.
//!
//! The trait is the seam used by tests to record invocations instead of
//! touching the host.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ffi::OsStr;
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A program and its discrete arguments. Never interpreted by a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name or absolute path.
    pub program: OsString,
    /// Arguments passed verbatim, one per element.
    pub args: Vec<OsString>,
}

impl Invocation {
    /// Builds an invocation with no arguments.
    #[must_use]
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Returns the program as a path.
    #[must_use]
    pub fn program_path(&self) -> &Path {
        Path::new(&self.program)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Limits applied to [`HostExecutor::run_fixed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecLimits {
    /// Wall-clock timeout.
    pub timeout: Duration,
    /// Maximum captured bytes per stream.
    pub max_output_bytes: usize,
}

impl Default for ExecLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_output_bytes: 1024 * 1024,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Host execution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// The program could not be started.
    #[error("failed to start {program}: {message}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// OS error text.
        message: String,
    },
    /// The program did not finish in time and was killed.
    #[error("command timed out after {timeout_ms} ms")]
    TimedOut {
        /// Configured timeout.
        timeout_ms: u128,
    },
    /// The program exited unsuccessfully.
    #[error("{0}")]
    Failed(String),
    /// I/O failure while collecting output.
    #[error("command io error: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Executes fixed host primitives.
#[async_trait]
pub trait HostExecutor: Send + Sync {
    /// Starts the program and returns immediately. Launch, do not track.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Spawn`] when the program cannot be started.
    async fn launch_detached(&self, invocation: &Invocation) -> Result<(), ExecError>;

    /// Runs the program to completion and returns its stdout.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError`] on spawn failure, timeout, or non-zero exit.
    async fn run_fixed(
        &self,
        invocation: &Invocation,
        limits: ExecLimits,
    ) -> Result<String, ExecError>;
}

// ============================================================================
// SECTION: System Executor
// ============================================================================

/// Executor backed by real host processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

#[async_trait]
impl HostExecutor for SystemExecutor {
    async fn launch_detached(&self, invocation: &Invocation) -> Result<(), ExecError> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        detach(&mut command);
        // Dropping the handle without `kill_on_drop` leaves the child running;
        // tokio reaps it once it exits.
        command.spawn().map(drop).map_err(|err| spawn_error(invocation, &err))
    }

    async fn run_fixed(
        &self,
        invocation: &Invocation,
        limits: ExecLimits,
    ) -> Result<String, ExecError> {
        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| spawn_error(invocation, &err))?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let cap = limits.max_output_bytes;
        let collect = async {
            let (out, err) = tokio::join!(read_capped(stdout, cap), read_capped(stderr, cap));
            let status = child.wait().await?;
            Ok::<_, io::Error>((status, out?, err?))
        };
        let (status, out, err) = tokio::time::timeout(limits.timeout, collect)
            .await
            .map_err(|_| ExecError::TimedOut {
                timeout_ms: limits.timeout.as_millis(),
            })?
            .map_err(|err| ExecError::Io(err.to_string()))?;
        if !status.success() {
            let stderr_text = String::from_utf8_lossy(&err);
            let trimmed = stderr_text.trim();
            return Err(ExecError::Failed(if trimmed.is_empty() {
                format!("{} exited with {status}", invocation.program.to_string_lossy())
            } else {
                trimmed.to_string()
            }));
        }
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Places a detached child in its own process group.
#[cfg(unix)]
fn detach(command: &mut Command) {
    command.process_group(0);
}

/// Starts a detached child without a console in a new process group.
#[cfg(windows)]
fn detach(command: &mut Command) {
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}

/// No detach support on other targets.
#[cfg(not(any(unix, windows)))]
const fn detach(_command: &mut Command) {}

/// Maps a spawn failure.
fn spawn_error(invocation: &Invocation, err: &io::Error) -> ExecError {
    ExecError::Spawn {
        program: invocation.program.to_string_lossy().into_owned(),
        message: err.to_string(),
    }
}

/// Reads a stream to EOF, keeping at most `cap` bytes.
///
/// The remainder is drained and discarded so the child never blocks on a
/// full pipe.
async fn read_capped<R>(reader: Option<R>, cap: usize) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(Vec::new());
    };
    let mut kept = Vec::new();
    let mut chunk = [0_u8; 8192];
    loop {
        let read = reader.read(&mut chunk).await?;
        if read == 0 {
            return Ok(kept);
        }
        let room = cap.saturating_sub(kept.len());
        kept.extend_from_slice(&chunk[.. read.min(room)]);
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
