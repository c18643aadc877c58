//! Pseudo-terminal launcher.
//!
//! Runs one invocation of the external program and captures its merged
//! stdout/stderr as lines. Three strategies are supported:
//!
//! - [`ShimMode::None`]: plain child process, both output streams on one pipe.
//! - [`ShimMode::Script`]: the command line is handed to `script(1)`, which
//!   allocates a terminal for tools that refuse to print without one.
//! - [`ShimMode::Pty`]: the child runs on a native pseudo-terminal.
//!
//! A launch is split into [`Launcher::spawn`] and [`RunningTurn::finish`] so
//! the caller can publish the [`ProcessHandle`] while the turn is running.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use portable_pty::{native_pty_system, CommandBuilder, MasterPty, PtySize};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::buffer::{strip_ansi_codes, CaptureBuffer};
use super::process::{ExitNotifier, ProcessHandle};
use crate::error::{SessionError, SessionResult};

/// Capture buffer shared between a running turn and readers
pub type SharedBuffer = Arc<Mutex<CaptureBuffer>>;

/// How the external program gets (or does not get) a terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShimMode {
    /// Run the program directly on pipes
    #[default]
    None,
    /// Wrap the command line in `script`
    Script,
    /// Allocate a native pseudo-terminal
    Pty,
}

/// One invocation of the external program
#[derive(Debug, Clone, Default)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Text written to the child's input, followed by end-of-input
    pub input: Option<String>,
    pub shim: ShimMode,
    pub env: HashMap<String, String>,
    pub cwd: Option<PathBuf>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// The command line as a single shell string
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_escape)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Program and arguments actually executed once the shim is applied
    fn resolved_command(&self) -> (String, Vec<String>) {
        match self.shim {
            ShimMode::Script => script_wrapper(self),
            ShimMode::None | ShimMode::Pty => (self.program.clone(), self.args.clone()),
        }
    }
}

/// `script` takes its arguments differently on BSD/macOS and util-linux.
#[cfg(target_os = "macos")]
fn script_wrapper(spec: &LaunchSpec) -> (String, Vec<String>) {
    let mut args = vec!["-q".to_string(), "/dev/null".to_string(), spec.program.clone()];
    args.extend(spec.args.iter().cloned());
    ("script".to_string(), args)
}

#[cfg(not(target_os = "macos"))]
fn script_wrapper(spec: &LaunchSpec) -> (String, Vec<String>) {
    let args = vec![
        "-q".to_string(),
        "-c".to_string(),
        spec.command_line(),
        "/dev/null".to_string(),
    ];
    ("script".to_string(), args)
}

/// Escape a string for safe shell use.
///
/// Wraps the string in single quotes and escapes embedded single quotes
/// using the `'\''` technique (end quote, escaped quote, start quote).
pub fn shell_escape(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Captured result of a finished invocation
#[derive(Debug, Clone)]
pub struct LaunchOutcome {
    /// Every captured line, in terminal order
    pub lines: Vec<String>,
    /// Exit code; `None` when the child was killed by a signal
    pub status: Option<i32>,
    /// Whether the child was stopped through its [`ProcessHandle`]
    pub interrupted: bool,
}

impl LaunchOutcome {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

pub struct Launcher;

impl Launcher {
    /// Spawn the program described by `spec`.
    ///
    /// Fails with [`SessionError::Launch`] if the process cannot be started.
    pub async fn spawn(spec: &LaunchSpec) -> SessionResult<RunningTurn> {
        match spec.shim {
            ShimMode::Pty => spawn_pty(spec),
            ShimMode::None | ShimMode::Script => spawn_piped(spec),
        }
    }

    /// Spawn and wait in one call
    pub async fn run(spec: &LaunchSpec, sink: SharedBuffer) -> SessionResult<LaunchOutcome> {
        Self::spawn(spec).await?.finish(sink).await
    }
}

/// A spawned invocation that has not been reaped yet
pub struct RunningTurn {
    handle: ProcessHandle,
    notifier: ExitNotifier,
    inner: TurnInner,
}

enum TurnInner {
    Piped {
        child: tokio::process::Child,
        reader: std::io::PipeReader,
    },
    Pty {
        child: Box<dyn portable_pty::Child + Send + Sync>,
        reader: Box<dyn Read + Send>,
        master: Box<dyn MasterPty + Send>,
    },
}

impl RunningTurn {
    pub fn handle(&self) -> &ProcessHandle {
        &self.handle
    }

    /// Read output until end-of-stream, then reap the child.
    ///
    /// Lines are pushed into `sink` as they arrive so readers can observe a
    /// turn in progress.
    pub async fn finish(self, sink: SharedBuffer) -> SessionResult<LaunchOutcome> {
        let RunningTurn {
            handle,
            notifier,
            inner,
        } = self;

        let (lines, status) = match inner {
            TurnInner::Piped { mut child, reader } => {
                let lines = tokio::task::spawn_blocking(move || read_lines(reader, &sink))
                    .await
                    .map_err(std::io::Error::other)?;
                let status = child.wait().await?;
                (lines, status.code())
            }
            TurnInner::Pty {
                mut child,
                reader,
                master,
            } => tokio::task::spawn_blocking(move || {
                let lines = read_lines(reader, &sink);
                let status = child.wait().map(|s| s.exit_code() as i32);
                drop(master);
                status.map(|code| (lines, Some(code)))
            })
            .await
            .map_err(std::io::Error::other)??,
        };
        notifier.mark_exited();

        tracing::debug!(pid = ?handle.pid(), ?status, lines = lines.len(), "Child exited");

        Ok(LaunchOutcome {
            lines,
            status,
            interrupted: handle.was_interrupted(),
        })
    }
}

fn spawn_piped(spec: &LaunchSpec) -> SessionResult<RunningTurn> {
    let (program, args) = spec.resolved_command();

    // One pipe for both streams keeps diagnostics in emission order
    let (reader, writer) = std::io::pipe()?;
    let stderr_writer = writer.try_clone()?;

    let mut cmd = Command::new(&program);
    cmd.args(&args)
        .stdin(if spec.input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(writer)
        .stderr(stderr_writer)
        .envs(&spec.env)
        .kill_on_drop(true);
    if let Some(cwd) = &spec.cwd {
        cmd.current_dir(cwd);
    }
    #[cfg(unix)]
    cmd.process_group(0);

    let spawned = cmd.spawn();
    // Release our copies of the write end so EOF arrives when the child exits
    drop(cmd);
    let mut child = spawned.map_err(|source| SessionError::Launch {
        program: program.clone(),
        source,
    })?;

    let (handle, notifier) = ProcessHandle::new(child.id());
    tracing::debug!(program = %program, pid = ?child.id(), shim = ?spec.shim, "Spawned child");

    if let (Some(input), Some(mut stdin)) = (spec.input.clone(), child.stdin.take()) {
        tokio::spawn(async move {
            let mut payload = input.into_bytes();
            if payload.last() != Some(&b'\n') {
                payload.push(b'\n');
            }
            if let Err(e) = stdin.write_all(&payload).await {
                tracing::debug!("Failed to write prompt to child stdin: {}", e);
            }
            // Dropping stdin closes it, signalling end of input
        });
    }

    Ok(RunningTurn {
        handle,
        notifier,
        inner: TurnInner::Piped { child, reader },
    })
}

fn spawn_pty(spec: &LaunchSpec) -> SessionResult<RunningTurn> {
    let launch_error = |e: anyhow::Error| SessionError::Launch {
        program: spec.program.clone(),
        source: std::io::Error::other(e.to_string()),
    };

    let pty_system = native_pty_system();
    let pair = pty_system
        .openpty(PtySize {
            rows: 50,
            cols: 200,
            pixel_width: 0,
            pixel_height: 0,
        })
        .map_err(launch_error)?;

    let mut cmd = CommandBuilder::new(&spec.program);
    cmd.args(&spec.args);
    if let Some(cwd) = &spec.cwd {
        cmd.cwd(cwd);
    }
    for (key, value) in &spec.env {
        cmd.env(key, value);
    }

    let child = pair.slave.spawn_command(cmd).map_err(launch_error)?;
    // Keeping the slave open in this process would hide the child's exit
    drop(pair.slave);

    let reader = pair.master.try_clone_reader().map_err(launch_error)?;

    if let Some(input) = &spec.input {
        let mut writer = pair.master.take_writer().map_err(launch_error)?;
        let mut payload = input.clone().into_bytes();
        if payload.last() != Some(&b'\n') {
            payload.push(b'\n');
        }
        // Ctrl-D at the start of a line is end-of-input for the line discipline
        payload.push(0x04);
        writer.write_all(&payload)?;
        writer.flush()?;
    }

    let pid = child.process_id();
    let (handle, notifier) = ProcessHandle::new(pid);
    tracing::debug!(program = %spec.program, ?pid, "Spawned child on pty");

    Ok(RunningTurn {
        handle,
        notifier,
        inner: TurnInner::Pty {
            child,
            reader,
            master: pair.master,
        },
    })
}

/// Read `reader` to end-of-stream, pushing cleaned lines into `sink`.
fn read_lines(reader: impl Read, sink: &Mutex<CaptureBuffer>) -> Vec<String> {
    let mut reader = BufReader::new(reader);
    let mut lines = Vec::new();
    let mut raw = Vec::new();

    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&raw);
                let clean = strip_ansi_codes(text.trim_end_matches(['\n', '\r']));
                if let Ok(mut buf) = sink.lock() {
                    buf.push(clean.clone());
                }
                lines.push(clean);
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            // A pty master reports EIO once the slave side is gone
            Err(_) => break,
        }
    }

    lines
}
