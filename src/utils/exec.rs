//! Running external tools.
//!
//! Provides a Builder-based API for running external tools with stdin piping
//! and combined output capture.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! // Command vector from config (program first, then fixed args)
//! Cmd::from_slice(&["pkill", "-HUP"]).arg("mupdf").run()?;
//!
//! // With environment and stdin piping
//! let captured = Cmd::new("xelatex")
//!     .args(["-jobname", "notes"])
//!     .envs([("TEXINPUTS", "lib:")])
//!     .stdin(source)
//!     .run()?;
//! ```

use std::{
    ffi::{OsStr, OsString},
    io::{self, Write},
    process::{Command, ExitStatus, Stdio},
    thread,
};

use thiserror::Error;

/// Errors raised while running an external tool.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The process could not be launched (missing executable, permissions).
    #[error("unable to start `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Talking to a running process failed.
    #[error("I/O error while running `{program}`")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The process ran and exited unsuccessfully.
    #[error("`{program}` failed with {status}")]
    Status {
        program: String,
        status: ExitStatus,
        output: String,
    },
}

impl ExecError {
    /// Diagnostic output captured from the process, if it got that far.
    pub fn output(&self) -> &str {
        match self {
            Self::Status { output, .. } => output,
            Self::Spawn { .. } | Self::Io { .. } => "",
        }
    }
}

/// Result of a successful run.
#[derive(Debug)]
pub struct Captured {
    /// Standard output followed by standard error.
    pub output: String,
}

// ============================================================================
// Builder API
// ============================================================================

/// Builder for one external tool invocation.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
    stdin_data: Option<Vec<u8>>,
}

impl Cmd {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Command vector from config: program first, then fixed arguments.
    /// An empty vector yields an empty program, which fails to spawn.
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let Some((program, fixed)) = cmd.split_first() else {
            return Self::default();
        };
        Self::new(program).args(fixed)
    }

    /// Append an argument. Empty strings are skipped.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Set environment variables for the subprocess (on top of the inherited ones).
    pub fn envs<K, V, I>(mut self, vars: I) -> Self
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in vars {
            self.envs
                .push((k.as_ref().to_owned(), v.as_ref().to_owned()));
        }
        self
    }

    /// Bytes written to the child's stdin.
    pub fn stdin<D: AsRef<[u8]>>(mut self, data: D) -> Self {
        self.stdin_data = Some(data.as_ref().to_vec());
        self
    }

    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Execute the command, blocking until it exits.
    ///
    /// A non-zero exit becomes [`ExecError::Status`] carrying the combined output.
    pub fn run(self) -> Result<Captured, ExecError> {
        let program = self.program_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if self.stdin_data.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: program.clone(),
            source,
        })?;

        // Feed stdin from its own thread: the child may fill its output pipes
        // before it has consumed all input.
        let writer = match (child.stdin.take(), self.stdin_data) {
            (Some(mut stdin), Some(data)) => Some(thread::spawn(move || stdin.write_all(&data))),
            _ => None,
        };

        let output = child.wait_with_output().map_err(|source| ExecError::Io {
            program: program.clone(),
            source,
        })?;

        if let Some(writer) = writer {
            match writer.join() {
                // A child that exits without reading all of stdin closes the
                // pipe; its exit status tells the real story.
                Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {}
                Ok(Err(source)) => return Err(ExecError::Io { program, source }),
                Ok(Ok(())) => {}
                Err(_) => {
                    return Err(ExecError::Io {
                        program,
                        source: io::Error::other("stdin writer thread panicked"),
                    });
                }
            }
        }

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(ExecError::Status {
                program,
                status: output.status,
                output: combined,
            });
        }

        Ok(Captured {
            output: combined,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
