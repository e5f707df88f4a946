//! Per-file pipeline failures.

use std::error::Error as _;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::utils::exec::ExecError;

/// Why one file's pipeline stopped. Never crosses file boundaries.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("failed to read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to create directories `{}`", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("typesetting failed")]
    Typeset(#[source] ExecError),

    #[error("bibliography resolution failed")]
    Bibliography(#[source] ExecError),

    #[error("reloading `{reader}` failed")]
    Reload {
        reader: String,
        #[source]
        source: ExecError,
    },
}

impl StageError {
    /// Short text for desktop notifications (no diagnostics).
    pub fn summary(&self) -> String {
        match self {
            Self::Read { .. } => "Failed to read file.".into(),
            Self::CreateDir { .. } | Self::Typeset(_) => "Failed to process file.".into(),
            Self::Bibliography(_) => "Failed to run Biber.".into(),
            Self::Reload { reader, .. } => format!("Failed to reload {reader}."),
        }
    }

    /// Combined tool output, empty for I/O failures.
    pub fn output(&self) -> &str {
        match self {
            Self::Typeset(e) | Self::Bibliography(e) | Self::Reload { source: e, .. } => {
                e.output()
            }
            Self::Read { .. } | Self::CreateDir { .. } => "",
        }
    }

    /// The error and all of its sources, `: `-separated.
    pub fn chain(&self) -> String {
        let mut message = self.to_string();
        let mut source = self.source();
        while let Some(err) = source {
            message.push_str(": ");
            message.push_str(&err.to_string());
            source = err.source();
        }
        message
    }
}
