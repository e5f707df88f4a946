//! Staleness scanner: which sources need a (re)build.

use std::fs;
use std::io;
use std::path::PathBuf;

use jwalk::WalkDir;
use thiserror::Error;

use super::source::{SourceFile, is_source_file};
use crate::config::BuildConfig;
use crate::debug;
use crate::freshness::is_stale;

/// Scan failures. Fatal: a partial stale set cannot be trusted.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot read input directory `{}`", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to walk the input tree")]
    Walk(#[from] jwalk::Error),

    #[error("failed to read modification time of `{}`", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Collect every standalone source under the input root, in path order.
pub fn collect_sources(config: &BuildConfig) -> Result<Vec<PathBuf>, ScanError> {
    if let Err(source) = fs::read_dir(&config.input_root) {
        return Err(ScanError::Root {
            path: config.input_root.clone(),
            source,
        });
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(&config.input_root)
        .sort(true)
        .skip_hidden(false)
    {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        if is_source_file(&path) {
            sources.push(path);
        }
    }

    Ok(sources)
}

/// Sources whose PDF is missing or older than the source.
pub fn collect_stale(config: &BuildConfig) -> Result<Vec<SourceFile>, ScanError> {
    let mut stale = Vec::new();

    for input in collect_sources(config)? {
        let Some(file) = SourceFile::new(&input, config) else {
            continue;
        };

        let needs_build = is_stale(&file.input, &file.output).map_err(|source| ScanError::Stat {
            path: file.input.clone(),
            source,
        })?;

        if needs_build {
            stale.push(file);
        } else {
            debug!("build"; "up to date: `{}`", file.input.display());
        }
    }

    Ok(stale)
}
