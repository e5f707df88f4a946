//! Mtime-based staleness detection.
//!
//! A missing file counts as the Unix epoch, so a source whose PDF was never
//! built is always newer than its output.

use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Modification time of a file, or the epoch if it does not exist.
///
/// Any other metadata error (permissions, broken mount) is returned.
pub fn mtime_or_epoch(path: &Path) -> io::Result<SystemTime> {
    match path.metadata() {
        Ok(meta) => meta.modified(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(SystemTime::UNIX_EPOCH),
        Err(e) => Err(e),
    }
}

/// Whether `source` must be rebuilt into `output`.
///
/// True iff the source is strictly newer than the output.
pub fn is_stale(source: &Path, output: &Path) -> io::Result<bool> {
    Ok(mtime_or_epoch(source)? > mtime_or_epoch(output)?)
}
