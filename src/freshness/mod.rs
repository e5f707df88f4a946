//! Freshness detection: source vs. output modification times.

mod mtime;

pub use mtime::is_stale;
