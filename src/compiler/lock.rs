//! Per-file build exclusion.
//!
//! Batch builds and watch-triggered rebuilds may target the same source at
//! the same time (a slow build outliving the debounce window). Each pipeline
//! holds its file's lock for the whole run, so such runs serialize instead of
//! racing on the same output directory.
//!
//! Entries are released after each run unless another run holds or waits on
//! the same lock, so a long watch session keeps only in-flight paths.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Registry handing out one mutex per input path.
#[derive(Default)]
pub struct BuildLocks {
    locks: Mutex<FxHashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl BuildLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock guarding `input`. Lock the returned handle for the run's duration.
    pub fn for_path(&self, input: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(input.to_path_buf()).or_default())
    }

    /// Hand back a lock from [`for_path`](Self::for_path) once its run is over.
    ///
    /// The entry is dropped when the table and `lock` are its only owners.
    /// Both checks happen under the table lock, so no caller can pick the
    /// entry up in between.
    pub fn release(&self, input: &Path, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock();
        let is_current = locks.get(input).is_some_and(|l| Arc::ptr_eq(l, &lock));
        if is_current && Arc::strong_count(&lock) == 2 {
            locks.remove(input);
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }
}
