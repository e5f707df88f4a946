//! Source-to-PDF compilation.
//!
//! # Module Structure
//!
//! ```text
//! compiler/
//! ├── source.rs     # SourceFile, input → output path mapping
//! ├── macros.rs     # \breadcrumbs, \slashcrumbs, \outdir expansion
//! ├── pipeline.rs   # per-file stages (read, typeset, biber, reload)
//! ├── error.rs      # StageError
//! ├── scan.rs       # stale-file scanner
//! ├── batch.rs      # concurrent batch build
//! └── lock.rs       # per-file exclusion
//! ```

mod batch;
mod error;
mod lock;
mod macros;
mod pipeline;
mod scan;
mod source;

#[cfg(test)]
mod tests;

pub use batch::build_batch;
pub use scan::collect_stale;
pub use source::{SourceFile, is_source_file};

use std::sync::Arc;

use crate::config::BuildConfig;
use crate::notifier::{Notifier, notifier_for};
use lock::BuildLocks;

/// Shared state every pipeline runs against.
pub struct BuildContext {
    pub config: Arc<BuildConfig>,
    pub notifier: Arc<dyn Notifier>,
    pub locks: BuildLocks,
}

impl BuildContext {
    /// Context with the notifier selected by the configuration.
    pub fn new(config: BuildConfig) -> Self {
        let notifier = notifier_for(&config);
        Self::with_notifier(config, notifier)
    }

    pub fn with_notifier(config: BuildConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config: Arc::new(config),
            notifier,
            locks: BuildLocks::new(),
        }
    }
}
