//! `watch` command: build once, then rebuild sources as they change.
//!
//! The watcher is created before the initial build so that saves made while
//! it runs are buffered rather than lost. One recursive subscription on the
//! input root also covers directories created later.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel;
use notify::{Event, RecursiveMode, Watcher};

use crate::compiler::{BuildContext, build_batch, collect_stale};
use crate::log;
use crate::utils::plural_count;
use crate::watch::{Debouncer, rebuild, run_event_loop};

/// Run until the watcher shuts down. Only setup failures are returned.
pub fn watch_sources(ctx: Arc<BuildContext>) -> Result<()> {
    let (event_tx, event_rx) = channel::unbounded();
    let (error_tx, error_rx) = channel::unbounded();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        // A failed send means the loop is gone.
        match res {
            Ok(event) => {
                let _ = event_tx.send(event);
            }
            Err(err) => {
                let _ = error_tx.send(err);
            }
        }
    })
    .context("failed to create file watcher")?;

    let root = &ctx.config.input_root;
    watcher
        .watch(root, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch `{}`", root.display()))?;

    let report = build_batch(collect_stale(&ctx.config)?, &ctx)?;
    if !report.is_success() {
        log!("watch"; "{} failed in the initial build", plural_count(report.failed.len(), "file"));
    }

    let dispatch_ctx = Arc::clone(&ctx);
    let debouncer = Debouncer::new(
        ctx.config.debounce,
        Arc::new(move |path: PathBuf| rebuild(path, &dispatch_ctx)),
    );

    log!("watch"; "watching `{}` for changes", root.display());
    run_event_loop(event_rx, error_rx, &debouncer);

    drop(watcher);
    Ok(())
}
