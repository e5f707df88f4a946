//! Batch build: one pipeline per stale file, joined before returning.

use std::path::PathBuf;

use anyhow::Result;
use rayon::prelude::*;

use super::BuildContext;
use super::source::SourceFile;
use crate::log;
use crate::utils::plural_count;

/// Outcome of a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub built: usize,
    /// Inputs whose pipeline failed, in no particular order.
    pub failed: Vec<PathBuf>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Compile every file concurrently and wait for all of them.
///
/// Workers come from a dedicated pool sized by `jobs`, or one per file when
/// no cap is configured. A failing file never affects its siblings.
pub fn build_batch(files: Vec<SourceFile>, ctx: &BuildContext) -> Result<BatchReport> {
    if files.is_empty() {
        log!("build"; "nothing to build");
        return Ok(BatchReport::default());
    }

    let workers = ctx.config.jobs.unwrap_or(files.len()).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("gobinet-build-{i}"))
        .build()?;

    log!("build"; "starting build ({})", plural_count(files.len(), "file"));

    let results: Vec<(PathBuf, bool)> = pool.install(|| {
        files
            .into_par_iter()
            .map(|file| {
                let input = file.input.clone();
                let ok = file.generate(ctx).is_ok();
                (input, ok)
            })
            .collect()
    });

    let mut report = BatchReport::default();
    for (input, ok) in results {
        if ok {
            report.built += 1;
        } else {
            report.failed.push(input);
        }
    }

    log!("build"; "finished build");
    Ok(report)
}
