//! `build` command: compile every stale source once.

use anyhow::{Result, bail};

use crate::compiler::{BuildContext, build_batch, collect_stale};
use crate::log;
use crate::utils::plural_count;

/// Build all stale sources. Fails when any of them failed.
pub fn build_all(ctx: &BuildContext) -> Result<()> {
    let stale = collect_stale(&ctx.config)?;
    let report = build_batch(stale, ctx)?;

    if !report.is_success() {
        for input in &report.failed {
            log!("error"; "failed: `{}`", input.display());
        }
        bail!("{} failed to build", plural_count(report.failed.len(), "file"));
    }

    if report.built > 0 {
        log!("build"; "built {}", plural_count(report.built, "file"));
    }
    Ok(())
}
