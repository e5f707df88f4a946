//! Per-file compilation pipeline.
//!
//! ```text
//! read → expand macros → typeset → [bibliography] → [re-typeset] → [reload]
//! ```
//!
//! Every stage fails fast and stops this file only. The second typeset pass
//! runs when the source uses biblatex or has a table of contents: the first
//! pass writes the auxiliary data, the second renders it. No third pass.

use std::fs;
use std::sync::LazyLock;

use regex::bytes::Regex;

use super::BuildContext;
use super::error::StageError;
use super::macros::expand_macros;
use super::source::SourceFile;
use crate::utils::exec::Cmd;
use crate::{debug, log};

/// Environment variable carrying the include search path.
const SEARCH_PATH_VAR: &str = "TEXINPUTS";

static BIBLIOGRAPHY_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)\\usepackage(\[.*\])?\{biblatex\}").unwrap());

static TOC_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\tableofcontents").unwrap());

/// Source text plus the flags detected on its raw bytes. Immutable once read.
#[derive(Debug)]
pub struct Document {
    pub content: String,
    pub uses_bibliography: bool,
    pub has_table_of_contents: bool,
}

impl Document {
    /// Detect markers on the raw bytes, before any macro expansion.
    pub fn from_bytes(raw: Vec<u8>) -> Self {
        let uses_bibliography = BIBLIOGRAPHY_MARKER.is_match(&raw);
        let has_table_of_contents = TOC_MARKER.is_match(&raw);
        let content = String::from_utf8(raw)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());

        Self {
            content,
            uses_bibliography,
            has_table_of_contents,
        }
    }

    /// Whether a second typeset pass is needed to render citations or the TOC.
    pub fn needs_second_pass(&self) -> bool {
        self.uses_bibliography || self.has_table_of_contents
    }
}

impl SourceFile {
    /// Run the whole pipeline for this file.
    ///
    /// Failures are logged with their diagnostics and reported to the
    /// notifier before being returned. A failed reload signal is reported the
    /// same way but does not fail the build: the PDF is already written.
    pub fn generate(self, ctx: &BuildContext) -> Result<(), StageError> {
        let lock = ctx.locks.for_path(&self.input);
        let result = {
            let _guard = lock.lock();
            self.run(ctx)
        };
        ctx.locks.release(&self.input, lock);
        result
    }

    fn run(&self, ctx: &BuildContext) -> Result<(), StageError> {
        log!("build"; "processing `{}`", self.input.display());

        if let Err(e) = self.compile(ctx) {
            self.report(&e, ctx);
            return Err(e);
        }

        if ctx.config.reload
            && let Err(e) = self.reload_reader(ctx)
        {
            self.report(&e, ctx);
        }

        Ok(())
    }

    fn compile(&self, ctx: &BuildContext) -> Result<(), StageError> {
        let document = self.read()?;
        let content = expand_macros(&document.content, self);

        self.typeset(&content, ctx)?;
        log!("build"; "processed `{}`", self.input.display());

        if document.uses_bibliography {
            log!("build"; "running biber for `{}`", self.output.display());
            self.resolve_bibliography(ctx)?;
            log!("build"; "ran biber for `{}`", self.output.display());
        }

        if document.needs_second_pass() {
            log!("build"; "reprocessing `{}`", self.input.display());
            self.typeset(&content, ctx)?;
            log!("build"; "reprocessed `{}`", self.input.display());
        }

        Ok(())
    }

    fn read(&self) -> Result<Document, StageError> {
        let raw = fs::read(&self.input).map_err(|source| StageError::Read {
            path: self.input.clone(),
            source,
        })?;
        Ok(Document::from_bytes(raw))
    }

    fn typeset(&self, content: &str, ctx: &BuildContext) -> Result<(), StageError> {
        let out_dir = self.output_dir();
        fs::create_dir_all(out_dir).map_err(|source| StageError::CreateDir {
            path: out_dir.to_path_buf(),
            source,
        })?;

        let captured = Cmd::from_slice(&ctx.config.tools.typesetter)
            .arg("-jobname")
            .arg(self.job_name())
            .arg("-output-directory")
            .arg(out_dir)
            .args(["-shell-escape", "-halt-on-error"])
            .envs([(SEARCH_PATH_VAR, ctx.config.include_path())])
            .stdin(content)
            .run()
            .map_err(StageError::Typeset)?;

        debug!("build"; "typesetter output for `{}`:\n{}", self.input.display(), captured.output);
        Ok(())
    }

    fn resolve_bibliography(&self, ctx: &BuildContext) -> Result<(), StageError> {
        Cmd::from_slice(&ctx.config.tools.bibliography)
            .arg(self.output_stem())
            .run()
            .map_err(StageError::Bibliography)?;
        Ok(())
    }

    fn reload_reader(&self, ctx: &BuildContext) -> Result<(), StageError> {
        let reader = &ctx.config.tools.reader;
        Cmd::from_slice(&ctx.config.tools.signal)
            .arg(reader)
            .run()
            .map_err(|source| StageError::Reload {
                reader: reader.clone(),
                source,
            })?;
        debug!("build"; "reloaded `{reader}`");
        Ok(())
    }

    /// Log the failure with its diagnostics, then notify.
    fn report(&self, error: &StageError, ctx: &BuildContext) {
        let output = error.output().trim_end();
        if output.is_empty() {
            log!("error"; "`{}`: {}", self.input.display(), error.chain());
        } else {
            log!("error"; "`{}`: {}\n{}", self.input.display(), error.chain(), output);
        }
        ctx.notifier.notify(&error.summary());
    }
}
