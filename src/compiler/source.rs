//! Source files and the input → output path mapping.
//!
//! ```text
//! input_root/notes/week_1.tex  →  output_root/notes/week_1.pdf
//!                                 base path: notes/week_1
//!                                 job name:  week_1
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::BuildConfig;

/// Extension of buildable sources.
pub const SOURCE_EXTENSION: &str = "tex";

/// Extension of the primary artifact.
pub const OUTPUT_EXTENSION: &str = "pdf";

/// Files starting with this character are partials, included by other files
/// and never built on their own.
pub const PRIVATE_PREFIX: char = '_';

/// Whether `path` names a standalone source (`.tex`, not `_`-prefixed).
pub fn is_source_file(path: &Path) -> bool {
    let has_extension = path
        .extension()
        .is_some_and(|ext| ext == SOURCE_EXTENSION);
    let is_private = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(PRIVATE_PREFIX));

    has_extension && !is_private
}

/// Result of mapping a source into the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedPath {
    /// `output_root / base_path + ".pdf"`
    pub output: PathBuf,
    /// Source path relative to the input root, extension stripped.
    pub base_path: PathBuf,
}

/// Map a source path into the output tree.
///
/// Pure and lexical. Returns `None` when `input` is not inside `input_root`.
pub fn map_output(input: &Path, input_root: &Path, output_root: &Path) -> Option<MappedPath> {
    let relative = input.strip_prefix(input_root).ok()?;
    if relative.as_os_str().is_empty() {
        return None;
    }
    let base_path = relative.with_extension("");

    // Appended rather than `with_extension`: `v1.2` must become `v1.2.pdf`.
    let mut file_name = OsString::from(base_path.as_os_str());
    file_name.push(".");
    file_name.push(OUTPUT_EXTENSION);

    Some(MappedPath {
        output: output_root.join(file_name),
        base_path,
    })
}

/// One source-to-PDF build unit.
///
/// Created fresh for every build attempt and consumed by
/// [`SourceFile::generate`](super::pipeline).
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub input: PathBuf,
    pub output: PathBuf,
    pub base_path: PathBuf,
}

impl SourceFile {
    /// Build unit for `input` under the configured roots.
    pub fn new(input: &Path, config: &BuildConfig) -> Option<Self> {
        let mapped = map_output(input, &config.input_root, &config.output_root)?;
        Some(Self {
            input: input.to_path_buf(),
            output: mapped.output,
            base_path: mapped.base_path,
        })
    }

    /// Job name handed to the typesetter: last segment of the base path.
    pub fn job_name(&self) -> &Path {
        self.base_path
            .file_name()
            .map_or(self.base_path.as_path(), Path::new)
    }

    /// Directory the typesetter writes into.
    pub fn output_dir(&self) -> &Path {
        self.output.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Output path without its extension, as expected by the bibliography resolver.
    pub fn output_stem(&self) -> PathBuf {
        self.output.with_extension("")
    }

    /// Base path with `/` separators regardless of platform, for macro text.
    pub fn base_path_text(&self) -> String {
        self.base_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}
