//! Placeholder macros substituted into the source before typesetting.
//!
//! | Macro          | Replacement                                          |
//! |----------------|------------------------------------------------------|
//! | `\breadcrumbs` | base path, `_` → space, `/` → ` \textgreater\hspace{1pt} ` |
//! | `\slashcrumbs` | base path, `_` → space                               |
//! | `\outdir`      | directory of the output PDF                          |
//!
//! Plain global find/replace: no escaping, no recursion.

use super::source::SourceFile;

const BREADCRUMBS: &str = r"\breadcrumbs";
const SLASHCRUMBS: &str = r"\slashcrumbs";
const OUTDIR: &str = r"\outdir";

/// Separator rendered between breadcrumb segments.
const CRUMB_SEPARATOR: &str = r" \textgreater\hspace{1pt} ";

/// Expand the three placeholder macros for `file`.
pub fn expand_macros(content: &str, file: &SourceFile) -> String {
    let pretty = file.base_path_text().replace('_', " ");
    let breadcrumbs = pretty.replace('/', CRUMB_SEPARATOR);
    let outdir = file.output_dir().display().to_string();

    content
        .replace(BREADCRUMBS, &breadcrumbs)
        .replace(SLASHCRUMBS, &pretty)
        .replace(OUTDIR, &outdir)
}
