//! Sections of the optional config file.
//!
//! # Example
//!
//! ```toml
//! [build]
//! include = ["lib", "styles"]   # TEXINPUTS entries, before any -I flags
//! jobs = 4                      # cap on concurrent compilations
//! debounce_ms = 50              # watch quiescence window
//! reload = true                 # HUP the reader after each build
//! notify = false                # desktop notification on failure
//!
//! [tools]
//! typesetter = ["xelatex"]
//! bibliography = ["biber"]
//! signal = ["pkill", "-HUP"]
//! reader = "mupdf"
//! notifier = ["notify-send"]
//! notify_title = "Gobinet error"
//! ```

use serde::Deserialize;
use std::path::PathBuf;

/// Default watch quiescence window.
pub const DEFAULT_DEBOUNCE_MS: u64 = 50;

/// Root of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub build: BuildSection,
    pub tools: ToolsConfig,
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    pub include: Vec<PathBuf>,
    pub jobs: Option<usize>,
    pub debounce_ms: u64,
    pub reload: bool,
    pub notify: bool,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            jobs: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            reload: false,
            notify: false,
        }
    }
}

/// `[tools]` section: external programs driven by the pipeline.
///
/// Commands are vectors, program first, so wrappers such as
/// `["latexmk-shim", "--engine"]` work without a shell.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Typesetting engine. Receives `-jobname`, `-output-directory`,
    /// `-shell-escape` and `-halt-on-error`, with the source on stdin.
    pub typesetter: Vec<String>,
    /// Bibliography resolver. Receives the output path without extension.
    pub bibliography: Vec<String>,
    /// Signal sender. Receives the reader process name.
    pub signal: Vec<String>,
    /// Name of the PDF reader process to reload.
    pub reader: String,
    /// Desktop notification command. Receives the title and the message.
    pub notifier: Vec<String>,
    pub notify_title: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            typesetter: vec!["xelatex".into()],
            bibliography: vec!["biber".into()],
            signal: vec!["pkill".into(), "-HUP".into()],
            reader: "mupdf".into(),
            notifier: vec!["notify-send".into()],
            notify_title: "Gobinet error".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.build.debounce_ms, DEFAULT_DEBOUNCE_MS);
        assert!(config.build.include.is_empty());
        assert_eq!(config.tools.typesetter, vec!["xelatex"]);
        assert_eq!(config.tools.signal, vec!["pkill", "-HUP"]);
        assert_eq!(config.tools.reader, "mupdf");
    }

    #[test]
    fn test_partial_tools_section() {
        let config: FileConfig =
            toml::from_str("[tools]\ntypesetter = [\"lualatex\"]\nreader = \"zathura\"").unwrap();
        assert_eq!(config.tools.typesetter, vec!["lualatex"]);
        assert_eq!(config.tools.reader, "zathura");
        assert_eq!(config.tools.bibliography, vec!["biber"]);
    }

    #[test]
    fn test_build_section() {
        let config: FileConfig = toml::from_str(
            "[build]\ninclude = [\"lib\"]\njobs = 2\ndebounce_ms = 120\nnotify = true",
        )
        .unwrap();
        assert_eq!(config.build.include, vec![PathBuf::from("lib")]);
        assert_eq!(config.build.jobs, Some(2));
        assert_eq!(config.build.debounce_ms, 120);
        assert!(config.build.notify);
        assert!(!config.build.reload);
    }
}
