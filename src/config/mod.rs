//! Build configuration.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── error.rs      # ConfigError
//! ├── section.rs    # [build] / [tools] sections of the optional TOML file
//! └── mod.rs        # BuildConfig (this file)
//! ```
//!
//! `BuildConfig` is assembled once at startup from the command line and the
//! optional config file, then shared read-only (`Arc<BuildConfig>`) by the
//! scanner, every pipeline and the watch loop.

mod error;
mod section;

pub use error::ConfigError;
pub use section::{DEFAULT_DEBOUNCE_MS, FileConfig, ToolsConfig};

use crate::{
    cli::{BuildArgs, Cli},
    log,
    utils::normalize_path,
};
use anyhow::Result;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Immutable settings for one invocation.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Absolute root of the source tree.
    pub input_root: PathBuf,
    /// Absolute root of the PDF tree.
    pub output_root: PathBuf,
    /// TeX search path entries, in order.
    pub include_dirs: Vec<PathBuf>,
    /// Signal the reader after each successful build.
    pub reload: bool,
    /// Desktop notification on failure.
    pub notify: bool,
    /// Concurrency cap for batch builds. `None` means one worker per stale file.
    pub jobs: Option<usize>,
    /// Watch quiescence window.
    pub debounce: Duration,
    pub tools: ToolsConfig,
}

impl BuildConfig {
    /// Defaults for the given roots. Roots are cleaned lexically into absolute paths.
    pub fn new(input_root: impl AsRef<Path>, output_root: impl AsRef<Path>) -> Self {
        Self {
            input_root: normalize_path(input_root.as_ref()),
            output_root: normalize_path(output_root.as_ref()),
            include_dirs: Vec::new(),
            reload: false,
            notify: false,
            jobs: None,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            tools: ToolsConfig::default(),
        }
    }

    /// Load configuration from CLI arguments and the optional config file.
    ///
    /// CLI values override file values; include directories from both are
    /// kept, file entries first.
    pub fn load(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => Self::from_path(path)?,
            None => FileConfig::default(),
        };

        let config = Self::merge(file, cli.build_args());
        config.validate()?;
        Ok(config)
    }

    /// Combine file sections with CLI arguments.
    fn merge(file: FileConfig, args: &BuildArgs) -> Self {
        let mut config = Self::new(&args.input, &args.output);

        config.include_dirs = file.build.include;
        config.include_dirs.extend(args.include.iter().cloned());
        config.reload = args.reload.unwrap_or(file.build.reload);
        config.notify = args.notify.unwrap_or(file.build.notify);
        config.jobs = args.jobs.or(file.build.jobs);
        config.debounce = Duration::from_millis(file.build.debounce_ms);
        config.tools = file.tools;
        config
    }

    /// Load the config file, warning about keys nothing reads.
    fn from_path(path: &Path) -> Result<FileConfig, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            log!("warning"; "unknown fields in {}, ignoring: {}", path.display(), ignored.join(", "));
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(FileConfig, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Reject settings the pipeline cannot run with.
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.input_root.is_dir() {
            return Err(ConfigError::Validation(format!(
                "input directory `{}` does not exist",
                self.input_root.display()
            )));
        }
        if self.jobs == Some(0) {
            return Err(ConfigError::Validation("jobs must be at least 1".into()));
        }
        if self.debounce.is_zero() {
            return Err(ConfigError::Validation("debounce_ms must be at least 1".into()));
        }
        for (name, command) in [
            ("tools.typesetter", &self.tools.typesetter),
            ("tools.bibliography", &self.tools.bibliography),
            ("tools.signal", &self.tools.signal),
            ("tools.notifier", &self.tools.notifier),
        ] {
            if command.is_empty() {
                return Err(ConfigError::Validation(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    /// Value of the TeX search-path variable: every include directory joined
    /// with `:`, plus a trailing `:` so the engine also searches its defaults.
    pub fn include_path(&self) -> String {
        let mut value = self
            .include_dirs
            .iter()
            .map(|dir| dir.display().to_string())
            .collect::<Vec<_>>()
            .join(":");
        value.push(':');
        value
    }
}
