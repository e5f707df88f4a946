//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Incremental LaTeX builder with a watch mode
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Optional config file (TOML) with `[build]` and `[tools]` sections
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build every source whose PDF is missing or older than the source
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Build once, then rebuild sources as they change
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        build_args: BuildArgs,
    },
}

/// Shared arguments for Build and Watch commands
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Directory containing the `.tex` sources
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub input: PathBuf,

    /// Directory receiving the generated PDFs (mirrors the input tree)
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub output: PathBuf,

    /// Add a directory to the TeX search path. May be passed multiple times.
    #[arg(short = 'I', long = "include", value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub include: Vec<PathBuf>,

    /// Send a HUP signal to the PDF reader after each successful build
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub reload: Option<bool>,

    /// Send a desktop notification when compilation fails
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub notify: Option<bool>,

    /// Maximum number of files compiled at once (default: one per stale file)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

impl Cli {
    pub const fn build_args(&self) -> &BuildArgs {
        match &self.command {
            Commands::Build { build_args } | Commands::Watch { build_args } => build_args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build_with_flags() {
        let cli = Cli::try_parse_from([
            "gobinet", "build", "src", "out", "-I", "lib", "--include", "styles", "-n", "-j", "4",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Build { .. }));
        let args = cli.build_args();
        assert_eq!(args.input, PathBuf::from("src"));
        assert_eq!(args.output, PathBuf::from("out"));
        assert_eq!(args.include, vec![PathBuf::from("lib"), PathBuf::from("styles")]);
        assert_eq!(args.notify, Some(true));
        assert_eq!(args.reload, None);
        assert_eq!(args.jobs, Some(4));
    }

    #[test]
    fn test_parse_watch_alias() {
        let cli = Cli::try_parse_from(["gobinet", "w", "src", "out", "--reload"]).unwrap();
        assert!(matches!(cli.command, Commands::Watch { .. }));
        assert_eq!(cli.build_args().reload, Some(true));
    }

    #[test]
    fn test_missing_positionals_rejected() {
        assert!(Cli::try_parse_from(["gobinet", "build", "src"]).is_err());
        assert!(Cli::try_parse_from(["gobinet", "rebuild", "src", "out"]).is_err());
    }
}
