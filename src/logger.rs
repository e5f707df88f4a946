//! Terminal output.
//!
//! Every entry is `[module] message`, with the prefix colored by module:
//!
//! ```ignore
//! log!("build"; "processing `{}`", input.display());
//! debug!("watch"; "raw notify: {:?}", event.kind);   // only with --verbose
//! ```
//!
//! Pipelines of different files run concurrently, so an entry (including any
//! multi-line tool output attached to it) is written under one stdout lock.

use std::io::{Write, stdout};
use std::sync::atomic::{AtomicBool, Ordering};

use owo_colors::OwoColorize;

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Enable or disable `debug!` output.
pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// `log!("module"; "format {}", args)`
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {
        $crate::logger::log($module, &format!($($arg)*))
    };
}

/// Like [`log!`], but silent unless verbose mode is on.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*));
        }
    };
}

/// Write one entry. Output errors (closed stdout) are ignored.
pub fn log(module: &str, message: &str) {
    let entry = format_line(module, message);

    let mut out = stdout().lock();
    let _ = writeln!(out, "{entry}");
    let _ = out.flush();
}

/// Captured tool output usually ends in blank lines; they are dropped.
fn format_line(module: &str, message: &str) -> String {
    format!("{} {}", prefix(module), message.trim_end())
}

fn prefix(module: &str) -> String {
    let tag = format!("[{module}]");
    let colored = match module.to_ascii_lowercase().as_str() {
        "build" => tag.bright_blue().to_string(),
        "watch" => tag.bright_green().to_string(),
        "error" => tag.bright_red().to_string(),
        "notify" => tag.bright_magenta().to_string(),
        _ => tag.bright_yellow().to_string(),
    };
    colored.bold().to_string()
}
