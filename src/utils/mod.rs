//! Utility modules shared by the build and watch commands.

pub mod exec;
pub mod path;

pub use path::normalize_path;

/// `"1 file"`, `"3 files"`.
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}
