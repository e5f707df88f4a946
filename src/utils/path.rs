//! Path normalization.

use std::path::{Component, Path, PathBuf};

/// Normalize a path to a clean absolute form, without touching the disk.
///
/// Relative paths are joined onto the current directory, `.` components are
/// dropped and `..` pops the previous component (never past the root).
/// Symlinks are left alone, so the result is the same whether or not the
/// path exists yet.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    let mut clean = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(clean.components().next_back(), Some(Component::Normal(_))) {
                    clean.pop();
                } else if !clean.has_root() {
                    clean.push("..");
                }
            }
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                clean.push(component.as_os_str());
            }
        }
    }
    clean
}
