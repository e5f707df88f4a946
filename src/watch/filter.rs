//! Which filesystem events request a rebuild.

use std::path::PathBuf;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};

use crate::compiler::is_source_file;

/// Source paths touched by a write, create or rename-to event.
///
/// Removals, access and metadata-only changes (mtime, chmod) yield nothing.
pub fn rebuild_targets(event: &Event) -> Vec<PathBuf> {
    let paths: &[PathBuf] = match event.kind {
        EventKind::Create(_)
        | EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any)
        | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => &event.paths,
        // [from, to]: only the destination exists afterwards.
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.last() {
            Some(to) => std::slice::from_ref(to),
            None => &[],
        },
        _ => &[],
    };

    paths
        .iter()
        .filter(|path| is_source_file(path))
        .cloned()
        .collect()
}
