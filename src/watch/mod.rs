//! Watch mode: rebuild sources as they change.
//!
//! ```text
//! notify ──┬─ events ─→ filter ─→ Debouncer ─(settled)─→ pipeline
//!          └─ errors ─→ log
//! ```
//!
//! The event loop and debouncer are independent of the real watcher; the
//! `watch` command wires them to `notify`.

mod debouncer;
mod filter;


pub use debouncer::Debouncer;
pub use filter::rebuild_targets;

use std::path::PathBuf;

use crossbeam::channel::{self, Receiver};
use crossbeam::select;
use notify::Event;

use crate::compiler::{BuildContext, SourceFile};
use crate::{debug, log};

enum Next {
    Event(Event),
    Error(notify::Error),
    EventsClosed,
    ErrorsClosed,
}

/// Consume watcher output until both channels are closed.
///
/// Watcher errors are logged and never end the loop.
pub fn run_event_loop(
    mut events: Receiver<Event>,
    mut errors: Receiver<notify::Error>,
    debouncer: &Debouncer,
) {
    let mut open = 2;

    while open > 0 {
        let next = select! {
            recv(events) -> msg => msg.map_or(Next::EventsClosed, Next::Event),
            recv(errors) -> msg => msg.map_or(Next::ErrorsClosed, Next::Error),
        };

        match next {
            Next::Event(event) => {
                debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);
                for path in rebuild_targets(&event) {
                    debouncer.trigger(path);
                }
            }
            Next::Error(err) => log!("error"; "watcher: {err}"),
            Next::EventsClosed => {
                events = channel::never();
                open -= 1;
            }
            Next::ErrorsClosed => {
                errors = channel::never();
                open -= 1;
            }
        }
    }

    debug!("watch"; "watcher closed");
}

/// Dispatch target: one pipeline run for a settled path.
pub fn rebuild(path: PathBuf, ctx: &BuildContext) {
    let Some(file) = SourceFile::new(&path, &ctx.config) else {
        debug!("watch"; "ignoring `{}`: outside the input directory", path.display());
        return;
    };

    log!("watch"; "source `{}` updated", path.display());
    // Failures are logged and notified by the pipeline itself.
    let _ = file.generate(ctx);
}
