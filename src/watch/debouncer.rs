//! Per-path debouncing with last-write-wins coalescing.
//!
//! Each pending path owns a timer thread and a reset channel in the shared
//! table. An event for a pending path resets its timer to the full window;
//! an event for an idle path starts a new one. When the window passes
//! without a reset, the timer removes its own entry and dispatches.
//!
//! Reset and expiry both happen under the table lock: a reset sent before the
//! timer takes the lock is seen by the timer, and an event arriving after the
//! entry is gone starts a fresh timer. No event is lost or dispatched twice.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::{debug, log};

/// Work run once a path has settled.
pub type Dispatch = Arc<dyn Fn(PathBuf) + Send + Sync>;

type TimerTable = Arc<Mutex<FxHashMap<PathBuf, Sender<()>>>>;

pub struct Debouncer {
    window: Duration,
    timers: TimerTable,
    dispatch: Dispatch,
}

impl Debouncer {
    pub fn new(window: Duration, dispatch: Dispatch) -> Self {
        Self {
            window,
            timers: Arc::default(),
            dispatch,
        }
    }

    /// Record a change of `path`.
    pub fn trigger(&self, path: PathBuf) {
        let mut timers = self.timers.lock();

        if let Some(reset) = timers.get(&path)
            && reset.send(()).is_ok()
        {
            debug!("watch"; "reset timer for `{}`", path.display());
            return;
        }

        let (reset_tx, reset_rx) = channel::unbounded();
        let timer = Timer {
            path: path.clone(),
            reset: reset_rx,
            window: self.window,
            timers: Arc::clone(&self.timers),
            dispatch: Arc::clone(&self.dispatch),
        };

        let spawned = thread::Builder::new()
            .name("gobinet-debounce".into())
            .spawn(move || timer.run());

        match spawned {
            Ok(_) => {
                timers.insert(path, reset_tx);
            }
            Err(e) => log!("error"; "failed to start timer for `{}`: {e}", path.display()),
        }
    }

    /// Number of paths waiting for their window to pass.
    pub fn pending(&self) -> usize {
        self.timers.lock().len()
    }
}

struct Timer {
    path: PathBuf,
    reset: Receiver<()>,
    window: Duration,
    timers: TimerTable,
    dispatch: Dispatch,
}

impl Timer {
    fn run(self) {
        loop {
            match self.reset.recv_timeout(self.window) {
                Ok(()) => continue,
                Err(RecvTimeoutError::Timeout) => {
                    let mut timers = self.timers.lock();
                    // A reset raced the timeout: start the window over.
                    if !self.reset.is_empty() {
                        continue;
                    }
                    timers.remove(&self.path);
                    break;
                }
                // Entry dropped without dispatch.
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }

        (self.dispatch)(self.path);
    }
}
