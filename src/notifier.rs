//! Failure notification sinks.
//!
//! The pipeline reports failures through a [`Notifier`] injected via its
//! build context. Three sinks exist:
//!
//! | Sink               | Effect                                         |
//! |--------------------|------------------------------------------------|
//! | `DesktopNotifier`  | runs the configured notifier (`notify-send`)   |
//! | `WriterNotifier`   | writes one line per message to a stream        |
//! | `NoopNotifier`     | drops the message                              |
//!
//! A notifier never fails the build: delivery errors are logged and dropped.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::BuildConfig;
use crate::log;
use crate::utils::exec::Cmd;

/// Capability to surface a short failure summary to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Sink selected by the `notify` setting.
pub fn notifier_for(config: &BuildConfig) -> Arc<dyn Notifier> {
    if config.notify {
        Arc::new(DesktopNotifier::new(
            config.tools.notifier.clone(),
            config.tools.notify_title.clone(),
        ))
    } else {
        Arc::new(NoopNotifier)
    }
}

/// Desktop notification via an external command: `<command> <title> <message>`.
pub struct DesktopNotifier {
    command: Vec<String>,
    title: String,
}

impl DesktopNotifier {
    pub fn new(command: Vec<String>, title: String) -> Self {
        Self { command, title }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, message: &str) {
        let result = Cmd::from_slice(&self.command)
            .arg(&self.title)
            .arg(message)
            .run();

        if let Err(e) = result {
            log!("notify"; "error sending notification: {e}\n{}", e.output());
        }
    }
}

/// Writes each message on its own line to the wrapped stream.
pub struct WriterNotifier<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterNotifier<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> Notifier for WriterNotifier<W> {
    fn notify(&self, message: &str) {
        let mut writer = self.writer.lock();
        if let Err(e) = writeln!(writer, "{message}").and_then(|()| writer.flush()) {
            log!("notify"; "error sending notification: {e}");
        }
    }
}

/// Notifications disabled.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _message: &str) {}
}
