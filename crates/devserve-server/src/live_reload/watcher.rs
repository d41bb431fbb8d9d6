//! Filesystem watcher that triggers reload broadcasts.
//!
//! notify delivers events on its own thread. Each event is handed to the
//! tokio runtime through a bounded channel and broadcast from a task there,
//! so the registry is only ever driven from the runtime.

use std::path::Path;
use std::sync::Arc;

use notify::event::{AccessKind, AccessMode, MetadataKind, ModifyKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::registry::ChannelRegistry;

/// Capacity of the hand-off queue between the notify thread and the runtime.
const EVENT_QUEUE_CAPACITY: usize = 100;

/// Watches the served root and broadcasts a reload for every change.
///
/// Watching stops when this value is dropped.
pub(crate) struct ReloadWatcher {
    _watcher: RecommendedWatcher,
}

impl ReloadWatcher {
    /// Start watching `root` recursively.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher cannot be created or `root` cannot be
    /// watched.
    pub(crate) fn start(root: &Path, registry: Arc<ChannelRegistry>) -> Result<Self, notify::Error> {
        let (tx, mut rx) = mpsc::channel::<Event>(EVENT_QUEUE_CAPACITY);

        let mut watcher =
            notify::recommended_watcher(move |res: Result<Event, notify::Error>| forward(res, &tx))?;

        watcher.watch(root, RecursiveMode::Recursive)?;

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let report = registry.broadcast();
                tracing::info!(
                    paths = ?event.paths,
                    kind = ?event.kind,
                    delivered = report.delivered.len(),
                    failed = report.failed.len(),
                    "Broadcast reload"
                );
            }
        });

        tracing::debug!(root = %root.display(), "Watching for changes");

        Ok(Self { _watcher: watcher })
    }
}

/// Pass a change event on to the broadcast task.
///
/// Runs on the notify thread, outside the runtime.
fn forward(res: Result<Event, notify::Error>, tx: &mpsc::Sender<Event>) {
    match res {
        Ok(event) if is_change(event.kind) => {
            let _ = tx.blocking_send(event);
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "File watcher error"),
    }
}

/// Whether an event reports a mutation of the tree.
///
/// Reads are reported by some backends as access events; serving a file
/// must not trigger a reload of the page that requested it. `Other` covers
/// backend notices such as a queue overflow (flagged `Rescan`), where
/// changes may have been lost.
fn is_change(kind: EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Any | EventKind::Other => true,
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)) => false,
        EventKind::Modify(_) => true,
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => true,
        EventKind::Access(_) => false,
    }
}
