//! Registry of open reload channels.
//!
//! Every connected browser tab owns one channel. The registry keeps the
//! sending half of a per-channel queue; the WebSocket task that owns the
//! socket drains the receiving half. Broadcasting therefore never touches a
//! socket and never awaits.
//!
//! A queue holds at most one pending notice. Reloading is idempotent, so a
//! notice arriving while one is still pending is folded into it.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

/// Text payload pushed to browsers on every change.
pub const RELOAD_MESSAGE: &str = "reload";

/// Opaque identity of a reload channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelId(Uuid);

impl ChannelId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Notices a channel can hold before further ones are folded in.
const NOTICE_QUEUE_CAPACITY: usize = 1;

/// A request for the browser to reload the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReloadNotice;

/// Receiving half of a registered channel.
pub type NoticeReceiver = mpsc::Receiver<ReloadNotice>;

/// Per-channel outcome of a broadcast.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Channels the notice was queued for, or that already had one pending.
    pub delivered: Vec<ChannelId>,
    /// Channels whose receiver was gone. They are no longer registered.
    pub failed: Vec<ChannelId>,
}

/// Set of currently open reload channels.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: Mutex<HashMap<ChannelId, mpsc::Sender<ReloadNotice>>>,
}

impl ChannelRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new channel and return its identity and notice queue.
    pub fn register(&self) -> (ChannelId, NoticeReceiver) {
        let (tx, rx) = mpsc::channel(NOTICE_QUEUE_CAPACITY);
        let id = ChannelId::new();
        self.channels().insert(id, tx);
        (id, rx)
    }

    /// Remove a channel. Removing an absent channel is a no-op.
    ///
    /// Returns `true` if the channel was registered.
    pub fn unregister(&self, id: ChannelId) -> bool {
        self.channels().remove(&id).is_some()
    }

    /// Queue a reload notice for every registered channel.
    ///
    /// A channel whose receiver has been dropped fails independently of the
    /// others and is removed before this returns.
    pub fn broadcast(&self) -> BroadcastReport {
        let mut channels = self.channels();
        let mut report = BroadcastReport::default();

        for (id, tx) in channels.iter() {
            match tx.try_send(ReloadNotice) {
                Ok(()) | Err(TrySendError::Full(_)) => report.delivered.push(*id),
                Err(TrySendError::Closed(_)) => report.failed.push(*id),
            }
        }

        for id in &report.failed {
            channels.remove(id);
        }

        report
    }

    /// Number of registered channels.
    pub fn len(&self) -> usize {
        self.channels().len()
    }

    /// Whether no channel is registered.
    pub fn is_empty(&self) -> bool {
        self.channels().is_empty()
    }

    // A panic while holding the lock cannot leave the map half-updated, so
    // a poisoned lock is still usable.
    fn channels(&self) -> MutexGuard<'_, HashMap<ChannelId, mpsc::Sender<ReloadNotice>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
