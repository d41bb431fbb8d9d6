//! Live reload: reload channels, their registry, and the file watcher that
//! drives broadcasts.

mod registry;
mod watcher;
mod websocket;

pub use registry::{
    BroadcastReport, ChannelId, ChannelRegistry, NoticeReceiver, RELOAD_MESSAGE, ReloadNotice,
};
pub(crate) use watcher::ReloadWatcher;
pub(crate) use websocket::ws_handler;
