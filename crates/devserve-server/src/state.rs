//! Application state.
//!
//! Shared state for all request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use crate::live_reload::ChannelRegistry;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Canonical root directory being served.
    pub(crate) root_dir: PathBuf,
    /// Open reload channels.
    pub(crate) registry: Arc<ChannelRegistry>,
}
