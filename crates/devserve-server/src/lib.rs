//! Static file server with live reload.
//!
//! Serves a single root directory over HTTP and pushes a reload to every
//! open browser tab whenever something under the root changes.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use devserve_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         host: "127.0.0.1".to_owned(),
//!         port: 8000,
//!         root_dir: PathBuf::from("public"),
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum router
//!    ▲                  ├─► GET /__ws ──► reload channel ◄── ChannelRegistry
//!    │                  └─► GET /*    ──► ServeDir + inject         ▲
//!    │                                                              │ broadcast
//!    └──────────── "reload" ◄────────── tokio task ◄── mpsc ◄── notify thread
//! ```

mod app;
mod error;
mod inject;
mod live_reload;
mod state;
mod static_files;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::net::TcpListener;

pub use error::ServerError;
pub use inject::{INJECTION_MARKER, RELOAD_CLIENT, RELOAD_PATH, inject_reload_client, is_html};
pub use live_reload::{
    BroadcastReport, ChannelId, ChannelRegistry, NoticeReceiver, RELOAD_MESSAGE, ReloadNotice,
};

use live_reload::ReloadWatcher;
use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on (0 picks a free port).
    pub port: u16,
    /// Directory to serve and watch.
    pub root_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
            root_dir: PathBuf::from("."),
        }
    }
}

/// A bound server with its file watcher running.
///
/// Created by [`LiveServer::bind`]; requests are handled once
/// [`LiveServer::serve`] is awaited.
pub struct LiveServer {
    listener: TcpListener,
    state: Arc<AppState>,
    _watcher: ReloadWatcher,
}

impl LiveServer {
    /// Resolve the root, start watching it, and bind the listener.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not an accessible directory, the
    /// watcher cannot start, or the address cannot be bound.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let root_dir = canonical_root(&config.root_dir).await?;
        let registry = Arc::new(ChannelRegistry::new());

        let watcher = ReloadWatcher::start(&root_dir, Arc::clone(&registry))?;

        let listener = TcpListener::bind((config.host.as_str(), config.port))
            .await
            .map_err(|source| ServerError::Bind {
                address: format!("{}:{}", config.host, config.port),
                source,
            })?;

        Ok(Self {
            listener,
            state: Arc::new(AppState { root_dir, registry }),
            _watcher: watcher,
        })
    }

    /// Address the listener is bound to.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Canonical root directory being served.
    pub fn root_dir(&self) -> &Path {
        &self.state.root_dir
    }

    /// Registry of open reload channels.
    pub fn registry(&self) -> Arc<ChannelRegistry> {
        Arc::clone(&self.state.registry)
    }

    /// Serve requests until the process is terminated.
    ///
    /// There is no graceful shutdown: open reload channels would keep it
    /// waiting forever.
    ///
    /// # Errors
    ///
    /// Returns an error if the accept loop fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let app = app::create_router(Arc::clone(&self.state));

        tracing::info!(
            address = %self.local_addr()?,
            root = %self.state.root_dir.display(),
            "Starting server"
        );

        axum::serve(self.listener, app).await?;

        Ok(())
    }
}

/// Run the server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    LiveServer::bind(config).await?.serve().await
}

/// Create server configuration from devserve config.
#[must_use]
pub fn server_config_from_config(config: &devserve_config::Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        root_dir: config.root_dir.clone(),
    }
}

/// Canonicalize `root` and require it to be a directory.
async fn canonical_root(root: &Path) -> Result<PathBuf, ServerError> {
    let root_error = |source| ServerError::RootDir {
        path: root.to_path_buf(),
        source,
    };

    let canonical = tokio::fs::canonicalize(root).await.map_err(root_error)?;
    let meta = tokio::fs::metadata(&canonical).await.map_err(root_error)?;
    if !meta.is_dir() {
        return Err(root_error(std::io::Error::other("not a directory")));
    }

    Ok(canonical)
}
