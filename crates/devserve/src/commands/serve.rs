//! Serve command implementation.

use std::path::PathBuf;

use clap::Args;
use devserve_config::{CliSettings, Config};
use devserve_server::{LiveServer, server_config_from_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for serving a directory.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover devserve.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to serve (default: current directory).
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Host to bind to [default: 127.0.0.1].
    #[arg(long, env = "DEVSERVE_HOST")]
    host: Option<String>,

    /// Port to bind to [default: 8000].
    #[arg(short, long, env = "DEVSERVE_PORT")]
    port: Option<u16>,

    /// Enable verbose output (log every request and reload).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Load configuration, start watching, and serve until terminated.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = self.cli_settings();
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        tracing::debug!(?config, "Loaded configuration");

        if let Some(path) = &config.config_path {
            output.info(&format!("Config: {}", path.display()));
        }

        let server = LiveServer::bind(server_config_from_config(&config)).await?;

        output.info(&format!("Serving {}", server.root_dir().display()));
        output.highlight(&format!(
            "Live server running at http://{}",
            server.local_addr()?
        ));

        server.serve().await?;

        Ok(())
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            host: self.host.clone(),
            port: self.port,
            root: self.root.clone(),
        }
    }
}
