use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use sampleweb_config::{EnvConfigLoader, SiteConfig};
use sampleweb_http::{Backends, ErrorStatusPolicy, HttpServer};

const IN_MEMORY_STORAGE_CONFIG_PATH: &str = "https://sampleweb.blob.core.windows.net/config.json";
const IN_MEMORY_COSMOS_ENDPOINT: &str = "https://sampleweb.documents.azure.com:443/";

/// Serve the sample site.
#[derive(Parser, Debug)]
#[clap(about = "Serve the sample site")]
pub struct ServeCommand {
    /// IP address and port to listen on
    #[clap(
        long = "listen",
        env = "SAMPLEWEB_LISTEN",
        default_value = "127.0.0.1:3000"
    )]
    pub address: SocketAddr,

    /// Dotenv file consulted for variables missing from the environment
    #[clap(long = "dotenv", default_value = ".env")]
    pub dotenv: PathBuf,

    /// How failed round trips are reported: `ok` always answers 200,
    /// `status` answers with a status matching the failure
    #[clap(long = "error-status", default_value = "ok", possible_values = ["ok", "status"])]
    pub error_status: ErrorStatusPolicy,

    /// Use in-process blob and document stores instead of Azure
    #[clap(long = "in-memory")]
    pub in_memory: bool,
}

impl ServeCommand {
    pub async fn run(self) -> Result<()> {
        let loader = EnvConfigLoader::new(|key| std::env::var(key), Some(self.dotenv.clone()));
        let mut config = loader.load().context("Failed to load site configuration")?;

        let backends = if self.in_memory {
            fill_in_memory_endpoints(&mut config);
            tracing::info!("Using in-memory blob and document stores");
            Backends::in_memory(&config)
        } else {
            Backends::azure()
        };

        let server = Arc::new(HttpServer::new(
            self.address,
            Arc::new(config),
            backends,
            self.error_status,
        ));

        tokio::select! {
            res = server.serve() => res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, shutting down");
                Ok(())
            }
        }
    }
}

/// The in-memory stores accept any endpoint but the round trips still need one.
fn fill_in_memory_endpoints(config: &mut SiteConfig) {
    if config.storage_config_path.as_deref().unwrap_or_default().is_empty() {
        config.storage_config_path = Some(IN_MEMORY_STORAGE_CONFIG_PATH.to_owned());
    }
    if config.cosmos_endpoint.as_deref().unwrap_or_default().is_empty() {
        config.cosmos_endpoint = Some(IN_MEMORY_COSMOS_ENDPOINT.to_owned());
    }
}
