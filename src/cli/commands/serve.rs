//! Serve command implementation
//!
//! Runs the HTTP trigger until Ctrl+C or SIGTERM. A sweep that is in flight
//! when the signal arrives finishes before the process exits.

use crate::config::SweepConfig;
use crate::core::sweep::SweepOrchestrator;
use crate::server::{start_server, AppState};
use clap::Args;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override the listen address (host:port)
    #[arg(long)]
    pub bind: Option<String>,
}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(
        &self,
        config: &SweepConfig,
        mut shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let addr: SocketAddr = match &self.bind {
            Some(bind) => bind.parse()?,
            None => config.server.socket_addr().map_err(anyhow::Error::msg)?,
        };

        let orchestrator = match SweepOrchestrator::from_config(config) {
            Ok(o) => Arc::new(o),
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize sweep");
                eprintln!("Failed to initialize sweep: {e}");
                return Ok(2);
            }
        };

        let shutdown = async move {
            // A dropped sender also means shutdown
            let _ = shutdown_signal.wait_for(|stop| *stop).await;
        };

        start_server(addr, AppState::new(orchestrator), shutdown).await?;
        Ok(0)
    }
}
