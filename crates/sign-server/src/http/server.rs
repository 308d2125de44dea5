//! HTTP/1 accept loop with graceful drain.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use super::routes::{AppState, route};
use crate::shutdown::ShutdownSignal;

/// How long open connections get to finish after shutdown is requested
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SignServer {
    address: String,
    state: AppState,
}

impl SignServer {
    pub fn new(address: impl Into<String>, state: AppState) -> Self {
        Self {
            address: address.into(),
            state,
        }
    }

    /// Bind the configured address and serve until `shutdown` fires.
    pub async fn run(self, shutdown: Arc<ShutdownSignal>) -> Result<()> {
        let listener = TcpListener::bind(&self.address)
            .await
            .with_context(|| format!("Failed to bind {}", self.address))?;
        info!("Listening on http://{}", listener.local_addr()?);
        self.serve(listener, shutdown).await
    }

    /// Serve on an already-bound listener.
    ///
    /// Returns after every accepted connection has finished or
    /// [`DRAIN_TIMEOUT`] has passed, whichever comes first.
    pub async fn serve(self, listener: TcpListener, shutdown: Arc<ShutdownSignal>) -> Result<()> {
        let graceful = GracefulShutdown::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!("New connection from {}", peer);
                        let state = self.state.clone();
                        let service = service_fn(move |req| {
                            let state = state.clone();
                            async move { Ok::<_, Infallible>(route(&state, req).await) }
                        });
                        let connection = http1::Builder::new()
                            .serve_connection(TokioIo::new(stream), service);
                        let connection = graceful.watch(connection);
                        tokio::spawn(async move {
                            if let Err(e) = connection.await {
                                debug!("Connection from {} ended with error: {}", peer, e);
                            }
                        });
                    }
                    Err(e) => error!("Failed to accept connection: {}", e),
                },
                _ = shutdown.wait() => {
                    info!("Stopping HTTP listener...");
                    break;
                }
            }
        }

        drop(listener);

        tokio::select! {
            _ = graceful.shutdown() => info!("All connections closed"),
            _ = tokio::time::sleep(DRAIN_TIMEOUT) => {
                warn!("Connections still open after {:?}, giving up", DRAIN_TIMEOUT);
            }
        }
        Ok(())
    }
}
