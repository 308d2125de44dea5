//! Serve command implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sign_core::{AppSettings, Lifecycle, SignService};
use tracing::{info, warn};

use crate::banner;
use crate::http::{AppState, SignServer};
use crate::shutdown::{ShutdownSignal, listen_for_signals};

/// How long to wait for abandoned signing calls before giving up on unload
const RELEASE_ATTEMPTS: u32 = 50;
const RELEASE_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on runtime teardown once the server has stopped
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Run the serve command
pub fn run(settings: &AppSettings) -> Result<()> {
    banner::print();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build async runtime")?;

    let result = runtime.block_on(serve(settings));
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    result
}

async fn serve(settings: &AppSettings) -> Result<()> {
    let config = &settings.sign_service;
    info!("Sign Server starting...");

    let mut service = SignService::new(config);
    service
        .start()
        .context("Signing service failed to start")?;

    let service = Arc::new(service);
    let shutdown = Arc::new(ShutdownSignal::new());
    tokio::spawn(listen_for_signals(Arc::clone(&shutdown)));

    let address = config.bind_address();
    info!("Service will listen on {}", address);

    let state = AppState::new(Arc::clone(&service), config.timeout());
    let result = SignServer::new(address, state).run(shutdown).await;

    release(service, RELEASE_ATTEMPTS).await;
    result
}

/// Regain sole ownership of the service and stop it.
///
/// Signing calls that outlived their request still hold a reference; they
/// are given a short grace period. Returns whether the service was stopped.
async fn release(mut service: Arc<SignService>, attempts: u32) -> bool {
    for attempt in 0..attempts {
        match Arc::try_unwrap(service) {
            Ok(mut owned) => {
                owned.stop();
                return true;
            }
            Err(shared) => {
                service = shared;
                if attempt + 1 < attempts {
                    tokio::time::sleep(RELEASE_INTERVAL).await;
                }
            }
        }
    }
    warn!("Signing calls still in flight, leaving the module loaded");
    false
}
