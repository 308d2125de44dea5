//! Startup/shutdown hooks for the hosting process.

use tracing::{error, info};

use crate::error::Result;
use crate::service::SignService;

/// Contract between the hosting process and a long-lived service.
///
/// `start` runs once before any request is accepted; an error is fatal to
/// startup. `stop` runs once after all requests have drained.
pub trait Lifecycle {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self);
}

impl Lifecycle for SignService {
    fn start(&mut self) -> Result<()> {
        info!("Starting signing service...");
        match self.initialize() {
            Ok(()) => {
                info!("Signing service started ({})", self.state());
                Ok(())
            }
            Err(e) => {
                error!("Signing service failed to start: {}", e);
                Err(e)
            }
        }
    }

    fn stop(&mut self) {
        info!("Stopping signing service...");
        self.unload();
        info!("Signing service stopped");
    }
}
