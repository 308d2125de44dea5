//! HTTP front end for the signing service.

mod routes;
mod server;
mod types;

pub use routes::AppState;
pub use server::SignServer;
