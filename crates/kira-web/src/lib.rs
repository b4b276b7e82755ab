//! kira-web – axum plumbing shared by `kira-server` and `kira-speech`.
//!
//! Error-to-response mapping, the request trace and CORS layers, the health
//! route, subscriber setup and graceful shutdown all live here so both
//! services behave identically at the HTTP edge.

pub mod env;
pub mod error;
pub mod health;
pub mod middleware;
pub mod shutdown;
pub mod telemetry;

pub use error::ServerError;
pub use shutdown::shutdown_signal;
