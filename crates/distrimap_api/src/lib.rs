//! HTTP boundary for the distributeur directory.
//!
//! # Responsibility
//! - Expose the directory over a JSON REST API.
//! - Validate untrusted query strings and bodies before they reach core.
//!
//! # Invariants
//! - Handlers never panic; every failure is a JSON envelope with a status.
//! - Store work never runs on async worker threads.

pub mod auth;
pub mod config;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod params;
pub mod payload;
pub mod router;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use envelope::Envelope;
pub use error::{ApiError, ApiResult};
pub use router::build_router;
pub use state::AppState;
