//! Server configuration.
//!
//! # Responsibility
//! - Hold every runtime knob the HTTP layer needs in one validated value.
//!
//! # Invariants
//! - A validated config has a finite non-negative default radius.
//! - `1 <= default_limit <= max_limit`.
//! - `admin_token`, when present, is non-blank.

use distrimap_core::DEFAULT_RADIUS_KM;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DB_FILE_NAME: &str = "distrimap.sqlite3";
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    /// Shared secret for admin routes; `None` disables them.
    pub admin_token: Option<String>,
    /// Radius applied to located listings that omit `radius`.
    pub default_radius_km: f64,
    /// Page size when the caller omits `limit`.
    pub default_limit: u32,
    /// Upper bound for caller-supplied `limit`.
    pub max_limit: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            admin_token: None,
            default_radius_km: DEFAULT_RADIUS_KM,
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("default radius must be a finite, non-negative number of km, got {0}")]
    InvalidRadius(f64),
    #[error("default limit {default} must be between 1 and max limit {max}")]
    InvalidLimit { default: u32, max: u32 },
    #[error("admin token must not be blank")]
    BlankAdminToken,
}

impl ServerConfig {
    /// Checks cross-field invariants before the server starts.
    ///
    /// # Errors
    /// - Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_radius_km.is_finite() || self.default_radius_km < 0.0 {
            return Err(ConfigError::InvalidRadius(self.default_radius_km));
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(ConfigError::InvalidLimit {
                default: self.default_limit,
                max: self.max_limit,
            });
        }
        if self
            .admin_token
            .as_deref()
            .is_some_and(|token| token.trim().is_empty())
        {
            return Err(ConfigError::BlankAdminToken);
        }
        Ok(())
    }

    pub fn admin_enabled(&self) -> bool {
        self.admin_token.is_some()
    }
}
