//! Core domain logic for the distributeur directory.
//! This crate is the single source of truth for proximity ranking and
//! directory invariants.

pub mod db;
pub mod geo;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use geo::{distance_km, filter_by_radius, nearest, Coordinates, Located, ProximityResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::distributeur::{
    Distributeur, DistributeurId, DistributeurImage, DistributeurStatus,
    DistributeurValidationError,
};
pub use repo::distributeur_repo::{
    DirectoryStats, DistributeurListQuery, DistributeurRepository, RepoError, RepoResult,
    SqliteDistributeurRepository,
};
pub use service::directory_service::{
    DirectoryService, ListedDistributeur, ListingRequest, ProximityQuery, DEFAULT_RADIUS_KM,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
