//! Geospatial helpers for proximity search.
//!
//! # Responsibility
//! - Own the single great-circle distance implementation used by every
//!   listing path.
//! - Rank located entities around a reference point.
//!
//! # Invariants
//! - Distances are computed with the haversine formula on a sphere of
//!   radius [`EARTH_RADIUS_KM`].
//! - Proximity passes are pure; no state survives between calls.

pub mod proximity;

pub use proximity::{
    distance_km, filter_by_radius, nearest, Coordinates, Located, ProximityResult,
    EARTH_RADIUS_KM,
};
