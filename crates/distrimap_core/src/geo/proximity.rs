//! Haversine distance, radius filtering and distance ranking.
//!
//! # Responsibility
//! - Compute great-circle distances between two coordinate pairs.
//! - Filter a materialized entity list by an inclusive radius and rank the
//!   survivors by ascending distance.
//!
//! # Invariants
//! - `distance_km(a, a) == 0` and `distance_km(a, b) == distance_km(b, a)`.
//! - Non-finite input propagates as NaN; it is never clamped to zero.
//! - Ranking is a stable sort: equal distances keep input order.
//! - Without a reference point the input passes through untouched.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns whether both components are finite and inside WGS84 bounds.
    ///
    /// Distance computation itself never calls this; callers at the input
    /// boundary do.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Anything with a fixed position that can be ranked by distance.
pub trait Located {
    fn coordinates(&self) -> Coordinates;
}

impl Located for Coordinates {
    fn coordinates(&self) -> Coordinates {
        *self
    }
}

/// One entity produced by a proximity pass.
///
/// Serializes as the entity's own fields plus `distance` (kilometers) when a
/// distance was computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProximityResult<T> {
    #[serde(flatten)]
    pub entity: T,
    #[serde(rename = "distance", skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl<T> ProximityResult<T> {
    /// Wraps an entity that was not ranked (no reference point).
    pub fn unranked(entity: T) -> Self {
        Self {
            entity,
            distance_km: None,
        }
    }

    /// Wraps an entity with its computed distance.
    pub fn ranked(entity: T, distance_km: f64) -> Self {
        Self {
            entity,
            distance_km: Some(distance_km),
        }
    }
}

/// Great-circle distance in kilometers between two points.
///
/// No range validation is applied. NaN or infinite components yield NaN.
pub fn distance_km(from: Coordinates, to: Coordinates) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lng = (to.longitude - from.longitude).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos()
            * to.latitude.to_radians().cos()
            * (d_lng / 2.0).sin().powi(2);
    // Rounding can push `a` just past 1 for antipodal points. `clamp` keeps NaN.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Keeps entities within `radius_km` of `reference` (inclusive), sorted by
/// ascending distance.
///
/// When `reference` is `None` every entity is returned in input order with
/// no distance attached.
///
/// Entities whose distance is NaN never satisfy the inclusive comparison and
/// are therefore dropped.
pub fn filter_by_radius<T: Located>(
    entities: Vec<T>,
    reference: Option<Coordinates>,
    radius_km: f64,
) -> Vec<ProximityResult<T>> {
    let Some(reference) = reference else {
        return entities.into_iter().map(ProximityResult::unranked).collect();
    };

    let ranked = entities
        .into_iter()
        .filter_map(|entity| {
            let distance = distance_km(reference, entity.coordinates());
            (distance <= radius_km).then_some((distance, entity))
        })
        .collect();

    sort_ranked(ranked)
}

/// Returns up to `limit` entities closest to `reference`, without a radius.
pub fn nearest<T: Located>(
    entities: Vec<T>,
    reference: Coordinates,
    limit: usize,
) -> Vec<ProximityResult<T>> {
    let ranked = entities
        .into_iter()
        .filter_map(|entity| {
            let distance = distance_km(reference, entity.coordinates());
            (!distance.is_nan()).then_some((distance, entity))
        })
        .collect();

    let mut results = sort_ranked(ranked);
    results.truncate(limit);
    results
}

fn sort_ranked<T>(mut ranked: Vec<(f64, T)>) -> Vec<ProximityResult<T>> {
    // `sort_by` is stable, which keeps input order on exact ties.
    ranked.sort_by(|(left, _), (right, _)| left.total_cmp(right));
    ranked
        .into_iter()
        .map(|(distance, entity)| ProximityResult::ranked(entity, distance))
        .collect()
}
