//! Query-string parameters and their validation.
//!
//! # Responsibility
//! - Turn raw query strings into validated core requests.
//!
//! # Invariants
//! - A reference point exists only when both `lat` and `lng` are supplied.
//! - Blank values behave as if the parameter was absent.
//! - `limit` never exceeds `ServerConfig::max_limit`.

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use distrimap_core::{
    Coordinates, DistributeurListQuery, DistributeurStatus, ListingRequest, ProximityQuery,
};
use serde::Deserialize;
use std::str::FromStr;

/// Raw query for `GET /api/distributeurs`.
///
/// Everything stays a string so malformed numbers surface as a JSON 400
/// instead of the extractor's plain-text rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingParams {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub radius: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub ville: Option<String>,
    pub q: Option<String>,
    pub statut: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl ListingParams {
    /// Validates parameters against `config`.
    ///
    /// # Errors
    /// - `BadRequest` for malformed numbers, out-of-range coordinates, a lone
    ///   `lat`/`lng`, a negative radius, `limit=0` or an unknown `statut`.
    pub fn into_request(self, config: &ServerConfig) -> ApiResult<ListingRequest> {
        let proximity = match reference_point(self.lat.as_deref(), self.lng.as_deref())? {
            Some(reference) => Some(ProximityQuery::new(
                reference,
                Some(radius_km(self.radius.as_deref(), config)?),
            )),
            // `radius` means nothing without a reference point.
            None => None,
        };

        let filter = DistributeurListQuery {
            kind: non_blank(self.kind),
            ville: non_blank(self.ville),
            text: non_blank(self.q),
            statut: parse_statut(self.statut.as_deref())?,
            limit: Some(page_limit(self.limit.as_deref(), config)?),
            offset: parse_optional::<u32>("offset", self.offset.as_deref())?.unwrap_or(0),
        };

        Ok(ListingRequest { filter, proximity })
    }
}

/// Raw query for `GET /api/distributeurs/nearest`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NearestParams {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub limit: Option<String>,
}

/// Validated nearest-neighbour lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestRequest {
    pub reference: Coordinates,
    pub limit: usize,
}

impl NearestParams {
    /// # Errors
    /// - `BadRequest` when `lat`/`lng` are missing or invalid, or `limit=0`.
    pub fn into_request(self, config: &ServerConfig) -> ApiResult<NearestRequest> {
        let reference = reference_point(self.lat.as_deref(), self.lng.as_deref())?
            .ok_or_else(|| ApiError::bad_request("lat and lng are required"))?;
        let limit = page_limit(self.limit.as_deref(), config)?;
        Ok(NearestRequest {
            reference,
            limit: usize::try_from(limit).unwrap_or(usize::MAX),
        })
    }
}

fn reference_point(lat: Option<&str>, lng: Option<&str>) -> ApiResult<Option<Coordinates>> {
    let lat = parse_optional::<f64>("lat", lat)?;
    let lng = parse_optional::<f64>("lng", lng)?;
    let (latitude, longitude) = match (lat, lng) {
        (None, None) => return Ok(None),
        (Some(latitude), Some(longitude)) => (latitude, longitude),
        _ => {
            return Err(ApiError::bad_request(
                "lat and lng must be supplied together",
            ))
        }
    };

    let reference = Coordinates::new(latitude, longitude);
    if !reference.is_valid() {
        return Err(ApiError::bad_request(format!(
            "coordinates ({latitude}, {longitude}) are outside WGS84 bounds"
        )));
    }
    Ok(Some(reference))
}

fn radius_km(raw: Option<&str>, config: &ServerConfig) -> ApiResult<f64> {
    match parse_optional::<f64>("radius", raw)? {
        None => Ok(config.default_radius_km),
        Some(radius) if radius.is_finite() && radius >= 0.0 => Ok(radius),
        Some(_) => Err(ApiError::bad_request(
            "radius must be a finite, non-negative number of km",
        )),
    }
}

fn page_limit(raw: Option<&str>, config: &ServerConfig) -> ApiResult<u32> {
    match parse_optional::<u32>("limit", raw)? {
        None => Ok(config.default_limit.min(config.max_limit)),
        Some(0) => Err(ApiError::bad_request("limit must be at least 1")),
        Some(limit) => Ok(limit.min(config.max_limit)),
    }
}

fn parse_statut(raw: Option<&str>) -> ApiResult<Option<DistributeurStatus>> {
    let Some(raw) = raw.filter(|value| !value.trim().is_empty()) else {
        return Ok(None);
    };
    DistributeurStatus::parse(raw).map(Some).ok_or_else(|| {
        ApiError::bad_request(format!(
            "unknown statut `{}`; expected actif|inactif|maintenance",
            raw.trim()
        ))
    })
}

fn parse_optional<T: FromStr>(name: &str, raw: Option<&str>) -> ApiResult<Option<T>> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<T>()
        .map(Some)
        .map_err(|_| ApiError::bad_request(format!("{name} must be a number, got `{raw}`")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{ListingParams, NearestParams};
    use crate::config::ServerConfig;
    use crate::error::ApiError;
    use distrimap_core::{Coordinates, DistributeurStatus};

    fn params(pairs: &[(&str, &str)]) -> ListingParams {
        let mut params = ListingParams::default();
        for (key, value) in pairs {
            let value = Some((*value).to_string());
            match *key {
                "lat" => params.lat = value,
                "lng" => params.lng = value,
                "radius" => params.radius = value,
                "type" => params.kind = value,
                "ville" => params.ville = value,
                "q" => params.q = value,
                "statut" => params.statut = value,
                "limit" => params.limit = value,
                "offset" => params.offset = value,
                other => panic!("unexpected key {other}"),
            }
        }
        params
    }

    fn is_bad_request(result: Result<impl std::fmt::Debug, ApiError>) -> bool {
        matches!(result, Err(ApiError::BadRequest(_)))
    }

    #[test]
    fn empty_query_uses_defaults() {
        let config = ServerConfig::default();
        let request = ListingParams::default().into_request(&config).unwrap();
        assert!(request.proximity.is_none());
        assert_eq!(request.filter.limit, Some(config.default_limit));
        assert_eq!(request.filter.offset, 0);
        assert!(request.filter.kind.is_none());
    }

    #[test]
    fn location_defines_proximity_with_default_radius() {
        let config = ServerConfig::default();
        let request = params(&[("lat", "4.0511"), ("lng", "9.7679")])
            .into_request(&config)
            .unwrap();
        let proximity = request.proximity.unwrap();
        assert_eq!(proximity.reference, Coordinates::new(4.0511, 9.7679));
        assert_eq!(proximity.radius_km, 5.0);
    }

    #[test]
    fn radius_without_location_is_ignored() {
        for radius in ["12", "-1", "abc", "inf"] {
            let request = params(&[("radius", radius)])
                .into_request(&ServerConfig::default())
                .unwrap_or_else(|err| panic!("radius={radius} should be ignored: {err}"));
            assert!(request.proximity.is_none(), "radius={radius}");
        }
    }

    #[test]
    fn filters_are_trimmed_and_blank_ones_dropped() {
        let request = params(&[
            ("type", " billets "),
            ("ville", ""),
            ("q", "  "),
            ("statut", "Maintenance"),
            ("offset", "40"),
        ])
        .into_request(&ServerConfig::default())
        .unwrap();
        assert_eq!(request.filter.kind.as_deref(), Some("billets"));
        assert!(request.filter.ville.is_none());
        assert!(request.filter.text.is_none());
        assert_eq!(request.filter.statut, Some(DistributeurStatus::Maintenance));
        assert_eq!(request.filter.offset, 40);
    }

    #[test]
    fn limit_is_clamped_and_zero_rejected() {
        let config = ServerConfig::default();
        let request = params(&[("limit", "5000")]).into_request(&config).unwrap();
        assert_eq!(request.filter.limit, Some(config.max_limit));
        assert!(is_bad_request(
            params(&[("limit", "0")]).into_request(&config)
        ));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let config = ServerConfig::default();
        for pairs in [
            &[("lat", "4.05")][..],
            &[("lng", "9.76")][..],
            &[("lat", "abc"), ("lng", "9.76")][..],
            &[("lat", "91"), ("lng", "9.76")][..],
            &[("lat", "4.05"), ("lng", "181")][..],
            &[("lat", "NaN"), ("lng", "9.76")][..],
            &[("lat", "4.05"), ("lng", "9.76"), ("radius", "-1")][..],
            &[("lat", "4.05"), ("lng", "9.76"), ("radius", "inf")][..],
            &[("statut", "ferme")][..],
            &[("offset", "-3")][..],
        ] {
            assert!(
                is_bad_request(params(pairs).into_request(&config)),
                "{pairs:?} should be rejected"
            );
        }
    }

    #[test]
    fn nearest_requires_location() {
        let config = ServerConfig::default();
        assert!(is_bad_request(NearestParams::default().into_request(&config)));

        let request = NearestParams {
            lat: Some("3.848".to_string()),
            lng: Some("11.5021".to_string()),
            limit: Some("3".to_string()),
        }
        .into_request(&config)
        .unwrap();
        assert_eq!(request.limit, 3);
    }
}
