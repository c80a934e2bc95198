//! Distributeur domain model.
//!
//! # Responsibility
//! - Define the canonical record for a located vending/distribution point.
//! - Validate write-path invariants before any persistence happens.
//!
//! # Invariants
//! - `id` is stable and never reused for another distributeur.
//! - `latitude`/`longitude` are finite and inside WGS84 bounds.
//! - `nom`, `kind` and `ville` are never blank.
//! - Image order is defined by `position`, not by insertion order.

use crate::geo::{Coordinates, Located};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a distributeur.
pub type DistributeurId = Uuid;

/// Operational status shown on the map and used by admin filters.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DistributeurStatus {
    /// In service.
    #[default]
    Actif,
    /// Permanently or temporarily out of service.
    Inactif,
    /// Being serviced; expected back.
    Maintenance,
}

impl DistributeurStatus {
    /// Storage and query-string label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Actif => "actif",
            Self::Inactif => "inactif",
            Self::Maintenance => "maintenance",
        }
    }

    /// Parses a storage/query label (case-insensitive, surrounding spaces ignored).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "actif" => Some(Self::Actif),
            "inactif" => Some(Self::Inactif),
            "maintenance" => Some(Self::Maintenance),
            _ => None,
        }
    }
}

/// Reference to an image attached to a distributeur.
///
/// Only the URL is tracked; upload and storage live outside core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributeurImage {
    pub url: String,
    /// Zero-based display order.
    #[serde(default)]
    pub position: u32,
}

/// Canonical record for one catalogued distributeur.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distributeur {
    pub id: DistributeurId,
    pub nom: String,
    /// Serialized as `type` to match the public API naming.
    #[serde(rename = "type")]
    pub kind: String,
    pub adresse: Option<String>,
    pub ville: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub telephone: Option<String>,
    /// Free-form opening hours, e.g. `"24h/24"` or `"07:00-22:00"`.
    pub horaires: Option<String>,
    pub statut: DistributeurStatus,
    pub images: Vec<DistributeurImage>,
    /// Unix epoch milliseconds, assigned by the store.
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed by the store on every write.
    pub updated_at: i64,
}

impl Distributeur {
    /// Creates an active distributeur with a generated stable ID.
    ///
    /// Timestamps stay at `0` until the store assigns them.
    pub fn new(
        nom: impl Into<String>,
        kind: impl Into<String>,
        ville: impl Into<String>,
        coordinates: Coordinates,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), nom, kind, ville, coordinates)
    }

    /// Creates a distributeur with a caller-provided stable ID.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        id: DistributeurId,
        nom: impl Into<String>,
        kind: impl Into<String>,
        ville: impl Into<String>,
        coordinates: Coordinates,
    ) -> Self {
        Self {
            id,
            nom: nom.into(),
            kind: kind.into(),
            adresse: None,
            ville: ville.into(),
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            description: None,
            telephone: None,
            horaires: None,
            statut: DistributeurStatus::default(),
            images: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Validates write-path invariants.
    ///
    /// # Errors
    /// - Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), DistributeurValidationError> {
        for (field, value) in [
            ("nom", self.nom.as_str()),
            ("type", self.kind.as_str()),
            ("ville", self.ville.as_str()),
        ] {
            if value.trim().is_empty() {
                return Err(DistributeurValidationError::BlankField(field));
            }
        }

        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(DistributeurValidationError::LatitudeOutOfRange(
                self.latitude,
            ));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(DistributeurValidationError::LongitudeOutOfRange(
                self.longitude,
            ));
        }

        if let Some(index) = self
            .images
            .iter()
            .position(|image| image.url.trim().is_empty())
        {
            return Err(DistributeurValidationError::BlankImageUrl(index));
        }

        Ok(())
    }
}

impl Located for Distributeur {
    fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Write-path validation failure.
#[derive(Debug, Clone, PartialEq)]
pub enum DistributeurValidationError {
    BlankField(&'static str),
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
    BlankImageUrl(usize),
}

impl Display for DistributeurValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "{field} must not be blank"),
            Self::LatitudeOutOfRange(value) => {
                write!(f, "latitude {value} is outside [-90, 90]")
            }
            Self::LongitudeOutOfRange(value) => {
                write!(f, "longitude {value} is outside [-180, 180]")
            }
            Self::BlankImageUrl(index) => write!(f, "image #{index} has a blank url"),
        }
    }
}

impl Error for DistributeurValidationError {}
