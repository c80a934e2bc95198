//! Admin write payloads.

use distrimap_core::{
    Coordinates, Distributeur, DistributeurId, DistributeurImage, DistributeurStatus,
};
use serde::Deserialize;

/// Body of `POST`/`PUT /api/admin/distributeurs`.
///
/// Images may be plain URLs or `{ url, position }` objects; without an
/// explicit position they keep the order they were sent in.
#[derive(Debug, Clone, Deserialize)]
pub struct DistributeurInput {
    pub nom: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub adresse: Option<String>,
    pub ville: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub horaires: Option<String>,
    #[serde(default)]
    pub statut: Option<DistributeurStatus>,
    #[serde(default)]
    pub images: Vec<ImageInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImageInput {
    Url(String),
    Positioned { url: String, position: Option<u32> },
}

impl DistributeurInput {
    /// Builds the domain record for `id`; store timestamps stay unset.
    pub fn into_distributeur(self, id: DistributeurId) -> Distributeur {
        let mut distributeur = Distributeur::with_id(
            id,
            self.nom.trim(),
            self.kind.trim(),
            self.ville.trim(),
            Coordinates::new(self.latitude, self.longitude),
        );
        distributeur.adresse = optional_text(self.adresse);
        distributeur.description = optional_text(self.description);
        distributeur.telephone = optional_text(self.telephone);
        distributeur.horaires = optional_text(self.horaires);
        distributeur.statut = self.statut.unwrap_or_default();
        distributeur.images = self
            .images
            .into_iter()
            .enumerate()
            .map(|(index, image)| {
                let fallback = u32::try_from(index).unwrap_or(u32::MAX);
                match image {
                    ImageInput::Url(url) => DistributeurImage {
                        url,
                        position: fallback,
                    },
                    ImageInput::Positioned { url, position } => DistributeurImage {
                        url,
                        position: position.unwrap_or(fallback),
                    },
                }
            })
            .collect();
        distributeur
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
