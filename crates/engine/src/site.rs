use construye_catalog::Catalog;
use serde::{Deserialize, Serialize};

use crate::normalizer::ProjectBrief;
use crate::types::Orientation;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainBucket {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    pub coordinates: Coordinates,
    /// Side living areas should face: "sur" north of the equator, "norte" south of it
    pub solar_orientation: String,
    pub solar_note: String,
    pub terrain_bucket: TerrainBucket,
    pub recommendations: Vec<String>,
}

#[must_use]
pub fn terrain_bucket(area: f64, catalog: &Catalog) -> TerrainBucket {
    let site = catalog.site();
    if area < site.small_area {
        TerrainBucket::Small
    } else if area < site.medium_area {
        TerrainBucket::Medium
    } else {
        TerrainBucket::Large
    }
}

fn orientation_note(orientation: Orientation) -> &'static str {
    match orientation {
        Orientation::Norte => {
            "Fachada al norte: luz difusa estable, ubica áreas de trabajo hacia el frente."
        }
        Orientation::Sur => {
            "Fachada al sur: agrega aleros o parasoles para controlar la ganancia solar."
        }
        Orientation::Este => "Fachada al este: aprovecha el sol de la mañana en recámaras.",
        Orientation::Oeste => {
            "Fachada al oeste: protege con vegetación o celosías contra el sol de la tarde."
        }
    }
}

/// Looks up the brief's city (and locality, when given) and fills the
/// recommendation templates.
///
/// The brief was validated against the same catalog, so the city is present;
/// a missing one falls back to the first catalog city.
#[must_use]
pub fn advise(brief: &ProjectBrief, catalog: &Catalog) -> SiteInfo {
    let city = catalog
        .city(&brief.city)
        .or_else(|| catalog.cities().first());
    let locality = brief
        .locality
        .as_deref()
        .and_then(|name| catalog.locality(&brief.city, name));

    let (mut lat, mut lng, mut solar_note) = city.map_or((0.0, 0.0, String::new()), |city| {
        (city.lat, city.lng, city.solar.clone())
    });
    if let Some(locality) = locality {
        if let (Some(l_lat), Some(l_lng)) = (locality.lat, locality.lng) {
            lat = l_lat;
            lng = l_lng;
        }
        if let Some(note) = &locality.solar {
            solar_note = note.clone();
        }
    }

    let bucket = terrain_bucket(brief.floor_area(), catalog);
    let site = catalog.site();
    let mut recommendations = site.base.clone();
    recommendations.push(
        match bucket {
            TerrainBucket::Small => &site.small,
            TerrainBucket::Medium => &site.medium,
            TerrainBucket::Large => &site.large,
        }
        .clone(),
    );
    recommendations.push(orientation_note(brief.orientation).to_string());
    recommendations.extend(
        brief
            .preferences
            .iter()
            .filter_map(|tag| catalog.preference_rule(tag))
            .filter_map(|rule| rule.recommendation.clone()),
    );

    SiteInfo {
        city: brief.city.clone(),
        locality: brief.locality.clone(),
        coordinates: Coordinates { lat, lng },
        solar_orientation: if lat >= 0.0 { "sur" } else { "norte" }.to_string(),
        solar_note,
        terrain_bucket: bucket,
        recommendations,
    }
}
