use std::collections::BTreeSet;
use std::fmt::Write as _;

use construye_catalog::{Catalog, FinishTier};
use construye_protocol::IntakePayload;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::ValidationError;
use crate::types::Orientation;

/// Input sanity bounds; anything above is a typo, not a house.
const MAX_OCCUPANTS: u32 = 30;
const MAX_FLOORS: u32 = 10;

/// Validated, canonical project requirements.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectBrief {
    pub plot_width: f64,
    pub plot_length: f64,
    pub budget: f64,
    pub occupants: u32,
    pub floors: u32,
    pub needed_spaces: BTreeSet<String>,
    pub preferences: BTreeSet<String>,
    pub needs: BTreeSet<String>,
    /// Catalog spelling of the city
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    pub orientation: Orientation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub climate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

impl ProjectBrief {
    #[must_use]
    pub fn floor_area(&self) -> f64 {
        self.plot_width * self.plot_length
    }

    #[must_use]
    pub fn per_floor_budget(&self) -> f64 {
        self.budget / f64::from(self.floors)
    }

    #[must_use]
    pub fn budget_tier(&self, catalog: &Catalog) -> FinishTier {
        catalog.tiers().tier_for_budget(self.budget)
    }

    /// Hex SHA-256 of the brief's canonical JSON.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        // Serializing plain numbers, strings and sorted sets cannot fail.
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let digest = Sha256::digest(&bytes);
        digest.iter().fold(String::with_capacity(64), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
    }
}

/// Turns a loosely typed intake payload into a [`ProjectBrief`].
///
/// This is the only validation point; later stages trust the brief.
pub fn normalize(
    payload: &IntakePayload,
    catalog: &Catalog,
) -> Result<ProjectBrief, ValidationError> {
    let plot_width = positive_number("plotWidth", payload.plot_width.as_ref())?;
    let plot_length = positive_number("plotLength", payload.plot_length.as_ref())?;
    let budget = positive_number("budget", payload.budget.as_ref())?;
    let occupants = count("occupants", payload.occupants.as_ref(), MAX_OCCUPANTS)?;
    let floors = count("floors", payload.floors.as_ref(), MAX_FLOORS)?;

    let city_name = payload
        .city
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ValidationError::new("city", "is required"))?;
    let city = catalog
        .city(city_name)
        .ok_or_else(|| ValidationError::new("city", format!("unknown city '{city_name}'")))?;

    let locality = match non_empty(payload.locality.as_deref()) {
        Some(name) => {
            let locality = city.locality(name).ok_or_else(|| {
                ValidationError::new(
                    "locality",
                    format!("unknown locality '{name}' for {}", city.name),
                )
            })?;
            Some(locality.name.clone())
        }
        None => None,
    };

    let orientation = match non_empty(payload.orientation.as_deref()) {
        Some(value) => Orientation::parse(value).ok_or_else(|| {
            ValidationError::new(
                "orientation",
                format!("unknown orientation '{value}' (expected norte, sur, este or oeste)"),
            )
        })?,
        None => Orientation::default(),
    };

    let climate = match non_empty(payload.climate.as_deref()) {
        Some(value) => Some(
            catalog
                .climate(value)
                .map(|climate| climate.name.clone())
                .ok_or_else(|| {
                    ValidationError::new("climate", format!("unknown climate '{value}'"))
                })?,
        ),
        None => None,
    };

    let material = match non_empty(payload.material.as_deref()) {
        Some(value) => Some(
            catalog
                .material(value)
                .map(|material| material.name.clone())
                .ok_or_else(|| {
                    ValidationError::new("material", format!("unknown material '{value}'"))
                })?,
        ),
        None => None,
    };

    Ok(ProjectBrief {
        plot_width,
        plot_length,
        budget,
        occupants,
        floors,
        needed_spaces: tag_set(&payload.needed_spaces),
        preferences: tag_set(&payload.preferences),
        needs: tag_set(&payload.needs),
        city: city.name.clone(),
        locality,
        orientation,
        climate,
        material,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn tag_set(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty())
        .collect()
}

fn number(field: &str, value: Option<&Value>) -> Result<f64, ValidationError> {
    let parsed = match value {
        None | Some(Value::Null) => return Err(ValidationError::new(field, "is required")),
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) if text.trim().is_empty() => {
            return Err(ValidationError::new(field, "is required"))
        }
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match parsed {
        Some(number) if number.is_finite() => Ok(number),
        _ => Err(ValidationError::new(field, "must be a number")),
    }
}

fn positive_number(field: &str, value: Option<&Value>) -> Result<f64, ValidationError> {
    let number = number(field, value)?;
    if number <= 0.0 {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }
    Ok(number)
}

fn count(field: &str, value: Option<&Value>, max: u32) -> Result<u32, ValidationError> {
    let number = number(field, value)?;
    if number.fract() != 0.0 {
        return Err(ValidationError::new(field, "must be a whole number"));
    }
    if number < 1.0 {
        return Err(ValidationError::new(field, "must be at least 1"));
    }
    if number > f64::from(max) {
        return Err(ValidationError::new(field, format!("must be at most {max}")));
    }
    // bounded above, so the cast is exact
    Ok(number as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn payload(value: Value) -> IntakePayload {
        serde_json::from_value(value).unwrap()
    }

    fn base() -> Value {
        json!({
            "plotWidth": 10,
            "plotLength": "12.5",
            "budget": 500000,
            "occupants": 4,
            "floors": 1,
            "city": "puebla"
        })
    }

    fn with(field: &str, value: Value) -> IntakePayload {
        let mut raw = base();
        raw[field] = value;
        payload(raw)
    }

    #[test]
    fn normalizes_numbers_and_tags() {
        let raw = json!({
            "ancho_terreno": "8",
            "largo_terreno": 20,
            "presupuesto": 350000,
            "personas": "3",
            "plantas": 2,
            "espacios": [" Cochera", "cochera", "", "Estudio "],
            "preferencias": ["Ventilación Natural"],
            "ciudad": "Ciudad de México",
            "localidad": "iztapalapa",
            "orientacion": "Sur",
            "clima": "HÚMEDO",
            "material": "block"
        });
        let brief = normalize(&payload(raw), Catalog::bundled()).unwrap();

        assert_eq!(brief.plot_width, 8.0);
        assert_eq!(brief.occupants, 3);
        assert_eq!(brief.floor_area(), 160.0);
        assert_eq!(brief.per_floor_budget(), 175_000.0);
        assert_eq!(
            brief.needed_spaces.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["cochera", "estudio"]
        );
        assert!(brief.preferences.contains("ventilación natural"));
        assert_eq!(brief.locality.as_deref(), Some("Iztapalapa"));
        assert_eq!(brief.orientation, Orientation::Sur);
        assert_eq!(brief.climate.as_deref(), Some("húmedo"));
        assert_eq!(brief.budget_tier(Catalog::bundled()), FinishTier::Standard);
    }

    #[test]
    fn missing_numeric_field_is_reported() {
        let mut raw = base();
        raw.as_object_mut().unwrap().remove("budget");
        let err = normalize(&payload(raw), Catalog::bundled()).unwrap_err();
        assert_eq!(err, ValidationError::new("budget", "is required"));
    }

    #[test]
    fn non_positive_and_non_numeric_values_fail() {
        let catalog = Catalog::bundled();
        let err = normalize(&with("plotWidth", json!(0)), catalog).unwrap_err();
        assert_eq!(err.reason, "must be greater than zero");

        let err = normalize(&with("plotLength", json!("doce")), catalog).unwrap_err();
        assert_eq!(err.to_string(), "plotLength: must be a number");

        let err = normalize(&with("floors", json!(1.5)), catalog).unwrap_err();
        assert_eq!(err.field, "floors");
        assert_eq!(err.reason, "must be a whole number");

        let err = normalize(&with("occupants", json!(0)), catalog).unwrap_err();
        assert_eq!(err.reason, "must be at least 1");

        let err = normalize(&with("floors", json!(40)), catalog).unwrap_err();
        assert_eq!(err.reason, "must be at most 10");
    }

    #[test]
    fn unknown_city_or_locality_fails() {
        let catalog = Catalog::bundled();
        let err = normalize(&with("city", json!("Atlantis")), catalog).unwrap_err();
        assert_eq!(err.field, "city");

        let err = normalize(&with("locality", json!("Tonalá")), catalog).unwrap_err();
        assert_eq!(err.field, "locality");
        assert!(err.reason.contains("Puebla"));

        let err = normalize(&with("city", json!("  ")), catalog).unwrap_err();
        assert_eq!(err, ValidationError::new("city", "is required"));
    }

    #[test]
    fn unknown_enum_values_fail() {
        let catalog = Catalog::bundled();
        assert_eq!(
            normalize(&with("orientation", json!("noreste")), catalog).unwrap_err().field,
            "orientation"
        );
        assert_eq!(
            normalize(&with("climate", json!("polar")), catalog).unwrap_err().field,
            "climate"
        );
        assert_eq!(
            normalize(&with("material", json!("acero")), catalog).unwrap_err().field,
            "material"
        );
    }

    #[test]
    fn fingerprint_ignores_tag_order_and_case() {
        let catalog = Catalog::bundled();
        let first = with("preferences", json!(["energía solar", "Bajo mantenimiento"]));
        let second = with("preferences", json!(["bajo mantenimiento", "Energía Solar"]));
        let first = normalize(&first, catalog).unwrap();
        let second = normalize(&second, catalog).unwrap();
        assert_eq!(first.fingerprint(), second.fingerprint());

        let other = normalize(&with("budget", json!(500001)), catalog).unwrap();
        assert_ne!(first.fingerprint(), other.fingerprint());
    }
}
