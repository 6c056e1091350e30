use std::collections::BTreeSet;

use construye_catalog::{room_program, Catalog, FinishTier, OptionId};
use construye_protocol::IntakePayload;
use log::{info, warn};
use serde::Serialize;

use crate::alerts::{generate_alerts, regulatory_count};
use crate::error::{EstimationError, Result};
use crate::estimator::BillOfMaterials;
use crate::manual::{build_manual, ManualStage};
use crate::normalizer::{normalize, ProjectBrief};
use crate::ranker::{rank_options, LayoutOption};
use crate::render::{blueprint_2d, blueprint_3d, Blueprint2D, Blueprint3D};
use crate::site::{advise, SiteInfo};
use crate::types::{round_to, Orientation};
use crate::viability::{self, ViabilityResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Terrain {
    pub width: f64,
    pub length: f64,
    pub area: f64,
}

/// Echo of the brief as the client shows it next to the plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub terrain: Terrain,
    pub occupants: u32,
    pub floors: u32,
    pub budget: f64,
    pub budget_tier: FinishTier,
    pub needed_spaces: BTreeSet<String>,
    pub preferences: BTreeSet<String>,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    pub orientation: Orientation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub climate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

impl Overview {
    fn from_brief(brief: &ProjectBrief, catalog: &Catalog) -> Self {
        Self {
            terrain: Terrain {
                width: brief.plot_width,
                length: brief.plot_length,
                area: round_to(brief.floor_area(), 2),
            },
            occupants: brief.occupants,
            floors: brief.floors,
            budget: brief.budget,
            budget_tier: brief.budget_tier(catalog),
            needed_spaces: brief.needed_spaces.clone(),
            preferences: brief.preferences.clone(),
            city: brief.city.clone(),
            locality: brief.locality.clone(),
            orientation: brief.orientation,
            climate: brief.climate.clone(),
            material: brief.material.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedPlan {
    pub id: OptionId,
    pub name: String,
    #[serde(rename = "blueprint2D")]
    pub blueprint_2d: Blueprint2D,
    #[serde(rename = "blueprint3D")]
    pub blueprint_3d: Blueprint3D,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plans {
    pub selected: SelectedPlan,
    /// Index of the selected option in `options`
    pub selected_index: usize,
    pub options: Vec<LayoutOption>,
}

impl Plans {
    #[must_use]
    pub fn selected_option(&self) -> &LayoutOption {
        &self.options[self.selected_index]
    }
}

/// Everything the engine produces for one brief. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedPlan {
    pub overview: Overview,
    pub viability: ViabilityResult,
    pub plans: Plans,
    /// Bill of the selected option
    pub materials: BillOfMaterials,
    pub alerts: Vec<String>,
    pub site: SiteInfo,
    pub manual: Vec<ManualStage>,
}

/// Runs every stage for an already normalized brief.
///
/// Fails only when all three options ended up without rooms.
pub fn generate_plan(brief: &ProjectBrief, catalog: &Catalog) -> Result<GeneratedPlan> {
    let program = room_program(
        catalog,
        brief.occupants,
        brief.needed_spaces.iter().map(String::as_str),
    );
    let ranked = rank_options(&program, brief, catalog);
    let selected = ranked.selected();
    if selected.rooms.is_empty() {
        return Err(EstimationError::EmptyLayout { option: selected.id }.into());
    }

    let alerts = generate_alerts(brief, &ranked, catalog);
    let viability = viability::score(
        selected.estimated_cost,
        brief.budget,
        selected.dropped.len(),
        selected.required_count,
        regulatory_count(&alerts),
        catalog,
    );

    if !selected.dropped.is_empty() {
        warn!(
            "option {} dropped {} of {} rooms",
            selected.id.as_str(),
            selected.dropped.len(),
            selected.required_count
        );
    }
    if selected.estimated_cost > brief.budget {
        warn!(
            "option {} costs {:.2} over a budget of {:.2}",
            selected.id.as_str(),
            selected.estimated_cost,
            brief.budget
        );
    }
    info!(
        "plan generated: option {} selected (score {}), viability {} '{}', {} alerts",
        selected.id.as_str(),
        selected.compatibility_score,
        viability.score,
        viability.message,
        alerts.len()
    );

    let plan_selected = SelectedPlan {
        id: selected.id,
        name: selected.name.clone(),
        blueprint_2d: blueprint_2d(&selected.rooms, brief.orientation),
        blueprint_3d: blueprint_3d(&selected.rooms, catalog.costs().story_height),
    };
    let materials = selected.materials.clone();
    let manual = build_manual(&materials, catalog);

    Ok(GeneratedPlan {
        overview: Overview::from_brief(brief, catalog),
        viability,
        plans: Plans {
            selected: plan_selected,
            selected_index: ranked.selected,
            options: ranked.options,
        },
        materials,
        alerts: alerts.into_iter().map(|alert| alert.message).collect(),
        site: advise(brief, catalog),
        manual,
    })
}

/// Normalizes a raw intake payload, then generates.
pub fn generate_from_payload(payload: &IntakePayload, catalog: &Catalog) -> Result<GeneratedPlan> {
    let brief = normalize(payload, catalog)?;
    generate_plan(&brief, catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn payload(raw: serde_json::Value) -> IntakePayload {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn plan_json_uses_client_field_names() {
        let plan = generate_from_payload(
            &payload(json!({
                "plotWidth": 12, "plotLength": 20, "budget": 650000,
                "occupants": 4, "floors": 1, "city": "Guadalajara"
            })),
            Catalog::bundled(),
        )
        .unwrap();
        let value = serde_json::to_value(&plan).unwrap();

        assert!(value["plans"]["selected"]["blueprint2D"]["scene"].is_array());
        assert!(value["plans"]["selected"]["blueprint3D"]["volumes"].is_array());
        assert_eq!(value["plans"]["options"].as_array().unwrap().len(), 3);
        assert!(value["plans"]["options"][0]["compatibilityScore"].is_number());
        assert!(value["materials"]["estimatedTotal"].is_number());
        assert!(value["site"]["solarOrientation"].is_string());
        assert_eq!(value["overview"]["terrain"]["area"], 240.0);
        assert_eq!(value["manual"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn selected_bill_matches_the_selected_option() {
        let plan = generate_from_payload(
            &payload(json!({
                "plotWidth": 10, "plotLength": 15, "budget": 450000,
                "occupants": 3, "floors": 1, "city": "Puebla"
            })),
            Catalog::bundled(),
        )
        .unwrap();
        let selected = plan.plans.selected_option();
        assert_eq!(plan.plans.selected.id, selected.id);
        assert_eq!(plan.materials, selected.materials);
        assert_eq!(plan.plans.selected.blueprint_2d.rooms, selected.rooms);
    }

    #[test]
    fn invalid_payload_surfaces_the_validation_error() {
        let err = generate_from_payload(
            &payload(json!({"plotWidth": 10, "plotLength": 15, "occupants": 3, "floors": 1, "city": "Puebla"})),
            Catalog::bundled(),
        )
        .unwrap_err();
        assert_eq!(err.code(), "validation_error");
        assert!(matches!(err, EngineError::Validation(ref e) if e.field == "budget"));
    }

    #[test]
    fn plot_too_small_for_any_room_is_an_estimation_error() {
        let err = generate_from_payload(
            &payload(json!({
                "plotWidth": 2, "plotLength": 2, "budget": 100000,
                "occupants": 1, "floors": 1, "city": "Puebla"
            })),
            Catalog::bundled(),
        )
        .unwrap_err();
        assert_eq!(err.code(), "estimation_error");
    }

    #[test]
    fn one_empty_option_does_not_fail_the_plan() {
        for (width, length, budget) in [(5.59, 3.4, 1000), (5.6, 3.4, 5000), (5.5, 3.45, 1000)] {
            let plan = generate_from_payload(
                &payload(json!({
                    "plotWidth": width, "plotLength": length, "budget": budget,
                    "occupants": 1, "floors": 1, "city": "Puebla"
                })),
                Catalog::bundled(),
            )
            .unwrap_or_else(|err| panic!("{width}x{length} with {budget}: {err}"));
            assert!(!plan.plans.selected_option().rooms.is_empty());
            assert!(!plan.plans.selected.blueprint_2d.rooms.is_empty());
        }
    }
}
