use construye_catalog::{Catalog, FinishTier, OptionId, PriceBasis};
use serde::{Deserialize, Serialize};

use crate::error::EstimationError;
use crate::normalizer::ProjectBrief;
use crate::types::{round_to, Room};

pub const STRUCTURE_LINE: &str = "Estructura y obra negra";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub unit_cost: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillOfMaterials {
    pub finish_tier: FinishTier,
    pub items: Vec<MaterialItem>,
    pub subtotal: f64,
    pub contingency: f64,
    pub estimated_total: f64,
}

impl BillOfMaterials {
    /// Bill for an option that ended up with no rooms.
    #[must_use]
    pub const fn empty(finish_tier: FinishTier) -> Self {
        Self {
            finish_tier,
            items: Vec::new(),
            subtotal: 0.0,
            contingency: 0.0,
            estimated_total: 0.0,
        }
    }
}

/// Structural cost per m² for the brief's material, tier and climate.
#[must_use]
pub fn structural_cost_per_m2(brief: &ProjectBrief, tier: FinishTier, catalog: &Catalog) -> f64 {
    let base = brief
        .material
        .as_deref()
        .and_then(|name| catalog.material(name))
        .map_or(catalog.costs().base_cost_per_m2, |m| m.base_cost_per_m2);
    base * catalog.tiers().multiplier(tier) * catalog.climate_factor(brief.climate.as_deref())
}

/// Costs an option's rooms: a structural line plus every applicable unit-price line.
pub fn estimate(
    option: OptionId,
    rooms: &[Room],
    tier: FinishTier,
    brief: &ProjectBrief,
    catalog: &Catalog,
) -> Result<BillOfMaterials, EstimationError> {
    if rooms.is_empty() {
        return Err(EstimationError::EmptyLayout { option });
    }
    let story_height = catalog.costs().story_height;

    let mut items = vec![line(
        STRUCTURE_LINE,
        "m²",
        rooms.iter().map(|room| room.area).sum(),
        structural_cost_per_m2(brief, tier, catalog),
    )];
    for price in catalog.unit_prices() {
        let quantity: f64 = rooms
            .iter()
            .filter(|room| price.applies_to(room.category))
            .map(|room| match price.basis {
                PriceBasis::FloorArea => room.area,
                PriceBasis::WallArea => room.perimeter() * story_height,
                PriceBasis::PerRoom => 1.0,
            })
            .sum::<f64>()
            * price.factor;
        items.push(line(&price.name, &price.unit, quantity, price.unit_cost));
    }
    items.retain(|item| item.quantity > 0.0);

    let subtotal = round_to(items.iter().map(|item| item.total).sum(), 2);
    let contingency = round_to(subtotal * catalog.costs().contingency_rate, 2);
    Ok(BillOfMaterials {
        finish_tier: tier,
        items,
        subtotal,
        contingency,
        estimated_total: round_to(subtotal + contingency, 2),
    })
}

fn line(name: &str, unit: &str, quantity: f64, unit_cost: f64) -> MaterialItem {
    let quantity = round_to(quantity, 2);
    let unit_cost = round_to(unit_cost, 2);
    MaterialItem {
        name: name.to_string(),
        quantity,
        unit: unit.to_string(),
        unit_cost,
        total: round_to(quantity * unit_cost, 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use crate::types::{GridPosition, RoomStyle};
    use construye_catalog::RoomCategory;
    use construye_protocol::IntakePayload;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn brief(extra: serde_json::Value) -> ProjectBrief {
        let mut raw = json!({
            "plotWidth": 10, "plotLength": 12, "budget": 400000,
            "occupants": 2, "floors": 1, "city": "Querétaro"
        });
        for (key, value) in extra.as_object().unwrap() {
            raw[key] = value.clone();
        }
        let payload: IntakePayload = serde_json::from_value(raw).unwrap();
        normalize(&payload, Catalog::bundled()).unwrap()
    }

    fn room(name: &str, category: RoomCategory, width: f64, height: f64) -> Room {
        Room {
            name: name.to_string(),
            archetype: name.to_lowercase(),
            category,
            grid_position: GridPosition { x: 0.0, y: 0.0 },
            width,
            height,
            area: round_to(width * height, 1),
            floor_index: 0,
            style: RoomStyle::for_category(category),
            guide: None,
        }
    }

    #[test]
    fn single_dry_room_bill() {
        let rooms = vec![room("Sala", RoomCategory::Dry, 2.5, 4.0)];
        let bill = estimate(
            OptionId::A,
            &rooms,
            FinishTier::Standard,
            &brief(json!({})),
            Catalog::bundled(),
        )
        .unwrap();

        let names: Vec<_> = bill.items.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                STRUCTURE_LINE,
                "Acero de refuerzo",
                "Pintura vinílica en muros",
                "Piso cerámico",
                "Instalación eléctrica",
            ]
        );
        assert_eq!(bill.items[0].total, 58_500.0);
        assert_eq!(bill.items[1].quantity, 0.35);
        assert_eq!(bill.items[2].quantity, 36.4);
        assert_eq!(bill.subtotal, 75_133.0);
        assert_eq!(bill.contingency, 6_010.64);
        assert_eq!(bill.estimated_total, 81_143.64);
    }

    #[test]
    fn wet_rooms_pull_plumbing_lines() {
        let rooms = vec![
            room("Baño", RoomCategory::Wet, 2.0, 2.5),
            room("Cocina", RoomCategory::Wet, 2.5, 4.0),
        ];
        let bill = estimate(
            OptionId::B,
            &rooms,
            FinishTier::Economy,
            &brief(json!({})),
            Catalog::bundled(),
        )
        .unwrap();

        let plumbing = bill
            .items
            .iter()
            .find(|item| item.name == "Instalación hidrosanitaria")
            .unwrap();
        assert_eq!(plumbing.quantity, 2.0);
        assert!(bill.items.iter().all(|item| item.name != "Piso cerámico"));
        assert_eq!(bill.items[0].quantity, 15.0);
        assert_eq!(bill.items[0].unit_cost, 4_500.0);
    }

    #[test]
    fn material_and_climate_change_the_structural_rate() {
        let catalog = Catalog::bundled();
        let plain = brief(json!({}));
        let adobe_humid = brief(json!({"material": "adobe", "climate": "húmedo"}));

        assert_eq!(structural_cost_per_m2(&plain, FinishTier::Premium, catalog), 4_500.0 * 1.7);
        assert_eq!(
            round_to(structural_cost_per_m2(&adobe_humid, FinishTier::Economy, catalog), 2),
            round_to(3_400.0 * 1.12, 2)
        );
    }

    #[test]
    fn empty_layout_is_an_error() {
        let err = estimate(
            OptionId::C,
            &[],
            FinishTier::Premium,
            &brief(json!({})),
            Catalog::bundled(),
        )
        .unwrap_err();
        assert_eq!(err, EstimationError::EmptyLayout { option: OptionId::C });
        assert_eq!(err.to_string(), "option C has no rooms to estimate");
    }
}
