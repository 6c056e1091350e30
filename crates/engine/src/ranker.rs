use construye_catalog::{Catalog, FinishTier, OptionId, ProgramRoom};
use log::debug;
use serde::Serialize;

use crate::allocator::allocate;
use crate::error::EstimationError;
use crate::estimator::{estimate, BillOfMaterials};
use crate::normalizer::ProjectBrief;
use crate::types::{round_to, DroppedRoom, Room};

/// One of the three generated alternatives.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOption {
    pub id: OptionId,
    pub name: String,
    pub description: String,
    pub finish_tier: FinishTier,
    pub area_multiplier: f64,
    pub rooms: Vec<Room>,
    pub dropped: Vec<DroppedRoom>,
    pub required_count: usize,
    pub floors_used: u32,
    pub usable_area: f64,
    pub matched_preferences: Vec<String>,
    #[serde(rename = "matchedPreferenceFraction")]
    pub preference_fraction: f64,
    pub budget_closeness: f64,
    pub compatibility_score: f64,
    pub estimated_cost: f64,
    pub materials: BillOfMaterials,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedOptions {
    /// Always A, B, C in that order
    pub options: Vec<LayoutOption>,
    pub selected: usize,
}

impl RankedOptions {
    #[must_use]
    pub fn selected(&self) -> &LayoutOption {
        &self.options[self.selected]
    }
}

/// Runs the allocator under every catalog profile and scores each result.
#[must_use]
pub fn rank_options(program: &[ProgramRoom], brief: &ProjectBrief, catalog: &Catalog) -> RankedOptions {
    let scoring = catalog.scoring();
    let options: Vec<LayoutOption> = catalog
        .profiles()
        .into_iter()
        .map(|profile| {
            let allocation = allocate(program, brief, profile, catalog);
            let materials = match estimate(profile.id, &allocation.rooms, profile.finish_tier, brief, catalog) {
                Ok(bill) => bill,
                Err(EstimationError::EmptyLayout { .. }) => BillOfMaterials::empty(profile.finish_tier),
            };
            let estimated_cost = materials.estimated_total;

            let matched_preferences: Vec<String> = brief
                .preferences
                .iter()
                .filter(|tag| preference_satisfied(tag, &allocation.rooms, profile.finish_tier, catalog))
                .cloned()
                .collect();
            let preference_fraction = if brief.preferences.is_empty() {
                1.0
            } else {
                matched_preferences.len() as f64 / brief.preferences.len() as f64
            };
            let closeness = budget_closeness(estimated_cost, brief.budget);
            let compatibility_score = round_to(
                scoring.preference_weight * preference_fraction + scoring.budget_weight * closeness,
                4,
            )
            .clamp(0.0, 1.0);
            debug!(
                "option {}: score {compatibility_score} (preferences {preference_fraction:.2}, budget {closeness:.2}), cost {estimated_cost:.2}",
                profile.id.as_str()
            );

            LayoutOption {
                id: profile.id,
                name: profile.name.clone(),
                description: profile.description.clone(),
                finish_tier: profile.finish_tier,
                area_multiplier: profile.area_multiplier,
                rooms: allocation.rooms,
                dropped: allocation.dropped,
                required_count: allocation.required_count,
                floors_used: allocation.floors_used,
                usable_area: allocation.usable_area,
                matched_preferences,
                preference_fraction: round_to(preference_fraction, 4),
                budget_closeness: round_to(closeness, 4),
                compatibility_score,
                estimated_cost,
                materials,
            }
        })
        .collect();

    let selected = select(&options);
    RankedOptions { options, selected }
}

/// `clamp(1 − |cost − budget| / budget, 0, 1)`
#[must_use]
pub fn budget_closeness(cost: f64, budget: f64) -> f64 {
    if budget <= 0.0 {
        return 0.0;
    }
    (1.0 - (cost - budget).abs() / budget).clamp(0.0, 1.0)
}

/// Whether an option's rooms and finish tier satisfy a preference tag.
///
/// Catalog rules decide when present; otherwise the tag must name a room the
/// option contains.
#[must_use]
pub fn preference_satisfied(tag: &str, rooms: &[Room], tier: FinishTier, catalog: &Catalog) -> bool {
    let has_room = |archetype: &str| rooms.iter().any(|room| room.archetype == archetype);
    match catalog.preference_rule(tag) {
        Some(rule) => {
            let rooms_ok =
                rule.any_of_rooms.is_empty() || rule.any_of_rooms.iter().any(|name| has_room(name));
            let tier_ok = rule.finish_tiers.is_empty() || rule.finish_tiers.contains(&tier);
            rooms_ok && tier_ok
        }
        None => catalog
            .resolve_space(tag)
            .is_some_and(|archetype| has_room(&archetype.name)),
    }
}

/// Highest score wins; ties go to the cheaper option, then to the earlier id.
///
/// Options without rooms rank after every furnished one, so an empty option is
/// selected only when all three are empty.
#[must_use]
pub fn select(options: &[LayoutOption]) -> usize {
    let keys: Vec<_> = options
        .iter()
        .map(|option| SelectionKey {
            empty: option.rooms.is_empty(),
            score: option.compatibility_score,
            cost: option.estimated_cost,
            id: option.id,
        })
        .collect();
    best_index(&keys)
}

struct SelectionKey {
    empty: bool,
    score: f64,
    cost: f64,
    id: OptionId,
}

fn best_index(keys: &[SelectionKey]) -> usize {
    keys.iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.empty
                .cmp(&b.empty)
                .then_with(|| b.score.total_cmp(&a.score))
                .then_with(|| a.cost.total_cmp(&b.cost))
                .then_with(|| a.id.cmp(&b.id))
        })
        .map_or(0, |(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use construye_catalog::room_program;
    use construye_protocol::IntakePayload;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ranked(raw: serde_json::Value) -> (ProjectBrief, RankedOptions) {
        let catalog = Catalog::bundled();
        let payload: IntakePayload = serde_json::from_value(raw).unwrap();
        let brief = normalize(&payload, catalog).unwrap();
        let program = room_program(
            catalog,
            brief.occupants,
            brief.needed_spaces.iter().map(String::as_str),
        );
        let ranked = rank_options(&program, &brief, catalog);
        (brief, ranked)
    }

    #[test]
    fn closeness_is_symmetric_and_clamped() {
        assert_eq!(budget_closeness(100.0, 100.0), 1.0);
        assert_eq!(budget_closeness(80.0, 100.0), 0.8);
        assert_eq!(round_to(budget_closeness(120.0, 100.0), 6), 0.8);
        assert_eq!(budget_closeness(250.0, 100.0), 0.0);
        assert_eq!(budget_closeness(0.0, 100.0), 0.0);
    }

    fn key(empty: bool, score: f64, cost: f64, id: OptionId) -> SelectionKey {
        SelectionKey {
            empty,
            score,
            cost,
            id,
        }
    }

    #[test]
    fn ties_break_on_cost_then_id() {
        let keys = [
            key(false, 0.7, 300.0, OptionId::A),
            key(false, 0.9, 500.0, OptionId::B),
            key(false, 0.9, 400.0, OptionId::C),
        ];
        assert_eq!(best_index(&keys), 2);

        let keys = [
            key(false, 0.9, 400.0, OptionId::A),
            key(false, 0.9, 400.0, OptionId::B),
            key(false, 0.1, 100.0, OptionId::C),
        ];
        assert_eq!(best_index(&keys), 0);
    }

    #[test]
    fn empty_options_rank_last() {
        let keys = [
            key(false, 0.6, 55_157.54, OptionId::A),
            key(false, 0.6, 48_596.54, OptionId::B),
            key(true, 0.6, 0.0, OptionId::C),
        ];
        assert_eq!(best_index(&keys), 1);

        let keys = [
            key(true, 1.0, 0.0, OptionId::A),
            key(false, 0.2, 90_000.0, OptionId::B),
            key(true, 1.0, 0.0, OptionId::C),
        ];
        assert_eq!(best_index(&keys), 1);

        let keys = [
            key(true, 0.6, 0.0, OptionId::A),
            key(true, 0.6, 0.0, OptionId::B),
            key(true, 0.6, 0.0, OptionId::C),
        ];
        assert_eq!(best_index(&keys), 0);
    }

    #[test]
    fn tiny_plot_selects_a_furnished_option() {
        let (_, ranked) = ranked(json!({
            "plotWidth": 5.59, "plotLength": 3.4, "budget": 1000,
            "occupants": 1, "floors": 1, "city": "Puebla"
        }));
        assert!(ranked.options.iter().any(|option| !option.rooms.is_empty()));
        assert!(!ranked.selected().rooms.is_empty());
    }

    #[test]
    fn produces_three_options_in_id_order() {
        let (_, ranked) = ranked(json!({
            "plotWidth": 12, "plotLength": 20, "budget": 650000,
            "occupants": 4, "floors": 1, "city": "Guadalajara"
        }));
        let ids: Vec<_> = ranked.options.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![OptionId::A, OptionId::B, OptionId::C]);
        assert_eq!(ranked.options[1].finish_tier, FinishTier::Economy);
        assert!(ranked.selected < 3);
    }

    #[test]
    fn no_preferences_means_full_preference_credit() {
        let (brief, ranked) = ranked(json!({
            "plotWidth": 10, "plotLength": 18, "budget": 500000,
            "occupants": 3, "floors": 1, "city": "Puebla"
        }));
        for option in &ranked.options {
            assert_eq!(option.preference_fraction, 1.0);
            let expected = round_to(0.6 + 0.4 * budget_closeness(option.estimated_cost, brief.budget), 4);
            assert_eq!(option.compatibility_score, expected);
        }
    }

    #[test]
    fn preference_rules_follow_rooms_and_tiers() {
        let (_, ranked) = ranked(json!({
            "plotWidth": 12, "plotLength": 25, "budget": 900000,
            "occupants": 2, "floors": 1, "city": "Mérida",
            "neededSpaces": ["patio"],
            "preferences": ["espacios amplios", "ventilación natural"]
        }));
        let a = &ranked.options[0];
        let c = &ranked.options[2];
        assert!(a.matched_preferences.contains(&"ventilación natural".to_string()));
        assert!(!a.matched_preferences.contains(&"espacios amplios".to_string()));
        assert_eq!(a.preference_fraction, 0.5);
        assert_eq!(c.matched_preferences.len(), 2);
    }

    #[test]
    fn room_tags_without_rules_need_the_room() {
        let catalog = Catalog::bundled();
        assert!(!preference_satisfied("estudio", &[], FinishTier::Premium, catalog));
        assert!(!preference_satisfied("alberca", &[], FinishTier::Premium, catalog));
    }
}
