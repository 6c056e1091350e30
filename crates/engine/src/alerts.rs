use construye_catalog::Catalog;
use serde::{Deserialize, Serialize};

use crate::normalizer::ProjectBrief;
use crate::ranker::RankedOptions;

const ACCESSIBILITY_TAGS: [&str; 3] = ["accesibilidad", "rampa", "silla de ruedas"];

/// Rule group an alert came from, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Budget,
    /// Even the cheapest option costs more than the stretched budget
    Shortfall,
    Dropped,
    Regulatory,
    Floors,
    Site,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Only these lower the viability regulatory factor.
    #[must_use]
    pub fn lowers_viability(&self) -> bool {
        matches!(self.kind, AlertKind::Regulatory | AlertKind::Shortfall)
    }
}

/// Evaluates every rule against the ranked options. Output order is rule order,
/// then insertion order.
#[must_use]
pub fn generate_alerts(brief: &ProjectBrief, ranked: &RankedOptions, catalog: &Catalog) -> Vec<Alert> {
    let mut alerts = Vec::new();
    budget_rules(brief, ranked, catalog, &mut alerts);

    let selected = ranked.selected();
    alerts.extend(
        selected
            .dropped
            .iter()
            .map(|dropped| Alert::new(AlertKind::Dropped, dropped.alert())),
    );

    regulatory_rules(brief, catalog, &mut alerts);
    floor_rules(brief, selected.floors_used, &mut alerts);
    site_rules(brief, catalog, &mut alerts);
    alerts
}

#[must_use]
pub fn regulatory_count(alerts: &[Alert]) -> usize {
    alerts.iter().filter(|alert| alert.lowers_viability()).count()
}

fn budget_rules(brief: &ProjectBrief, ranked: &RankedOptions, catalog: &Catalog, alerts: &mut Vec<Alert>) {
    let selected = ranked.selected();
    if selected.estimated_cost > brief.budget {
        alerts.push(Alert::new(
            AlertKind::Budget,
            format!(
                "El costo estimado de {} (${:.2}) supera el presupuesto de ${:.2}.",
                selected.name, selected.estimated_cost, brief.budget
            ),
        ));
    }
    let cheapest = ranked
        .options
        .iter()
        .filter(|option| !option.rooms.is_empty())
        .map(|option| option.estimated_cost)
        .fold(f64::INFINITY, f64::min);
    if cheapest > brief.budget {
        alerts.push(Alert::new(
            AlertKind::Budget,
            "Ninguna opción cabe en el presupuesto: considera construir por etapas o reducir espacios.",
        ));
    }
    let stretched = brief.budget * catalog.costs().budget_stretch;
    if cheapest.is_finite() && cheapest > stretched {
        alerts.push(Alert::new(
            AlertKind::Shortfall,
            format!(
                "La opción más económica (${cheapest:.2}) supera ${stretched:.2}; el proyecto no es financiable sin ampliar el presupuesto."
            ),
        ));
    }
}

fn regulatory_rules(brief: &ProjectBrief, catalog: &Catalog, alerts: &mut Vec<Alert>) {
    let regulation = catalog.regulation();
    if brief.floors > regulation.max_floors {
        alerts.push(Alert::new(
            AlertKind::Regulatory,
            format!(
                "Se solicitaron {} plantas; el reglamento local permite un máximo de {}.",
                brief.floors, regulation.max_floors
            ),
        ));
    }
    if brief.floor_area() < regulation.min_lot_area {
        alerts.push(Alert::new(
            AlertKind::Regulatory,
            format!(
                "El terreno mide {:.1} m², por debajo del lote mínimo de {:.0} m².",
                brief.floor_area(),
                regulation.min_lot_area
            ),
        ));
    }
}

fn floor_rules(brief: &ProjectBrief, floors_used: u32, alerts: &mut Vec<Alert>) {
    if floors_used < brief.floors {
        alerts.push(Alert::new(
            AlertKind::Floors,
            format!(
                "La distribución solo ocupa {floors_used} de {} plantas; las plantas superiores quedan libres.",
                brief.floors
            ),
        ));
    }
    let accessible = brief
        .needs
        .iter()
        .chain(&brief.needed_spaces)
        .chain(&brief.preferences)
        .any(|tag| ACCESSIBILITY_TAGS.iter().any(|needle| tag.contains(needle)));
    if accessible {
        alerts.push(Alert::new(
            AlertKind::Floors,
            "Asegura rampas con pendiente máxima de 8 grados y pasamanos dobles.",
        ));
        if floors_used > 1 {
            alerts.push(Alert::new(
                AlertKind::Floors,
                "Ubica al menos una recámara y un baño accesibles en planta baja.",
            ));
        }
    }
}

fn site_rules(brief: &ProjectBrief, catalog: &Catalog, alerts: &mut Vec<Alert>) {
    let regulation = catalog.regulation();
    if brief.plot_width < regulation.min_plot_width {
        alerts.push(Alert::new(
            AlertKind::Site,
            format!(
                "Frente de {:.1} m: terreno angosto, refuerza muros medianeros y ventila por patios interiores.",
                brief.plot_width
            ),
        ));
    }
    let long_side = brief.plot_width.max(brief.plot_length);
    let short_side = brief.plot_width.min(brief.plot_length);
    if long_side / short_side > regulation.max_plot_aspect {
        alerts.push(Alert::new(
            AlertKind::Site,
            "Terreno alargado: distribuye patios de luz para iluminar las áreas centrales.",
        ));
    }
    if let Some(note) = brief
        .climate
        .as_deref()
        .and_then(|name| catalog.climate(name))
        .and_then(|climate| climate.alert.as_deref())
    {
        alerts.push(Alert::new(AlertKind::Site, note));
    }
    if let Some(note) = brief
        .material
        .as_deref()
        .and_then(|name| catalog.material(name))
        .and_then(|material| material.alert.as_deref())
    {
        alerts.push(Alert::new(AlertKind::Site, note));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use crate::ranker::rank_options;
    use construye_catalog::room_program;
    use construye_protocol::IntakePayload;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn alerts_for(raw: serde_json::Value) -> Vec<Alert> {
        let catalog = Catalog::bundled();
        let payload: IntakePayload = serde_json::from_value(raw).unwrap();
        let brief = normalize(&payload, catalog).unwrap();
        let program = room_program(
            catalog,
            brief.occupants,
            brief.needed_spaces.iter().map(String::as_str),
        );
        let ranked = rank_options(&program, &brief, catalog);
        generate_alerts(&brief, &ranked, catalog)
    }

    #[test]
    fn comfortable_brief_has_no_alerts() {
        let alerts = alerts_for(json!({
            "plotWidth": 12, "plotLength": 20, "budget": 650000,
            "occupants": 4, "floors": 1, "city": "Guadalajara"
        }));
        assert_eq!(alerts, Vec::new());
    }

    #[test]
    fn rules_fire_in_priority_order() {
        let alerts = alerts_for(json!({
            "plotWidth": 5, "plotLength": 16, "budget": 20000,
            "occupants": 4, "floors": 4, "city": "Monterrey",
            "climate": "húmedo", "material": "madera"
        }));
        let kinds: Vec<_> = alerts.iter().map(|alert| alert.kind).collect();
        let mut sorted = kinds.clone();
        sorted.sort();
        assert_eq!(kinds, sorted);

        assert_eq!(kinds.first(), Some(&AlertKind::Budget));
        assert!(kinds.contains(&AlertKind::Shortfall));
        assert_eq!(regulatory_count(&alerts), 3);
        assert!(alerts
            .iter()
            .any(|alert| alert.message.starts_with("No fue posible incluir: ")));
        let site: Vec<_> = alerts
            .iter()
            .filter(|alert| alert.kind == AlertKind::Site)
            .map(|alert| alert.message.as_str())
            .collect();
        assert_eq!(site.len(), 4);
        assert_eq!(
            site[2],
            "Considera ventilaciones cruzadas para evitar acumulación de humedad."
        );
    }

    #[test]
    fn accessibility_needs_add_ramp_guidance() {
        let alerts = alerts_for(json!({
            "plotWidth": 12, "plotLength": 20, "budget": 650000,
            "occupants": 4, "floors": 1, "city": "Guadalajara",
            "needs": ["Accesibilidad"]
        }));
        assert_eq!(
            alerts,
            vec![Alert::new(
                AlertKind::Floors,
                "Asegura rampas con pendiente máxima de 8 grados y pasamanos dobles."
            )]
        );
    }

    #[test]
    fn accessibility_tags_count_from_any_tag_set() {
        for field in ["needs", "neededSpaces", "preferences"] {
            let mut raw = json!({
                "plotWidth": 8, "plotLength": 12, "budget": 900000,
                "occupants": 6, "floors": 2, "city": "Guadalajara"
            });
            raw[field] = json!(["rampa de acceso"]);
            let alerts = alerts_for(raw);
            assert!(
                alerts.iter().any(|alert| alert.message.starts_with("Asegura rampas")),
                "{field}: {alerts:?}"
            );
        }
    }

    #[test]
    fn unused_upper_floors_are_reported() {
        let alerts = alerts_for(json!({
            "plotWidth": 12, "plotLength": 20, "budget": 900000,
            "occupants": 2, "floors": 2, "city": "Puebla"
        }));
        assert!(alerts.iter().any(|alert| alert.kind == AlertKind::Floors
            && alert.message.contains("solo ocupa 1 de 2")));
        assert_eq!(regulatory_count(&alerts), 0);
    }
}
