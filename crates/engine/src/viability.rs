use construye_catalog::Catalog;
use serde::{Deserialize, Serialize};

use crate::types::round_to;

pub const EXCELLENT: &str = "Excelente viabilidad";
pub const ACCEPTABLE: &str = "Aceptable con ajustes";
pub const NEEDS_REVIEW: &str = "Requiere revisión";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViabilityBreakdown {
    pub budget_adequacy: f64,
    pub footprint_adequacy: f64,
    pub regulatory_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViabilityResult {
    pub score: f64,
    pub message: String,
    pub breakdown: ViabilityBreakdown,
}

/// 1 while within budget, falling linearly to 0 at `stretch × budget`.
#[must_use]
pub fn budget_adequacy(cost: f64, budget: f64, stretch: f64) -> f64 {
    if cost <= budget {
        return 1.0;
    }
    let span = budget * (stretch - 1.0);
    if span <= 0.0 {
        return 0.0;
    }
    (1.0 - (cost - budget) / span).clamp(0.0, 1.0)
}

#[must_use]
pub fn footprint_adequacy(dropped: usize, required: usize) -> f64 {
    if dropped == 0 || required == 0 {
        return 1.0;
    }
    (1.0 - dropped as f64 / required as f64).clamp(0.0, 1.0)
}

#[must_use]
pub fn regulatory_factor(regulatory_alerts: usize, penalty: f64) -> f64 {
    (1.0 - penalty * regulatory_alerts as f64).max(0.0)
}

pub fn score(
    cost: f64,
    budget: f64,
    dropped: usize,
    required: usize,
    regulatory_alerts: usize,
    catalog: &Catalog,
) -> ViabilityResult {
    let scoring = catalog.scoring();
    let breakdown = ViabilityBreakdown {
        budget_adequacy: round_to(budget_adequacy(cost, budget, catalog.costs().budget_stretch), 4),
        footprint_adequacy: round_to(footprint_adequacy(dropped, required), 4),
        regulatory_factor: round_to(regulatory_factor(regulatory_alerts, scoring.regulatory_penalty), 4),
    };
    let score = round_to(
        scoring.viability_budget_weight * breakdown.budget_adequacy
            + scoring.viability_footprint_weight * breakdown.footprint_adequacy
            + scoring.viability_regulatory_weight * breakdown.regulatory_factor,
        4,
    )
    .clamp(0.0, 1.0);

    let message = if score >= scoring.excellent_threshold {
        EXCELLENT
    } else if score >= scoring.acceptable_threshold {
        ACCEPTABLE
    } else {
        NEEDS_REVIEW
    };

    ViabilityResult {
        score,
        message: message.to_string(),
        breakdown,
    }
}
