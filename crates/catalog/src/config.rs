use serde::{Deserialize, Serialize};

use crate::model::FinishTier;

/// Footprint allowances applied to every floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageConfig {
    /// Fraction of the plot that may be built on
    pub max_coverage_ratio: f64,
    /// Fraction of the covered area reserved for circulation
    pub circulation_allowance: f64,
    /// Width of the wet-room column anchored at x = 0 (m)
    pub plumbing_column_width: f64,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            max_coverage_ratio: 0.85,
            circulation_allowance: 0.15,
            plumbing_column_width: 2.5,
        }
    }
}

/// Budget thresholds and finish-tier cost multipliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    pub low_budget_threshold: f64,
    pub high_budget_threshold: f64,
    pub economy: f64,
    pub standard: f64,
    pub premium: f64,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            low_budget_threshold: 300_000.0,
            high_budget_threshold: 800_000.0,
            economy: 1.0,
            standard: 1.3,
            premium: 1.7,
        }
    }
}

impl TierConfig {
    #[must_use]
    pub fn tier_for_budget(&self, budget: f64) -> FinishTier {
        if budget < self.low_budget_threshold {
            FinishTier::Economy
        } else if budget > self.high_budget_threshold {
            FinishTier::Premium
        } else {
            FinishTier::Standard
        }
    }

    #[must_use]
    pub const fn multiplier(&self, tier: FinishTier) -> f64 {
        match tier {
            FinishTier::Economy => self.economy,
            FinishTier::Standard => self.standard,
            FinishTier::Premium => self.premium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostConfig {
    pub base_cost_per_m2: f64,
    pub contingency_rate: f64,
    /// Floor-to-floor height (m)
    pub story_height: f64,
    /// Budget multiple beyond which non-essential rooms are dropped
    pub budget_stretch: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            base_cost_per_m2: 4500.0,
            contingency_rate: 0.08,
            story_height: 2.8,
            budget_stretch: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub preference_weight: f64,
    pub budget_weight: f64,
    pub viability_budget_weight: f64,
    pub viability_footprint_weight: f64,
    pub viability_regulatory_weight: f64,
    pub excellent_threshold: f64,
    pub acceptable_threshold: f64,
    /// Subtracted from the regulatory factor per regulatory alert
    pub regulatory_penalty: f64,
    /// Rooms at or below this priority survive budget-driven drops
    pub essential_priority: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            preference_weight: 0.6,
            budget_weight: 0.4,
            viability_budget_weight: 0.5,
            viability_footprint_weight: 0.35,
            viability_regulatory_weight: 0.15,
            excellent_threshold: 0.8,
            acceptable_threshold: 0.5,
            regulatory_penalty: 0.25,
            essential_priority: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulationConfig {
    pub max_floors: u32,
    pub min_lot_area: f64,
    pub min_plot_width: f64,
    pub max_plot_aspect: f64,
}

impl Default for RegulationConfig {
    fn default() -> Self {
        Self {
            max_floors: 3,
            min_lot_area: 90.0,
            min_plot_width: 6.0,
            max_plot_aspect: 3.0,
        }
    }
}

/// Archetype names used by the room-program policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramConfig {
    pub primary_bedroom: String,
    pub bedroom: String,
    pub bathroom: String,
    pub kitchen: String,
    pub living: String,
    pub stair: String,
    pub fallback: String,
    pub occupants_per_bedroom: u32,
    pub occupants_per_bathroom: u32,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            primary_bedroom: "recámara principal".to_string(),
            bedroom: "recámara".to_string(),
            bathroom: "baño".to_string(),
            kitchen: "cocina".to_string(),
            living: "sala".to_string(),
            stair: "escalera".to_string(),
            fallback: "general".to_string(),
            occupants_per_bedroom: 2,
            occupants_per_bathroom: 4,
        }
    }
}

/// Canned site recommendations keyed by terrain bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SiteConfig {
    pub small_area: f64,
    pub medium_area: f64,
    pub base: Vec<String>,
    pub small: String,
    pub medium: String,
    pub large: String,
}
