//! Template library for the plan engine.
//!
//! A [`Catalog`] holds room archetypes, finish-tier multipliers, the unit-price
//! table, the city/locality table and every tuning constant the engine reads.
//! It is built once (bundled default plus an optional JSON/TOML overlay) and
//! passed by reference into each generation call; nothing mutates it afterwards.

mod catalog;
mod config;
mod model;
mod program;

pub use catalog::{Catalog, CATALOG_SCHEMA_VERSION};
pub use config::{
    CostConfig, CoverageConfig, ProgramConfig, RegulationConfig, ScoringConfig, SiteConfig,
    TierConfig,
};
pub use model::{
    City, Climate, FinishTier, Locality, ManualStageSpec, Material, OptionId, PreferenceRule,
    PriceBasis, ProfileSpec, RoomArchetype, RoomCategory, UnitPrice,
};
pub use program::{capitalize, room_program, split_count, ProgramRoom};
