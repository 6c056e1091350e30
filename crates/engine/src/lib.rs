//! Plan generation and feasibility engine.
//!
//! [`generate_plan`] is a pure function of a normalized [`ProjectBrief`] and a
//! [`construye_catalog::Catalog`]: it builds the room program, packs it under the
//! three catalog profiles, scores and costs each option, and assembles the
//! blueprint, alerts, site advice and build manual for the selected one.

mod alerts;
mod allocator;
mod cache;
mod error;
mod estimator;
mod manual;
mod normalizer;
mod pipeline;
mod ranker;
mod render;
mod site;
mod types;
mod viability;

pub use alerts::{generate_alerts, regulatory_count, Alert, AlertKind};
pub use allocator::{affordable_area, allocate, Envelope};
pub use cache::PlanCache;
pub use error::{EngineError, EstimationError, Result, ValidationError};
pub use estimator::{estimate, structural_cost_per_m2, BillOfMaterials, MaterialItem, STRUCTURE_LINE};
pub use manual::{build_manual, ManualStage};
pub use normalizer::{normalize, ProjectBrief};
pub use pipeline::{
    generate_from_payload, generate_plan, GeneratedPlan, Overview, Plans, SelectedPlan, Terrain,
};
pub use ranker::{budget_closeness, preference_satisfied, rank_options, select, LayoutOption, RankedOptions};
pub use render::{
    blueprint_2d, blueprint_3d, Blueprint2D, Blueprint3D, Compass, LegendEntry, OpeningKind,
    Primitive, SceneLayer, Volume, SCALE,
};
pub use site::{advise, terrain_bucket, Coordinates, SiteInfo, TerrainBucket};
pub use types::{
    Allocation, DropReason, DroppedRoom, GridPosition, Orientation, Room, RoomStyle,
};
pub use viability::{
    budget_adequacy, footprint_adequacy, regulatory_factor, ViabilityBreakdown, ViabilityResult,
    ACCEPTABLE, EXCELLENT, NEEDS_REVIEW,
};
