use std::fmt::Write as _;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::{
    CostConfig, CoverageConfig, ProgramConfig, RegulationConfig, ScoringConfig, SiteConfig,
    TierConfig,
};
use crate::model::{
    City, Climate, Locality, ManualStageSpec, Material, OptionId, PreferenceRule, ProfileSpec,
    RoomArchetype, UnitPrice,
};

macro_rules! apply_fields {
    ($target:expr, $raw:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = $raw.$field {
                $target.$field = value;
            }
        )*
    };
}

const BUILTIN_DEFAULT: &str = include_str!("../../../catalogs/default.toml");

pub const CATALOG_SCHEMA_VERSION: u32 = 1;

static BUNDLED: Lazy<Catalog> = Lazy::new(|| {
    Catalog::from_bytes("default", BUILTIN_DEFAULT.as_bytes())
        .expect("bundled default catalog must parse")
});

/// Immutable template library shared by every engine call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    name: String,
    coverage: CoverageConfig,
    tiers: TierConfig,
    costs: CostConfig,
    scoring: ScoringConfig,
    regulation: RegulationConfig,
    program: ProgramConfig,
    site: SiteConfig,
    profiles: Vec<ProfileSpec>,
    rooms: Vec<RoomArchetype>,
    unit_prices: Vec<UnitPrice>,
    materials: Vec<Material>,
    climates: Vec<Climate>,
    preference_rules: Vec<PreferenceRule>,
    manual: Vec<ManualStageSpec>,
    cities: Vec<City>,
    #[serde(skip)]
    fingerprint: String,
}

impl Catalog {
    /// Process-wide default catalog, parsed on first use.
    #[must_use]
    pub fn bundled() -> &'static Self {
        &BUNDLED
    }

    /// Parses a complete catalog document (JSON or TOML).
    pub fn from_bytes(catalog_name: &str, bytes: &[u8]) -> Result<Self> {
        let raw = parse_raw(bytes).with_context(|| {
            format!("Catalog '{catalog_name}' is not valid JSON/TOML configuration")
        })?;
        let mut catalog = Self::empty(catalog_name);
        catalog.apply(raw)?;
        catalog.finish()
    }

    /// Merges an overlay document on top of this catalog.
    pub fn overlay(&self, bytes: &[u8]) -> Result<Self> {
        let raw = parse_raw(bytes).context("Catalog overlay is not valid JSON/TOML configuration")?;
        let mut catalog = self.clone();
        catalog.apply(raw)?;
        catalog.finish()
    }

    /// Bundled catalog with the overlay file at `path` merged on top.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
        Self::bundled()
            .overlay(&bytes)
            .with_context(|| format!("Invalid catalog overlay {}", path.display()))
    }

    fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            coverage: CoverageConfig::default(),
            tiers: TierConfig::default(),
            costs: CostConfig::default(),
            scoring: ScoringConfig::default(),
            regulation: RegulationConfig::default(),
            program: ProgramConfig::default(),
            site: SiteConfig::default(),
            profiles: Vec::new(),
            rooms: Vec::new(),
            unit_prices: Vec::new(),
            materials: Vec::new(),
            climates: Vec::new(),
            preference_rules: Vec::new(),
            manual: Vec::new(),
            cities: Vec::new(),
            fingerprint: String::new(),
        }
    }

    fn apply(&mut self, raw: RawCatalog) -> Result<()> {
        if let Some(schema_version) = raw.schema_version {
            if schema_version != CATALOG_SCHEMA_VERSION {
                return Err(anyhow!(
                    "catalog.schema_version {schema_version} is not supported (expected {CATALOG_SCHEMA_VERSION})"
                ));
            }
        }
        if let Some(name) = raw.name.filter(|name| !name.trim().is_empty()) {
            self.name = name;
        }

        if let Some(section) = raw.coverage {
            apply_fields!(self.coverage, section, [
                max_coverage_ratio,
                circulation_allowance,
                plumbing_column_width,
            ]);
        }
        if let Some(section) = raw.tiers {
            apply_fields!(self.tiers, section, [
                low_budget_threshold,
                high_budget_threshold,
                economy,
                standard,
                premium,
            ]);
        }
        if let Some(section) = raw.costs {
            apply_fields!(self.costs, section, [
                base_cost_per_m2,
                contingency_rate,
                story_height,
                budget_stretch,
            ]);
        }
        if let Some(section) = raw.scoring {
            apply_fields!(self.scoring, section, [
                preference_weight,
                budget_weight,
                viability_budget_weight,
                viability_footprint_weight,
                viability_regulatory_weight,
                excellent_threshold,
                acceptable_threshold,
                regulatory_penalty,
                essential_priority,
            ]);
        }
        if let Some(section) = raw.regulation {
            apply_fields!(self.regulation, section, [
                max_floors,
                min_lot_area,
                min_plot_width,
                max_plot_aspect,
            ]);
        }
        if let Some(section) = raw.program {
            apply_fields!(self.program, section, [
                primary_bedroom,
                bedroom,
                bathroom,
                kitchen,
                living,
                stair,
                fallback,
                occupants_per_bedroom,
                occupants_per_bathroom,
            ]);
        }
        if let Some(section) = raw.site {
            apply_fields!(self.site, section, [
                small_area,
                medium_area,
                base,
                small,
                medium,
                large,
            ]);
        }

        for profile in raw.profiles {
            upsert_by(&mut self.profiles, profile, |p| p.id);
        }
        for room in raw.rooms {
            upsert_by(&mut self.rooms, room, |r| r.name.clone());
        }
        for price in raw.unit_prices {
            upsert_by(&mut self.unit_prices, price, |p| p.name.clone());
        }
        for material in raw.materials {
            upsert_by(&mut self.materials, material, |m| m.name.clone());
        }
        for climate in raw.climates {
            upsert_by(&mut self.climates, climate, |c| c.name.clone());
        }
        for rule in raw.preference_rules {
            upsert_by(&mut self.preference_rules, rule, |r| r.tag.clone());
        }
        for stage in raw.manual {
            upsert_by(&mut self.manual, stage, |s| s.level.clone());
        }
        for city in raw.cities {
            self.merge_city(city)?;
        }
        Ok(())
    }

    fn merge_city(&mut self, raw: RawCity) -> Result<()> {
        if let Some(existing) = self.cities.iter_mut().find(|city| city.name == raw.name) {
            apply_fields!(existing, raw, [lat, lng, solar]);
            for locality in raw.localities {
                upsert_by(&mut existing.localities, locality, |l| l.name.clone());
            }
            return Ok(());
        }

        let name = raw.name;
        let (Some(lat), Some(lng), Some(solar)) = (raw.lat, raw.lng, raw.solar) else {
            return Err(anyhow!("cities.{name}: lat, lng and solar are required for a new city"));
        };
        self.cities.push(City {
            name,
            lat,
            lng,
            solar,
            localities: raw.localities,
        });
        Ok(())
    }

    fn finish(mut self) -> Result<Self> {
        self.validate()
            .with_context(|| format!("Invalid catalog '{}'", self.name))?;
        let bytes = serde_json::to_vec(&self).context("Failed to serialize catalog")?;
        self.fingerprint = sha256_hex(&bytes);
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        for id in OptionId::ALL {
            let count = self.profiles.iter().filter(|p| p.id == id).count();
            if count != 1 {
                return Err(anyhow!("profiles must define option {} exactly once", id.as_str()));
            }
        }
        for profile in &self.profiles {
            if profile.area_multiplier <= 0.0 {
                return Err(anyhow!(
                    "profiles.{}.area_multiplier must be positive",
                    profile.id.as_str()
                ));
            }
            let circulation = self.coverage.circulation_allowance + profile.extra_circulation;
            if !(0.0..1.0).contains(&circulation) {
                return Err(anyhow!(
                    "profiles.{}: total circulation allowance must be in [0, 1)",
                    profile.id.as_str()
                ));
            }
        }

        let ratio = self.coverage.max_coverage_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(anyhow!("coverage.max_coverage_ratio must be in (0, 1]"));
        }
        if self.coverage.plumbing_column_width <= 0.0 {
            return Err(anyhow!("coverage.plumbing_column_width must be positive"));
        }
        if self.tiers.low_budget_threshold > self.tiers.high_budget_threshold {
            return Err(anyhow!(
                "tiers.low_budget_threshold must not exceed tiers.high_budget_threshold"
            ));
        }
        if self.costs.base_cost_per_m2 <= 0.0 || self.costs.story_height <= 0.0 {
            return Err(anyhow!("costs.base_cost_per_m2 and costs.story_height must be positive"));
        }
        if self.costs.contingency_rate < 0.0 || self.costs.budget_stretch <= 0.0 {
            return Err(anyhow!("costs.contingency_rate and costs.budget_stretch are out of range"));
        }
        if self.program.occupants_per_bedroom == 0 || self.program.occupants_per_bathroom == 0 {
            return Err(anyhow!("program occupant ratios must be at least 1"));
        }

        for room in &self.rooms {
            if room.min_area <= 0.0 || room.min_width <= 0.0 || room.aspect <= 0.0 {
                return Err(anyhow!(
                    "rooms.{}: min_area, min_width and aspect must be positive",
                    room.name
                ));
            }
            if room.ideal_area_ratio < 1.0 {
                return Err(anyhow!("rooms.{}.ideal_area_ratio must be at least 1", room.name));
            }
        }
        let program = &self.program;
        for (key, name) in [
            ("primary_bedroom", &program.primary_bedroom),
            ("bedroom", &program.bedroom),
            ("bathroom", &program.bathroom),
            ("kitchen", &program.kitchen),
            ("living", &program.living),
            ("stair", &program.stair),
            ("fallback", &program.fallback),
        ] {
            if self.archetype(name).is_none() {
                return Err(anyhow!("program.{key} refers to unknown room '{name}'"));
            }
        }
        if self.cities.is_empty() {
            return Err(anyhow!("cities must not be empty"));
        }
        Ok(())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hex SHA-256 of the effective catalog content.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    #[must_use]
    pub const fn coverage(&self) -> &CoverageConfig {
        &self.coverage
    }

    #[must_use]
    pub const fn tiers(&self) -> &TierConfig {
        &self.tiers
    }

    #[must_use]
    pub const fn costs(&self) -> &CostConfig {
        &self.costs
    }

    #[must_use]
    pub const fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    #[must_use]
    pub const fn regulation(&self) -> &RegulationConfig {
        &self.regulation
    }

    #[must_use]
    pub const fn program(&self) -> &ProgramConfig {
        &self.program
    }

    #[must_use]
    pub const fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Profiles in option order A, B, C.
    #[must_use]
    pub fn profiles(&self) -> Vec<&ProfileSpec> {
        OptionId::ALL
            .iter()
            .filter_map(|id| self.profiles.iter().find(|p| p.id == *id))
            .collect()
    }

    #[must_use]
    pub fn rooms(&self) -> &[RoomArchetype] {
        &self.rooms
    }

    #[must_use]
    pub fn unit_prices(&self) -> &[UnitPrice] {
        &self.unit_prices
    }

    #[must_use]
    pub fn manual(&self) -> &[ManualStageSpec] {
        &self.manual
    }

    #[must_use]
    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    #[must_use]
    pub fn archetype(&self, name: &str) -> Option<&RoomArchetype> {
        self.rooms.iter().find(|room| room.name == name)
    }

    /// Resolves a free-text space tag to an archetype by name, alias or plural form.
    #[must_use]
    pub fn resolve_space(&self, tag: &str) -> Option<&RoomArchetype> {
        let needle = tag.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        let find = |candidate: &str| self.rooms.iter().find(|room| room.matches(candidate));
        find(&needle)
            .or_else(|| needle.strip_suffix("es").and_then(find))
            .or_else(|| needle.strip_suffix('s').and_then(find))
    }

    #[must_use]
    pub fn city(&self, name: &str) -> Option<&City> {
        let needle = name.trim().to_lowercase();
        self.cities
            .iter()
            .find(|city| city.name.to_lowercase() == needle)
    }

    /// Locality lookup scoped to a city.
    #[must_use]
    pub fn locality(&self, city: &str, locality: &str) -> Option<&Locality> {
        self.city(city).and_then(|city| city.locality(locality))
    }

    #[must_use]
    pub fn climate(&self, name: &str) -> Option<&Climate> {
        let needle = name.trim().to_lowercase();
        self.climates.iter().find(|c| c.name.to_lowercase() == needle)
    }

    #[must_use]
    pub fn material(&self, name: &str) -> Option<&Material> {
        let needle = name.trim().to_lowercase();
        self.materials.iter().find(|m| m.name.to_lowercase() == needle)
    }

    #[must_use]
    pub fn preference_rule(&self, tag: &str) -> Option<&PreferenceRule> {
        self.preference_rules.iter().find(|rule| rule.tag == tag)
    }

    /// Cost factor of a climate; unknown or absent climates are neutral.
    #[must_use]
    pub fn climate_factor(&self, climate: Option<&str>) -> f64 {
        climate
            .and_then(|name| self.climate(name))
            .map_or(1.0, |c| c.cost_factor)
    }
}

fn upsert_by<T, K: PartialEq>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> K) {
    let wanted = key(&item);
    match items.iter().position(|existing| key(existing) == wanted) {
        Some(index) => items[index] = item,
        None => items.push(item),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().fold(String::with_capacity(64), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}

fn parse_raw(bytes: &[u8]) -> Result<RawCatalog> {
    let value: serde_json::Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(json_err) => {
            let utf8 = std::str::from_utf8(bytes).map_err(|err| anyhow!("{json_err}; {err}"))?;
            let toml_value: toml::Value = toml::from_str(utf8).map_err(|toml_err| {
                anyhow!("Catalog is not valid JSON or TOML ({json_err}); TOML parse error: {toml_err}")
            })?;
            serde_json::to_value(toml_value)
                .map_err(|err| anyhow!("Failed to convert TOML catalog to JSON: {err}"))?
        }
    };
    if !value.is_object() {
        return Err(anyhow!("Catalog config must be a JSON object"));
    }
    serde_json::from_value(value).map_err(|err| anyhow!("Catalog parse error: {err}"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCatalog {
    schema_version: Option<u32>,
    name: Option<String>,
    coverage: Option<RawCoverage>,
    tiers: Option<RawTiers>,
    costs: Option<RawCosts>,
    scoring: Option<RawScoring>,
    regulation: Option<RawRegulation>,
    program: Option<RawProgram>,
    site: Option<RawSite>,
    #[serde(default)]
    profiles: Vec<ProfileSpec>,
    #[serde(default)]
    rooms: Vec<RoomArchetype>,
    #[serde(default)]
    unit_prices: Vec<UnitPrice>,
    #[serde(default)]
    materials: Vec<Material>,
    #[serde(default)]
    climates: Vec<Climate>,
    #[serde(default)]
    preference_rules: Vec<PreferenceRule>,
    #[serde(default)]
    manual: Vec<ManualStageSpec>,
    #[serde(default)]
    cities: Vec<RawCity>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCoverage {
    max_coverage_ratio: Option<f64>,
    circulation_allowance: Option<f64>,
    plumbing_column_width: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTiers {
    low_budget_threshold: Option<f64>,
    high_budget_threshold: Option<f64>,
    economy: Option<f64>,
    standard: Option<f64>,
    premium: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCosts {
    base_cost_per_m2: Option<f64>,
    contingency_rate: Option<f64>,
    story_height: Option<f64>,
    budget_stretch: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScoring {
    preference_weight: Option<f64>,
    budget_weight: Option<f64>,
    viability_budget_weight: Option<f64>,
    viability_footprint_weight: Option<f64>,
    viability_regulatory_weight: Option<f64>,
    excellent_threshold: Option<f64>,
    acceptable_threshold: Option<f64>,
    regulatory_penalty: Option<f64>,
    essential_priority: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRegulation {
    max_floors: Option<u32>,
    min_lot_area: Option<f64>,
    min_plot_width: Option<f64>,
    max_plot_aspect: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProgram {
    primary_bedroom: Option<String>,
    bedroom: Option<String>,
    bathroom: Option<String>,
    kitchen: Option<String>,
    living: Option<String>,
    stair: Option<String>,
    fallback: Option<String>,
    occupants_per_bedroom: Option<u32>,
    occupants_per_bathroom: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSite {
    small_area: Option<f64>,
    medium_area: Option<f64>,
    base: Option<Vec<String>>,
    small: Option<String>,
    medium: Option<String>,
    large: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCity {
    name: String,
    lat: Option<f64>,
    lng: Option<f64>,
    solar: Option<String>,
    #[serde(default)]
    localities: Vec<Locality>,
}
