use serde::{Deserialize, Serialize};

/// Plumbing/usage class of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomCategory {
    /// Rooms with water supply and drainage (kitchen, bathrooms, laundry)
    Wet,
    /// Habitable rooms without plumbing
    Dry,
    /// Stairs, halls and other circulation space
    Circulation,
}

impl RoomCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wet => "wet",
            Self::Dry => "dry",
            Self::Circulation => "circulation",
        }
    }
}

/// Cost multiplier tier applied to structural and finish work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishTier {
    Economy,
    Standard,
    Premium,
}

impl FinishTier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Economy => "economy",
            Self::Standard => "standard",
            Self::Premium => "premium",
        }
    }
}

/// Identifier of one of the three generated layout alternatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionId {
    A,
    B,
    C,
}

impl OptionId {
    pub const ALL: [Self; 3] = [Self::A, Self::B, Self::C];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoomArchetype {
    pub name: String,
    pub category: RoomCategory,
    /// Smallest acceptable area (m²)
    pub min_area: f64,
    /// Preferred area as a multiple of `min_area`
    pub ideal_area_ratio: f64,
    /// Lower is more essential
    pub priority: u32,
    /// Narrowest acceptable side (m)
    pub min_width: f64,
    /// Preferred width:depth ratio
    pub aspect: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guide: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl RoomArchetype {
    /// Target area under a profile's area multiplier, never below the minimum.
    #[must_use]
    pub fn target_area(&self, multiplier: f64) -> f64 {
        self.min_area * (self.ideal_area_ratio * multiplier).max(1.0)
    }

    pub(crate) fn matches(&self, tag: &str) -> bool {
        self.name == tag || self.aliases.iter().any(|alias| alias.to_lowercase() == tag)
    }
}

/// Weighting profile behind one layout option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileSpec {
    pub id: OptionId,
    pub name: String,
    pub description: String,
    pub area_multiplier: f64,
    pub finish_tier: FinishTier,
    #[serde(default)]
    pub extra_circulation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBasis {
    /// Quantity = room floor area
    FloorArea,
    /// Quantity = room perimeter × story height
    WallArea,
    /// Quantity = one per room
    PerRoom,
}

/// Static unit-price line applied to every matching room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitPrice {
    pub name: String,
    pub unit: String,
    pub unit_cost: f64,
    pub basis: PriceBasis,
    #[serde(default = "default_factor")]
    pub factor: f64,
    /// Empty means every category
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<RoomCategory>,
}

impl UnitPrice {
    #[must_use]
    pub fn applies_to(&self, category: RoomCategory) -> bool {
        self.categories.is_empty() || self.categories.contains(&category)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Material {
    pub name: String,
    pub base_cost_per_m2: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Climate {
    pub name: String,
    pub cost_factor: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
}

/// How a stated preference is satisfied by a layout option.
///
/// Both conditions must hold when present; a rule with neither is always met.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreferenceRule {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of_rooms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finish_tiers: Vec<FinishTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManualStageSpec {
    pub level: String,
    pub title: String,
    pub description: String,
    pub guide: String,
    /// Number of leading bill-of-materials lines relevant to this stage; all when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_lines: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Locality {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct City {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub solar: String,
    #[serde(default)]
    pub localities: Vec<Locality>,
}

impl City {
    #[must_use]
    pub fn locality(&self, name: &str) -> Option<&Locality> {
        let needle = name.trim().to_lowercase();
        self.localities
            .iter()
            .find(|locality| locality.name.to_lowercase() == needle)
    }
}

const fn default_factor() -> f64 {
    1.0
}
