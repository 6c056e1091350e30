use construye_catalog::RoomCategory;
use serde::{Deserialize, Serialize};

/// Compass direction the plot's front faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Norte,
    Sur,
    Este,
    Oeste,
}

impl Orientation {
    pub const ALL: [Self; 4] = [Self::Norte, Self::Sur, Self::Este, Self::Oeste];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Norte => "norte",
            Self::Sur => "sur",
            Self::Este => "este",
            Self::Oeste => "oeste",
        }
    }

    /// Clockwise rotation of the north arrow in the rendered plan.
    #[must_use]
    pub const fn north_rotation_deg(self) -> f64 {
        match self {
            Self::Norte => 0.0,
            Self::Este => 90.0,
            Self::Sur => 180.0,
            Self::Oeste => 270.0,
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|o| o.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomStyle {
    pub fill: String,
    pub stroke: String,
}

impl RoomStyle {
    #[must_use]
    pub fn for_category(category: RoomCategory) -> Self {
        let fill = match category {
            RoomCategory::Wet => "#bae6fd",
            RoomCategory::Dry => "#bbf7d0",
            RoomCategory::Circulation => "#e2e8f0",
        };
        Self {
            fill: fill.to_string(),
            stroke: "#1f2937".to_string(),
        }
    }
}

/// A placed room. `width` runs along x, `height` along y (plan depth).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub name: String,
    /// Catalog archetype the room was built from
    pub archetype: String,
    pub category: RoomCategory,
    pub grid_position: GridPosition,
    pub width: f64,
    pub height: f64,
    /// m², rounded to 0.1
    pub area: f64,
    pub floor_index: u32,
    pub style: RoomStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guide: Option<String>,
}

impl Room {
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        2.0 * (self.width + self.height)
    }

    /// Lower-cased name used by clients to look up guides.
    #[must_use]
    pub fn interaction_key(&self) -> String {
        self.name.to_lowercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropReason {
    /// Minimum areas exceeded the usable footprint
    Footprint,
    /// Minimum areas exceeded what the budget can pay for
    Budget,
    /// No floor had room left for it
    Placement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedRoom {
    pub name: String,
    pub reason: DropReason,
}

impl DroppedRoom {
    #[must_use]
    pub fn alert(&self) -> String {
        format!("No fue posible incluir: {}", self.name)
    }
}

/// Outcome of one allocator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub rooms: Vec<Room>,
    pub dropped: Vec<DroppedRoom>,
    pub floors_used: u32,
    /// Rooms the program asked for, stairs excluded
    pub required_count: usize,
    /// Usable area per floor (m²)
    pub usable_area: f64,
}

impl Allocation {
    #[must_use]
    pub fn floor_area(&self, floor_index: u32) -> f64 {
        self.rooms
            .iter()
            .filter(|room| room.floor_index == floor_index)
            .map(|room| room.area)
            .sum()
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub(crate) fn floor_to_tenth(value: f64) -> f64 {
    // 1e-9 keeps 12.3 from flooring to 12.2 after float error
    ((value * 10.0) + 1e-9).floor() / 10.0
}
