//! Format-agnostic scene graph for the selected option.
//!
//! Nothing here makes layout decisions: rooms are serialized as typed
//! primitives and per-floor boxes. Turning a scene into SVG (or anything else)
//! is left to the boundary.

use std::collections::BTreeMap;

use construye_catalog::RoomCategory;
use serde::{Deserialize, Serialize};

use crate::types::{round_to, Orientation, Room};

pub const SCALE: &str = "1:100";

const DOOR_WIDTH: f64 = 0.9;
const WINDOW_MAX_WIDTH: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpeningKind {
    Door,
    Window,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Primitive {
    #[serde(rename_all = "camelCase")]
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: String,
        stroke: String,
        interaction_key: String,
    },
    /// Centred on `(x, y)`; `detail` goes on a second line.
    Label {
        x: f64,
        y: f64,
        text: String,
        detail: String,
    },
    /// A wall segment from `(x1, y)` to `(x2, y)`.
    Opening {
        opening: OpeningKind,
        x1: f64,
        x2: f64,
        y: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneLayer {
    pub floor_index: u32,
    pub primitives: Vec<Primitive>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    pub name: String,
    pub category: RoomCategory,
    pub area_label: String,
    pub dimension_label: String,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compass {
    pub facing: Orientation,
    pub north_rotation_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint2D {
    pub scene: Vec<SceneLayer>,
    pub rooms: Vec<Room>,
    pub legend: Vec<LegendEntry>,
    pub scale: String,
    pub orientation: Compass,
}

impl Blueprint2D {
    #[must_use]
    pub fn layer(&self, floor_index: u32) -> Option<&SceneLayer> {
        self.scene.iter().find(|layer| layer.floor_index == floor_index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub label: String,
    pub floor_index: u32,
    /// Bounding box of the floor's rooms along x
    pub width: f64,
    /// Bounding box along y
    pub length: f64,
    pub height: f64,
    pub elevation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint3D {
    pub volumes: Vec<Volume>,
    pub render_hint: String,
}

#[must_use]
pub fn area_label(area: f64) -> String {
    format!("{area:.1} m²")
}

fn floors(rooms: &[Room]) -> BTreeMap<u32, Vec<&Room>> {
    let mut by_floor: BTreeMap<u32, Vec<&Room>> = BTreeMap::new();
    for room in rooms {
        by_floor.entry(room.floor_index).or_default().push(room);
    }
    by_floor
}

fn room_primitives(room: &Room) -> [Primitive; 4] {
    let x = room.grid_position.x;
    let y = room.grid_position.y;
    let centre = x + room.width / 2.0;
    let door = DOOR_WIDTH.min(room.width * 0.8) / 2.0;
    let window = WINDOW_MAX_WIDTH.min(room.width * 0.5) / 2.0;
    [
        Primitive::Rect {
            x,
            y,
            width: room.width,
            height: room.height,
            fill: room.style.fill.clone(),
            stroke: room.style.stroke.clone(),
            interaction_key: room.interaction_key(),
        },
        Primitive::Label {
            x: round_to(centre, 2),
            y: round_to(y + room.height / 2.0, 2),
            text: room.name.clone(),
            detail: area_label(room.area),
        },
        Primitive::Opening {
            opening: OpeningKind::Door,
            x1: round_to(centre - door, 2),
            x2: round_to(centre + door, 2),
            y: round_to(y + room.height, 2),
        },
        Primitive::Opening {
            opening: OpeningKind::Window,
            x1: round_to(centre - window, 2),
            x2: round_to(centre + window, 2),
            y,
        },
    ]
}

/// Serializes placed rooms into per-floor layers plus a legend.
#[must_use]
pub fn blueprint_2d(rooms: &[Room], facing: Orientation) -> Blueprint2D {
    let scene = floors(rooms)
        .into_iter()
        .map(|(floor_index, rooms)| SceneLayer {
            floor_index,
            primitives: rooms.into_iter().flat_map(room_primitives).collect(),
        })
        .collect();
    let legend = rooms
        .iter()
        .map(|room| LegendEntry {
            name: room.name.clone(),
            category: room.category,
            area_label: area_label(room.area),
            dimension_label: format!("{:.2} × {:.2} m", room.width, room.height),
            color: room.style.fill.clone(),
        })
        .collect();

    Blueprint2D {
        scene,
        rooms: rooms.to_vec(),
        legend,
        scale: SCALE.to_string(),
        orientation: Compass {
            facing,
            north_rotation_deg: facing.north_rotation_deg(),
        },
    }
}

/// One stacked box per floor that holds rooms.
#[must_use]
pub fn blueprint_3d(rooms: &[Room], story_height: f64) -> Blueprint3D {
    let volumes = floors(rooms)
        .into_iter()
        .map(|(floor_index, rooms)| {
            let min_x = rooms.iter().map(|r| r.grid_position.x).fold(f64::INFINITY, f64::min);
            let min_y = rooms.iter().map(|r| r.grid_position.y).fold(f64::INFINITY, f64::min);
            let max_x = rooms
                .iter()
                .map(|r| r.grid_position.x + r.width)
                .fold(f64::NEG_INFINITY, f64::max);
            let max_y = rooms
                .iter()
                .map(|r| r.grid_position.y + r.height)
                .fold(f64::NEG_INFINITY, f64::max);
            Volume {
                label: format!("Nivel {}", floor_index + 1),
                floor_index,
                width: round_to(max_x - min_x, 2),
                length: round_to(max_y - min_y, 2),
                height: story_height,
                elevation: round_to(f64::from(floor_index) * story_height, 2),
            }
        })
        .collect();

    Blueprint3D {
        volumes,
        render_hint: format!(
            "Volúmenes apilados por nivel con altura de entrepiso de {story_height:.1} m"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GridPosition, RoomStyle};
    use pretty_assertions::assert_eq;

    fn room(name: &str, category: RoomCategory, at: (f64, f64), size: (f64, f64), floor: u32) -> Room {
        Room {
            name: name.to_string(),
            archetype: name.to_lowercase(),
            category,
            grid_position: GridPosition { x: at.0, y: at.1 },
            width: size.0,
            height: size.1,
            area: round_to(size.0 * size.1, 1),
            floor_index: floor,
            style: RoomStyle::for_category(category),
            guide: None,
        }
    }

    fn sample() -> Vec<Room> {
        vec![
            room("Cocina", RoomCategory::Wet, (0.0, 0.0), (2.5, 4.0), 0),
            room("Sala", RoomCategory::Dry, (2.5, 0.0), (4.0, 4.5), 0),
            room("Escalera", RoomCategory::Circulation, (2.5, 0.0), (2.0, 2.5), 1),
            room("Recámara", RoomCategory::Dry, (4.5, 0.0), (3.0, 3.8), 1),
        ]
    }

    #[test]
    fn one_layer_per_floor_with_four_primitives_per_room() {
        let plan = blueprint_2d(&sample(), Orientation::Sur);
        assert_eq!(plan.scene.len(), 2);
        assert_eq!(plan.layer(0).unwrap().primitives.len(), 8);
        assert_eq!(plan.scale, "1:100");
        assert_eq!(plan.orientation.north_rotation_deg, 180.0);
        assert_eq!(plan.rooms.len(), 4);
    }

    #[test]
    fn rect_and_openings_follow_the_room() {
        let plan = blueprint_2d(&sample(), Orientation::Norte);
        let primitives = &plan.layer(0).unwrap().primitives;
        assert_eq!(
            primitives[0],
            Primitive::Rect {
                x: 0.0,
                y: 0.0,
                width: 2.5,
                height: 4.0,
                fill: "#bae6fd".to_string(),
                stroke: "#1f2937".to_string(),
                interaction_key: "cocina".to_string(),
            }
        );
        assert_eq!(
            primitives[2],
            Primitive::Opening {
                opening: OpeningKind::Door,
                x1: 0.8,
                x2: 1.7,
                y: 4.0,
            }
        );
        assert_eq!(
            primitives[3],
            Primitive::Opening {
                opening: OpeningKind::Window,
                x1: 0.65,
                x2: 1.85,
                y: 0.0,
            }
        );
    }

    #[test]
    fn legend_labels() {
        let plan = blueprint_2d(&sample(), Orientation::Norte);
        assert_eq!(
            plan.legend[1],
            LegendEntry {
                name: "Sala".to_string(),
                category: RoomCategory::Dry,
                area_label: "18.0 m²".to_string(),
                dimension_label: "4.00 × 4.50 m".to_string(),
                color: "#bbf7d0".to_string(),
            }
        );
    }

    #[test]
    fn volumes_stack_by_floor() {
        let massing = blueprint_3d(&sample(), 2.8);
        assert_eq!(
            massing.volumes,
            vec![
                Volume {
                    label: "Nivel 1".to_string(),
                    floor_index: 0,
                    width: 6.5,
                    length: 4.5,
                    height: 2.8,
                    elevation: 0.0,
                },
                Volume {
                    label: "Nivel 2".to_string(),
                    floor_index: 1,
                    width: 5.0,
                    length: 3.8,
                    height: 2.8,
                    elevation: 2.8,
                },
            ]
        );
    }

    #[test]
    fn primitives_serialize_with_a_kind_tag() {
        let plan = blueprint_2d(&sample(), Orientation::Norte);
        let value = serde_json::to_value(&plan.scene[0].primitives[0]).unwrap();
        assert_eq!(value["kind"], "rect");
        assert_eq!(value["interactionKey"], "cocina");
    }
}
