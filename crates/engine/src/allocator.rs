//! Deterministic shelf-packing layout allocator.
//!
//! Rooms are sorted by `(priority, area desc, name)` and packed floor by floor
//! into the plot envelope. Wet rooms stack along a plumbing column at `x = 0`;
//! everything else fills shelves to the right of it. When the program does not
//! fit (footprint, budget or geometry) the least essential rooms are dropped and
//! reported instead of failing.

use std::cmp::Ordering;

use construye_catalog::{
    capitalize, Catalog, FinishTier, ProfileSpec, ProgramRoom, RoomArchetype, RoomCategory,
};
use log::debug;

use crate::estimator::structural_cost_per_m2;
use crate::normalizer::ProjectBrief;
use crate::types::{
    floor_to_tenth, round_to, Allocation, DropReason, DroppedRoom, GridPosition, Room, RoomStyle,
};

const EPS: f64 = 1e-9;

/// Widest width:depth ratio a room may be stretched to when closing a shelf.
const MAX_STRETCH_ASPECT: f64 = 3.0;

/// Buildable rectangle on every floor plus its area allowance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    /// Along x (m)
    pub width: f64,
    /// Along y, after the coverage ratio (m)
    pub length: f64,
    /// Room area allowed per floor (m²)
    pub usable_area: f64,
    pub column_width: f64,
}

impl Envelope {
    #[must_use]
    pub fn new(brief: &ProjectBrief, profile: &ProfileSpec, catalog: &Catalog) -> Self {
        let coverage = catalog.coverage();
        let circulation = coverage.circulation_allowance + profile.extra_circulation;
        Self {
            width: brief.plot_width,
            length: brief.plot_length * coverage.max_coverage_ratio,
            usable_area: brief.floor_area()
                * coverage.max_coverage_ratio
                * (1.0 - circulation).max(0.0),
            column_width: coverage.plumbing_column_width.min(brief.plot_width / 2.0),
        }
    }
}

/// Built area the budget can pay for at a finish tier, stretch included.
#[must_use]
pub fn affordable_area(brief: &ProjectBrief, tier: FinishTier, catalog: &Catalog) -> f64 {
    let costs = catalog.costs();
    let per_m2 = structural_cost_per_m2(brief, tier, catalog) * (1.0 + costs.contingency_rate);
    brief.budget * costs.budget_stretch / per_m2
}

/// Packs a room program into the plot under one weighting profile.
#[must_use]
pub fn allocate(
    program: &[ProgramRoom],
    brief: &ProjectBrief,
    profile: &ProfileSpec,
    catalog: &Catalog,
) -> Allocation {
    let envelope = Envelope::new(brief, profile, catalog);
    let mut candidates: Vec<Candidate<'_>> = program
        .iter()
        .map(|room| Candidate::new(room, profile.area_multiplier))
        .collect();
    candidates.sort_by(placement_order);
    let required_count = candidates.len();

    let affordable = affordable_area(brief, profile.finish_tier, catalog);
    let essential = catalog.scoring().essential_priority;
    let mut dropped = Vec::new();
    while total_min(&candidates) > affordable + EPS {
        let Some(index) = candidates.iter().rposition(|c| c.priority > essential) else {
            break;
        };
        let candidate = candidates.remove(index);
        debug!(
            "option {}: budget cap {affordable:.1} m² drops {}",
            profile.id.as_str(),
            candidate.name
        );
        dropped.push(DroppedRoom {
            name: candidate.name,
            reason: DropReason::Budget,
        });
    }

    let single = pack(&candidates, &envelope, affordable, 1, None);
    let packed = if single.dropped.is_empty() || brief.floors == 1 {
        single
    } else {
        let stair = catalog.archetype(&catalog.program().stair);
        debug!(
            "option {}: ground floor overflows, packing across {} floors",
            profile.id.as_str(),
            brief.floors
        );
        pack(&candidates, &envelope, affordable, brief.floors, stair)
    };
    dropped.extend(packed.dropped);

    Allocation {
        rooms: packed.rooms,
        dropped,
        floors_used: packed.floors_used,
        required_count,
        usable_area: round_to(envelope.usable_area, 2),
    }
}

#[derive(Debug, Clone)]
struct Candidate<'a> {
    name: String,
    priority: u32,
    archetype: &'a RoomArchetype,
    min_area: f64,
    target_area: f64,
}

impl<'a> Candidate<'a> {
    fn new(room: &'a ProgramRoom, multiplier: f64) -> Self {
        Self {
            name: room.name.clone(),
            priority: room.priority,
            archetype: &room.archetype,
            min_area: room.archetype.min_area,
            target_area: room.archetype.target_area(multiplier),
        }
    }
}

fn placement_order(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| b.target_area.total_cmp(&a.target_area))
        .then_with(|| a.name.cmp(&b.name))
}

fn total_min(candidates: &[Candidate<'_>]) -> f64 {
    candidates.iter().map(|c| c.min_area).sum()
}

struct Packed {
    rooms: Vec<Room>,
    dropped: Vec<DroppedRoom>,
    floors_used: u32,
}

#[derive(Debug, Clone)]
struct SizedRoom<'a> {
    candidate: Candidate<'a>,
    area: f64,
}

fn pack(
    candidates: &[Candidate<'_>],
    envelope: &Envelope,
    affordable: f64,
    floors: u32,
    stair: Option<&RoomArchetype>,
) -> Packed {
    let stair_area = stair.map_or(0.0, |s| s.min_area);
    let room_capacity = (envelope.usable_area - stair_area).max(0.0);
    let capacity = room_capacity * f64::from(floors);

    let mut queue = candidates.to_vec();
    let mut dropped = Vec::new();
    while total_min(&queue) > capacity + EPS {
        let Some(candidate) = queue.pop() else {
            break;
        };
        debug!("footprint {capacity:.1} m² drops {}", candidate.name);
        dropped.push(DroppedRoom {
            name: candidate.name,
            reason: DropReason::Footprint,
        });
    }

    let sum_min = total_min(&queue);
    let sum_target: f64 = queue.iter().map(|c| c.target_area).sum();
    let cap = capacity.min(affordable.max(sum_min));
    let k = if sum_target - sum_min > EPS {
        ((cap - sum_min) / (sum_target - sum_min)).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let mut pending: Vec<SizedRoom<'_>> = queue
        .into_iter()
        .map(|candidate| {
            let area = floor_to_tenth(
                candidate.min_area + k * (candidate.target_area - candidate.min_area),
            )
            .max(candidate.min_area);
            SizedRoom { candidate, area }
        })
        .collect();

    let mut rooms = Vec::new();
    for floor_index in 0..floors {
        if pending.is_empty() {
            break;
        }
        let mut floor = FloorPlan::new(envelope, floor_index, room_capacity + stair_area);
        if let Some(stair) = stair {
            floor.reserve_stair(stair);
        }

        let (wet, dry): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|item| item.candidate.archetype.category == RoomCategory::Wet);
        let mut shelf_queue = Vec::new();
        for item in wet {
            if !floor.place(&item, Slot::Column) {
                shelf_queue.push(item);
            }
        }
        shelf_queue.extend(dry);

        let mut deferred = Vec::new();
        for item in shelf_queue {
            if !floor.place(&item, Slot::Shelf) {
                debug!("floor {floor_index}: deferring {}", item.candidate.name);
                deferred.push(item);
            }
        }
        deferred.sort_by(|a, b| placement_order(&a.candidate, &b.candidate));
        pending = deferred;
        rooms.extend(floor.finish());
    }
    for item in pending {
        debug!("no floor can hold {}", item.candidate.name);
        dropped.push(DroppedRoom {
            name: item.candidate.name,
            reason: DropReason::Placement,
        });
    }

    let is_stair = |room: &Room| stair.is_some_and(|s| room.archetype == s.name);
    let highest = rooms
        .iter()
        .filter(|room| !is_stair(room))
        .map(|room| room.floor_index)
        .max();
    match highest {
        Some(0) | None => rooms.retain(|room| !is_stair(room)),
        Some(top) => rooms.retain(|room| !is_stair(room) || room.floor_index <= top),
    }

    Packed {
        floors_used: highest.map_or(0, |top| top + 1),
        rooms,
        dropped,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Column,
    Shelf,
}

#[derive(Debug, Clone, Copy)]
struct Rect {
    x: f64,
    y: f64,
    width: f64,
    depth: f64,
}

struct Placed<'a> {
    name: String,
    archetype: &'a RoomArchetype,
    area: f64,
    rect: Rect,
}

struct Shelf {
    y: f64,
    cursor: f64,
    /// Indices into `FloorPlan::placed`
    members: Vec<usize>,
}

struct FloorPlan<'e, 'a> {
    envelope: &'e Envelope,
    floor_index: u32,
    capacity: f64,
    used: f64,
    column_y: f64,
    shelf: Shelf,
    placed: Vec<Placed<'a>>,
}

impl<'e, 'a> FloorPlan<'e, 'a> {
    fn new(envelope: &'e Envelope, floor_index: u32, capacity: f64) -> Self {
        Self {
            envelope,
            floor_index,
            capacity,
            used: 0.0,
            column_y: 0.0,
            shelf: Shelf {
                y: 0.0,
                cursor: envelope.column_width,
                members: Vec::new(),
            },
            placed: Vec::new(),
        }
    }

    fn shelf_left(&self) -> f64 {
        self.envelope.column_width
    }

    /// Puts the stair first on the first shelf so it sits at the same spot on every floor.
    fn reserve_stair(&mut self, stair: &'a RoomArchetype) {
        let area = stair.min_area;
        let width = (area * stair.aspect).sqrt().max(stair.min_width);
        let depth = area / width;
        if self.shelf_left() + width > self.envelope.width + EPS
            || depth > self.envelope.length + EPS
        {
            debug!("floor {}: stair does not fit the envelope", self.floor_index);
            return;
        }
        let rect = Rect {
            x: self.shelf_left(),
            y: 0.0,
            width,
            depth,
        };
        self.commit(capitalize(&stair.name), stair, area, rect, Slot::Shelf, false);
    }

    /// Places at the planned area, then at the archetype minimum.
    fn place(&mut self, item: &SizedRoom<'a>, slot: Slot) -> bool {
        let archetype = item.candidate.archetype;
        let mut attempts = vec![item.area];
        if item.candidate.min_area < item.area {
            attempts.push(item.candidate.min_area);
        }
        for area in attempts {
            if self.used + area > self.capacity + EPS {
                continue;
            }
            let fit = match slot {
                Slot::Column => self.try_column(area, archetype).map(|rect| (rect, false)),
                Slot::Shelf => self.try_shelf(area, archetype),
            };
            if let Some((rect, new_shelf)) = fit {
                self.commit(item.candidate.name.clone(), archetype, area, rect, slot, new_shelf);
                return true;
            }
        }
        false
    }

    fn try_column(&self, area: f64, archetype: &RoomArchetype) -> Option<Rect> {
        let width = self.envelope.column_width;
        if width + EPS < archetype.min_width {
            return None;
        }
        let depth = area / width;
        if self.column_y + depth > self.envelope.length + EPS {
            return None;
        }
        Some(Rect {
            x: 0.0,
            y: self.column_y,
            width,
            depth,
        })
    }

    fn try_shelf(&self, area: f64, archetype: &RoomArchetype) -> Option<(Rect, bool)> {
        let right = self.envelope.width;
        let natural = (area * archetype.aspect).sqrt();

        let available = right - self.shelf.cursor;
        if available + EPS >= archetype.min_width {
            let width = natural.min(available).max(archetype.min_width);
            let depth = area / width;
            if self.shelf.y + depth <= self.envelope.length + EPS {
                let rect = Rect {
                    x: self.shelf.cursor,
                    y: self.shelf.y,
                    width,
                    depth,
                };
                return Some((rect, false));
            }
        }
        if self.shelf.members.is_empty() {
            return None;
        }

        let region = right - self.shelf_left();
        if region + EPS < archetype.min_width {
            return None;
        }
        let y = self.shelf.y + self.closed_shelf_depth().0;
        let width = natural.min(region).max(archetype.min_width);
        let depth = area / width;
        if y + depth > self.envelope.length + EPS {
            return None;
        }
        let rect = Rect {
            x: self.shelf_left(),
            y,
            width,
            depth,
        };
        Some((rect, true))
    }

    /// Shelf depth once its last room is stretched across the leftover width,
    /// plus that room's stretched rectangle.
    fn closed_shelf_depth(&self) -> (f64, Option<(usize, Rect)>) {
        let mut stretched = None;
        if let Some(&last) = self.shelf.members.last() {
            let room = &self.placed[last];
            let gap = self.envelope.width - (room.rect.x + room.rect.width);
            if gap > EPS && room.archetype.category != RoomCategory::Circulation {
                let width = (room.rect.width + gap)
                    .min((MAX_STRETCH_ASPECT * room.area).sqrt())
                    .max(room.rect.width);
                stretched = Some((
                    last,
                    Rect {
                        width,
                        depth: room.area / width,
                        ..room.rect
                    },
                ));
            }
        }
        let depth = self
            .shelf
            .members
            .iter()
            .map(|&index| match stretched {
                Some((stretched_index, rect)) if stretched_index == index => rect.depth,
                _ => self.placed[index].rect.depth,
            })
            .fold(0.0, f64::max);
        (depth, stretched)
    }

    fn close_shelf(&mut self) {
        let (depth, stretched) = self.closed_shelf_depth();
        if let Some((index, rect)) = stretched {
            self.placed[index].rect = rect;
        }
        self.shelf = Shelf {
            y: self.shelf.y + depth,
            cursor: self.shelf_left(),
            members: Vec::new(),
        };
    }

    fn commit(
        &mut self,
        name: String,
        archetype: &'a RoomArchetype,
        area: f64,
        rect: Rect,
        slot: Slot,
        new_shelf: bool,
    ) {
        match slot {
            Slot::Column => self.column_y = rect.y + rect.depth,
            Slot::Shelf => {
                if new_shelf {
                    self.close_shelf();
                }
                self.shelf.cursor = rect.x + rect.width;
                self.shelf.members.push(self.placed.len());
            }
        }
        debug!(
            "floor {}: placed {name} at ({:.2}, {:.2}) {:.2}x{:.2}",
            self.floor_index, rect.x, rect.y, rect.width, rect.depth
        );
        self.used += area;
        self.placed.push(Placed {
            name,
            archetype,
            area,
            rect,
        });
    }

    fn finish(mut self) -> Vec<Room> {
        if !self.shelf.members.is_empty() {
            self.close_shelf();
        }
        let floor_index = self.floor_index;
        self.placed
            .into_iter()
            .map(|placed| Room {
                name: placed.name,
                archetype: placed.archetype.name.clone(),
                category: placed.archetype.category,
                grid_position: GridPosition {
                    x: round_to(placed.rect.x, 2),
                    y: round_to(placed.rect.y, 2),
                },
                width: round_to(placed.rect.width, 2),
                height: round_to(placed.rect.depth, 2),
                area: round_to(placed.area, 1),
                floor_index,
                style: RoomStyle::for_category(placed.archetype.category),
                guide: placed.archetype.guide.clone(),
            })
            .collect()
    }
}
