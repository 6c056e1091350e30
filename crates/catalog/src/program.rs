use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::model::RoomArchetype;

static COUNTED_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s+(.+)$").expect("valid counted-tag regex"));

/// Upper bound on instances of a single archetype requested through a tag.
const MAX_INSTANCES: u32 = 12;

/// One room the household needs, before any placement decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramRoom {
    /// Unique display name ("Recámara 2")
    pub name: String,
    /// Archetype priority plus instance index
    pub priority: u32,
    pub archetype: RoomArchetype,
}

/// Splits `"3 recámaras"` into `(3, "recámaras")`; untagged text counts once.
#[must_use]
pub fn split_count(tag: &str) -> (u32, &str) {
    let tag = tag.trim();
    match COUNTED_TAG.captures(tag) {
        Some(caps) => {
            let count = caps[1].parse::<u32>().unwrap_or(MAX_INSTANCES);
            let rest = caps.get(2).map_or(tag, |m| m.as_str().trim());
            (count.min(MAX_INSTANCES), rest)
        }
        None => (1, tag),
    }
}

#[must_use]
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Room program for a household: occupancy-driven bedrooms and bathrooms,
/// kitchen and living area, plus every requested space.
///
/// Requests for an archetype already in the base program raise its count to
/// `max(policy, requested)`. Unknown tags become generic rooms named after the tag.
#[must_use]
pub fn room_program<'a, I>(catalog: &Catalog, occupants: u32, needed_spaces: I) -> Vec<ProgramRoom>
where
    I: IntoIterator<Item = &'a str>,
{
    let policy = catalog.program();
    let occupants = occupants.max(1);
    let bedrooms = occupants.div_ceil(policy.occupants_per_bedroom).max(1);
    let bathrooms = occupants.div_ceil(policy.occupants_per_bathroom).max(1);

    // (archetype name, display base, count) in insertion order
    let mut wanted: Vec<(String, Option<String>, u32)> = vec![
        (policy.kitchen.clone(), None, 1),
        (policy.living.clone(), None, 1),
        (policy.primary_bedroom.clone(), None, 1),
        (policy.bedroom.clone(), None, bedrooms - 1),
        (policy.bathroom.clone(), None, bathrooms),
    ];

    for tag in needed_spaces {
        let (count, text) = split_count(tag);
        if text.is_empty() {
            continue;
        }
        match catalog.resolve_space(text) {
            Some(archetype) if archetype.name == policy.stair => {}
            Some(archetype)
                if archetype.name == policy.bedroom || archetype.name == policy.primary_bedroom =>
            {
                // the primary bedroom is one of the requested bedrooms
                let secondary = count.saturating_sub(1);
                raise(&mut wanted, &policy.bedroom, None, secondary);
            }
            Some(archetype) => raise(&mut wanted, &archetype.name, None, count),
            None => {
                let label = capitalize(&text.to_lowercase());
                raise(&mut wanted, &policy.fallback, Some(label), count);
            }
        }
    }

    let mut rooms = Vec::new();
    for (archetype_name, label, count) in wanted {
        let Some(archetype) = catalog.archetype(&archetype_name) else {
            log::warn!("room program skips unknown archetype '{archetype_name}'");
            continue;
        };
        let base = label.unwrap_or_else(|| capitalize(&archetype.name));
        for index in 0..count {
            let name = if count > 1 {
                format!("{base} {}", index + 1)
            } else {
                base.clone()
            };
            rooms.push(ProgramRoom {
                name,
                priority: archetype.priority + index,
                archetype: archetype.clone(),
            });
        }
    }
    rooms
}

fn raise(
    wanted: &mut Vec<(String, Option<String>, u32)>,
    archetype: &str,
    label: Option<String>,
    count: u32,
) {
    let existing = wanted
        .iter_mut()
        .find(|(name, existing_label, _)| name == archetype && *existing_label == label);
    match existing {
        Some((_, _, current)) => *current = (*current).max(count),
        None => wanted.push((archetype.to_string(), label, count)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(rooms: &[ProgramRoom]) -> Vec<&str> {
        rooms.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn splits_leading_counts() {
        assert_eq!(split_count("3 recámaras"), (3, "recámaras"));
        assert_eq!(split_count(" cochera "), (1, "cochera"));
        assert_eq!(split_count("400 baños"), (MAX_INSTANCES, "baños"));
    }

    #[test]
    fn base_program_follows_occupancy() {
        let rooms = room_program(Catalog::bundled(), 4, Vec::<&str>::new());
        assert_eq!(
            names(&rooms),
            vec!["Cocina", "Sala", "Recámara principal", "Recámara", "Baño"]
        );
    }

    #[test]
    fn single_occupant_still_gets_a_bedroom_and_bathroom() {
        let rooms = room_program(Catalog::bundled(), 1, Vec::<&str>::new());
        assert_eq!(names(&rooms), vec!["Cocina", "Sala", "Recámara principal", "Baño"]);
    }

    #[test]
    fn requests_raise_counts_and_number_instances() {
        let rooms = room_program(Catalog::bundled(), 4, ["3 recámaras", "2 baños", "cochera"]);
        assert_eq!(
            names(&rooms),
            vec![
                "Cocina",
                "Sala",
                "Recámara principal",
                "Recámara 1",
                "Recámara 2",
                "Baño 1",
                "Baño 2",
                "Cochera",
            ]
        );
        let second_bath = rooms.iter().find(|r| r.name == "Baño 2").unwrap();
        assert_eq!(second_bath.priority, 2);
    }

    #[test]
    fn requests_below_policy_do_not_shrink_program() {
        let rooms = room_program(Catalog::bundled(), 6, ["1 recámara"]);
        let bedrooms = rooms
            .iter()
            .filter(|r| r.archetype.name.starts_with("recámara"))
            .count();
        assert_eq!(bedrooms, 3);
    }

    #[test]
    fn unknown_tags_become_generic_rooms() {
        let rooms = room_program(Catalog::bundled(), 2, ["alberca", "stairs", "escaleras"]);
        let generic: Vec<_> = rooms.iter().filter(|r| r.archetype.name == "general").collect();
        assert_eq!(generic.len(), 2);
        assert_eq!(generic[0].name, "Alberca");
        assert_eq!(generic[1].name, "Stairs");
        assert!(rooms.iter().all(|r| r.archetype.name != "escalera"));
    }
}
