//! Idempotent blueprint seeding: upsert locations and hard exits into the
//! graph store, creating only what is missing.
//!
//! The delta is computed client-side against one snapshot of the store's
//! vertex and edge sets, so the store stays a dumb row sink. Idempotency is
//! structural: re-running an identical blueprint issues zero mutations.

use atlas_core::store::{
    EdgeRow, GraphStore, StoreError, StoreQuery, VertexRow, fetch_edges, fetch_vertices,
};
use atlas_core::world::{ExitAvailability, Location};
use std::collections::BTreeMap;

/// What one seeding run did, per mutation class. An identical re-run after a
/// successful seed reports [`SeedSummary::is_noop`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub locations_created: usize,
    pub locations_updated: usize,
    pub locations_unchanged: usize,
    pub exits_created: usize,
    pub exits_existing: usize,
    /// Exits whose (from, direction) slot already routes to a different
    /// destination. Never overwritten, only counted and warned about.
    pub exit_conflicts: usize,
    pub availability_added: usize,
    pub availability_skipped: usize,
}

impl SeedSummary {
    /// True when the run issued no mutations at all.
    pub fn is_noop(&self) -> bool {
        self.locations_created == 0
            && self.locations_updated == 0
            && self.exits_created == 0
            && self.availability_added == 0
    }
}

/// Seed a blueprint into the store. Existing locations get property updates
/// and an additive availability merge; existing exits are left untouched.
/// Callers flush the store afterwards if it is durable.
pub fn seed_blueprint<S: GraphStore + ?Sized>(
    store: &mut S,
    locations: &[Location],
) -> Result<SeedSummary, StoreError> {
    let vertices: BTreeMap<String, VertexRow> = fetch_vertices(store)?
        .into_iter()
        .map(|v| (v.id.clone(), v))
        .collect();
    // (from → direction → to), raw directions as stored.
    let mut edge_slots: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    for edge in fetch_edges(store)? {
        edge_slots
            .entry(edge.from)
            .or_default()
            .insert(edge.direction, edge.to);
    }

    let mut summary = SeedSummary::default();
    for location in locations {
        match vertices.get(&location.id) {
            None => {
                store.submit(StoreQuery::InsertVertex(VertexRow::from_location(location)))?;
                summary.locations_created += 1;
                summary.availability_added += location.exit_availability.pending.len()
                    + location.exit_availability.forbidden.len();
            }
            Some(existing) => {
                let props_changed = existing.name != location.name
                    || existing.description != location.description
                    || existing.tags != location.tags;
                let merged = merge_availability(
                    &location.id,
                    &existing.availability,
                    &location.exit_availability,
                    &edge_slots,
                    &mut summary,
                );
                let availability_grew = merged != existing.availability;
                if props_changed || availability_grew {
                    store.submit(StoreQuery::UpdateVertex(VertexRow {
                        id: location.id.clone(),
                        name: location.name.clone(),
                        description: location.description.clone(),
                        tags: location.tags.clone(),
                        availability: merged,
                    }))?;
                    summary.locations_updated += 1;
                } else {
                    summary.locations_unchanged += 1;
                }
            }
        }

        for exit in &location.exits {
            let slots = edge_slots.entry(location.id.clone()).or_default();
            match slots.get(exit.direction.as_str()) {
                None => {
                    if let Some(existing) = vertices.get(&location.id)
                        && (existing.availability.pending.contains_key(&exit.direction)
                            || existing.availability.forbidden.contains_key(&exit.direction))
                    {
                        // No deletion path exists, so the stale availability
                        // entry stays behind; make the overlap visible.
                        tracing::warn!(
                            "hard exit {} --{}--> {} overlaps a stored availability entry",
                            location.id,
                            exit.direction,
                            exit.to
                        );
                    }
                    store.submit(StoreQuery::InsertEdge(EdgeRow {
                        from: location.id.clone(),
                        direction: exit.direction.as_str().to_string(),
                        to: exit.to.clone(),
                    }))?;
                    slots.insert(exit.direction.as_str().to_string(), exit.to.clone());
                    summary.exits_created += 1;
                }
                Some(stored_to) if *stored_to == exit.to => {
                    summary.exits_existing += 1;
                }
                Some(stored_to) => {
                    tracing::warn!(
                        "exit conflict at {} --{}-->: store routes to {}, blueprint wants {}",
                        location.id,
                        exit.direction,
                        stored_to,
                        exit.to
                    );
                    summary.exit_conflicts += 1;
                }
            }
        }
    }

    Ok(summary)
}

/// Additive merge of blueprint availability into a stored vertex's map.
/// A direction covered in the store (hard exit, pending, or forbidden) keeps
/// its existing entry and counts as skipped.
fn merge_availability(
    location_id: &str,
    stored: &ExitAvailability,
    incoming: &ExitAvailability,
    edge_slots: &BTreeMap<String, BTreeMap<String, String>>,
    summary: &mut SeedSummary,
) -> ExitAvailability {
    let has_exit = |direction: &str| {
        edge_slots
            .get(location_id)
            .is_some_and(|slots| slots.contains_key(direction))
    };

    let mut merged = stored.clone();
    for (direction, reason) in &incoming.pending {
        if has_exit(direction.as_str())
            || merged.pending.contains_key(direction)
            || merged.forbidden.contains_key(direction)
        {
            summary.availability_skipped += 1;
        } else {
            merged.pending.insert(*direction, reason.clone());
            summary.availability_added += 1;
        }
    }
    for (direction, entry) in &incoming.forbidden {
        if has_exit(direction.as_str())
            || merged.pending.contains_key(direction)
            || merged.forbidden.contains_key(direction)
        {
            summary.availability_skipped += 1;
        } else {
            merged.forbidden.insert(*direction, entry.clone());
            summary.availability_added += 1;
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_core::direction::Direction;
    use atlas_core::store::MemoryStore;

    fn make_blueprint(json: &str) -> Vec<Location> {
        serde_json::from_str(json).unwrap()
    }

    fn two_location_blueprint() -> Vec<Location> {
        make_blueprint(
            r#"[
                {"id": "loc:a", "name": "A",
                 "exits": [{"direction": "north", "to": "loc:b"}],
                 "exitAvailability": {"pending": {"east": "unbuilt"}}},
                {"id": "loc:b", "name": "B",
                 "exits": [{"direction": "south", "to": "loc:a"}]}
            ]"#,
        )
    }

    #[test]
    fn test_first_seed_creates_everything() {
        let mut store = MemoryStore::new();
        let summary = seed_blueprint(&mut store, &two_location_blueprint()).unwrap();

        assert_eq!(summary.locations_created, 2);
        assert_eq!(summary.exits_created, 2);
        assert_eq!(summary.availability_added, 1);
        assert!(!summary.is_noop());
        assert_eq!(fetch_vertices(&mut store).unwrap().len(), 2);
        assert_eq!(fetch_edges(&mut store).unwrap().len(), 2);
    }

    #[test]
    fn test_identical_reseed_is_a_noop() {
        let mut store = MemoryStore::new();
        let blueprint = two_location_blueprint();
        seed_blueprint(&mut store, &blueprint).unwrap();

        let second = seed_blueprint(&mut store, &blueprint).unwrap();
        assert!(second.is_noop());
        assert_eq!(second.locations_unchanged, 2);
        assert_eq!(second.exits_existing, 2);
        assert_eq!(second.availability_skipped, 1);
        assert_eq!(fetch_vertices(&mut store).unwrap().len(), 2);
        assert_eq!(fetch_edges(&mut store).unwrap().len(), 2);
    }

    #[test]
    fn test_reseed_updates_changed_properties_without_new_rows() {
        let mut store = MemoryStore::new();
        let mut blueprint = two_location_blueprint();
        seed_blueprint(&mut store, &blueprint).unwrap();

        blueprint[0].name = "A, Rebuilt".to_string();
        let summary = seed_blueprint(&mut store, &blueprint).unwrap();
        assert_eq!(summary.locations_created, 0);
        assert_eq!(summary.locations_updated, 1);
        assert_eq!(summary.exits_created, 0);

        let vertices = fetch_vertices(&mut store).unwrap();
        let a = vertices.iter().find(|v| v.id == "loc:a").unwrap();
        assert_eq!(a.name, "A, Rebuilt");
    }

    #[test]
    fn test_availability_merge_never_overwrites_stored_coverage() {
        let mut store = MemoryStore::new();
        seed_blueprint(&mut store, &two_location_blueprint()).unwrap();

        // Same direction, different family: the stored pending entry wins.
        let update = make_blueprint(
            r#"[{"id": "loc:a", "name": "A",
                 "exitAvailability": {
                    "forbidden": {"east": {"reason": "now sealed"}},
                    "pending": {"west": "new trail"}
                 }}]"#,
        );
        let summary = seed_blueprint(&mut store, &update).unwrap();
        assert_eq!(summary.availability_added, 1);
        assert_eq!(summary.availability_skipped, 1);

        let vertices = fetch_vertices(&mut store).unwrap();
        let a = vertices.iter().find(|v| v.id == "loc:a").unwrap();
        assert_eq!(a.availability.pending[&Direction::East], "unbuilt");
        assert!(!a.availability.forbidden.contains_key(&Direction::East));
        assert!(a.availability.pending.contains_key(&Direction::West));
    }

    #[test]
    fn test_conflicting_exit_is_skipped_and_counted() {
        let mut store = MemoryStore::new();
        seed_blueprint(&mut store, &two_location_blueprint()).unwrap();

        let rerouted = make_blueprint(
            r#"[{"id": "loc:a", "name": "A",
                 "exits": [{"direction": "north", "to": "loc:elsewhere"}]}]"#,
        );
        let summary = seed_blueprint(&mut store, &rerouted).unwrap();
        assert_eq!(summary.exit_conflicts, 1);
        assert_eq!(summary.exits_created, 0);

        let edges = fetch_edges(&mut store).unwrap();
        let north = edges
            .iter()
            .find(|e| e.from == "loc:a" && e.direction == "north")
            .unwrap();
        assert_eq!(north.to, "loc:b");
    }

    #[test]
    fn test_seed_grows_world_incrementally() {
        let mut store = MemoryStore::new();
        seed_blueprint(&mut store, &two_location_blueprint()).unwrap();

        let mut extended = two_location_blueprint();
        extended.extend(make_blueprint(
            r#"[{"id": "loc:c", "name": "C",
                 "exits": [{"direction": "west", "to": "loc:a"}]}]"#,
        ));
        let summary = seed_blueprint(&mut store, &extended).unwrap();
        assert_eq!(summary.locations_created, 1);
        assert_eq!(summary.locations_unchanged, 2);
        assert_eq!(summary.exits_created, 1);
        assert_eq!(summary.exits_existing, 2);
    }
}
