//! Consistency scanner for the stored world graph.
//!
//! One pass over vertices and edges finds dangling exits, orphan
//! locations, and missing reciprocal passages. Orphans are advisory;
//! only the first two classes make a world unclean. A deliberately
//! one-way passage (a drop, a waterfall) still shows up as missing its
//! reciprocal: the scanner cannot tell intent from omission.

use atlas_core::direction::Direction;
use atlas_core::store::{GraphStore, StoreError, fetch_edges, fetch_vertices};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

/// An exit whose destination id is not a stored location.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingExit {
    pub from: String,
    /// Raw stored label; dangling exits may carry non-canonical directions.
    pub direction: String,
    pub to: String,
}

/// A location no edge touches and no anchor claims.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanLocation {
    pub id: String,
    pub name: String,
}

/// An exit whose destination has no passage back.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingReciprocal {
    pub from: String,
    pub to: String,
    pub direction: Direction,
    pub expected_reverse_direction: Direction,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub total_locations: usize,
    pub total_exits: usize,
    pub dangling_exits_count: usize,
    pub orphan_locations_count: usize,
    pub missing_reciprocal_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyReport {
    pub scanned_at: DateTime<Utc>,
    pub summary: ScanSummary,
    pub dangling_exits: Vec<DanglingExit>,
    pub orphan_locations: Vec<OrphanLocation>,
    pub missing_reciprocal_exits: Vec<MissingReciprocal>,
}

impl ConsistencyReport {
    /// Orphans never fail a scan; dangling and missing-reciprocal
    /// entries do.
    pub fn is_clean(&self) -> bool {
        self.dangling_exits.is_empty() && self.missing_reciprocal_exits.is_empty()
    }
}

/// Scan the stored world graph for structural anomalies.
///
/// Anchored location ids (hubs, intentional islands) are exempt from
/// orphan reporting. An empty store scans clean with all counts zero.
pub fn scan_world<S: GraphStore + ?Sized>(
    store: &mut S,
    anchors: &BTreeSet<String>,
) -> Result<ConsistencyReport, StoreError> {
    let vertices = fetch_vertices(store)?;
    let edges = fetch_edges(store)?;

    let vertex_ids: HashSet<&str> = vertices.iter().map(|v| v.id.as_str()).collect();

    // One pass over the edges builds everything the checks need: the
    // (source, direction) slot index over canonical edges, the set of
    // ids any edge touches, and the dangling list. Dangling edges still
    // occupy their slot; the passage exists even when its target does not.
    let mut slots: HashMap<(&str, Direction), &str> = HashMap::with_capacity(edges.len());
    let mut touched: HashSet<&str> = HashSet::new();
    let mut dangling = Vec::new();
    for edge in &edges {
        touched.insert(edge.from.as_str());
        touched.insert(edge.to.as_str());
        match edge.direction.parse::<Direction>() {
            Ok(direction) => {
                if let Some(previous) =
                    slots.insert((edge.from.as_str(), direction), edge.to.as_str())
                    && previous != edge.to
                {
                    tracing::warn!(
                        "duplicate exit slot {} --{}-->: keeping {}, dropping {}",
                        edge.from,
                        direction,
                        edge.to,
                        previous
                    );
                }
            }
            Err(_) => {
                tracing::warn!(
                    "edge {} --{}--> {} has a non-canonical direction, skipping reciprocity",
                    edge.from,
                    edge.direction,
                    edge.to
                );
            }
        }
        if !vertex_ids.contains(edge.to.as_str()) {
            dangling.push(DanglingExit {
                from: edge.from.clone(),
                direction: edge.direction.clone(),
                to: edge.to.clone(),
            });
        }
    }

    // Reciprocity holds when the destination's opposite-direction slot
    // routes straight back. Dangling and non-canonical edges are out of
    // scope here; they were already reported or warned about above.
    let mut missing = Vec::new();
    for edge in &edges {
        let Ok(direction) = edge.direction.parse::<Direction>() else {
            continue;
        };
        if !vertex_ids.contains(edge.to.as_str()) {
            continue;
        }
        let expected = direction.opposite();
        let reciprocal = slots.get(&(edge.to.as_str(), expected)).copied();
        if reciprocal != Some(edge.from.as_str()) {
            missing.push(MissingReciprocal {
                from: edge.from.clone(),
                to: edge.to.clone(),
                direction,
                expected_reverse_direction: expected,
            });
        }
    }

    let mut orphans: Vec<OrphanLocation> = vertices
        .iter()
        .filter(|v| !anchors.contains(&v.id) && !touched.contains(v.id.as_str()))
        .map(|v| OrphanLocation {
            id: v.id.clone(),
            name: v.name.clone(),
        })
        .collect();

    // Sort all three lists for deterministic reports.
    dangling.sort_by(|a, b| {
        (&a.from, &a.direction, &a.to).cmp(&(&b.from, &b.direction, &b.to))
    });
    orphans.sort_by(|a, b| a.id.cmp(&b.id));
    missing.sort_by(|a, b| (&a.from, a.direction).cmp(&(&b.from, b.direction)));

    let summary = ScanSummary {
        total_locations: vertices.len(),
        total_exits: edges.len(),
        dangling_exits_count: dangling.len(),
        orphan_locations_count: orphans.len(),
        missing_reciprocal_count: missing.len(),
    };

    Ok(ConsistencyReport {
        scanned_at: Utc::now(),
        summary,
        dangling_exits: dangling,
        orphan_locations: orphans,
        missing_reciprocal_exits: missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_core::store::{EdgeRow, MemoryStore, StoreQuery, VertexRow};

    fn make_world(vertices: &[(&str, &str)], edges: &[(&str, &str, &str)]) -> MemoryStore {
        let mut store = MemoryStore::new();
        for (id, name) in vertices {
            store
                .submit(StoreQuery::InsertVertex(VertexRow {
                    id: (*id).to_string(),
                    name: (*name).to_string(),
                    description: None,
                    tags: BTreeSet::new(),
                    availability: atlas_core::world::ExitAvailability::default(),
                }))
                .unwrap();
        }
        for (from, direction, to) in edges {
            store
                .submit(StoreQuery::InsertEdge(EdgeRow {
                    from: (*from).to_string(),
                    direction: (*direction).to_string(),
                    to: (*to).to_string(),
                }))
                .unwrap();
        }
        store
    }

    fn no_anchors() -> BTreeSet<String> {
        BTreeSet::new()
    }

    #[test]
    fn test_empty_world_scans_clean() {
        let mut store = MemoryStore::new();
        let report = scan_world(&mut store, &no_anchors()).unwrap();

        assert!(report.is_clean());
        assert_eq!(report.summary.total_locations, 0);
        assert_eq!(report.summary.total_exits, 0);
        assert_eq!(report.summary.dangling_exits_count, 0);
        assert_eq!(report.summary.orphan_locations_count, 0);
        assert_eq!(report.summary.missing_reciprocal_count, 0);
    }

    #[test]
    fn test_reciprocated_pair_scans_clean() {
        let mut store = make_world(
            &[("loc:a", "A"), ("loc:b", "B")],
            &[("loc:a", "north", "loc:b"), ("loc:b", "south", "loc:a")],
        );
        let report = scan_world(&mut store, &no_anchors()).unwrap();

        assert!(report.is_clean());
        assert_eq!(report.summary.total_locations, 2);
        assert_eq!(report.summary.total_exits, 2);
    }

    #[test]
    fn test_one_way_exit_reports_exactly_one_missing_reciprocal() {
        let mut store = make_world(
            &[("loc:a", "A"), ("loc:b", "B")],
            &[("loc:a", "north", "loc:b")],
        );
        let report = scan_world(&mut store, &no_anchors()).unwrap();

        assert!(!report.is_clean());
        assert_eq!(report.summary.dangling_exits_count, 0);
        assert_eq!(report.summary.missing_reciprocal_count, 1);
        let entry = &report.missing_reciprocal_exits[0];
        assert_eq!(entry.from, "loc:a");
        assert_eq!(entry.to, "loc:b");
        assert_eq!(entry.direction, Direction::North);
        assert_eq!(entry.expected_reverse_direction, Direction::South);
    }

    #[test]
    fn test_reverse_slot_routing_elsewhere_is_still_missing() {
        // B's south slot exists but goes to C, so A never gets a way back.
        let mut store = make_world(
            &[("loc:a", "A"), ("loc:b", "B"), ("loc:c", "C")],
            &[
                ("loc:a", "north", "loc:b"),
                ("loc:b", "south", "loc:c"),
                ("loc:c", "north", "loc:b"),
            ],
        );
        let report = scan_world(&mut store, &no_anchors()).unwrap();

        let froms: Vec<&str> = report
            .missing_reciprocal_exits
            .iter()
            .map(|m| m.from.as_str())
            .collect();
        assert!(froms.contains(&"loc:a"));
    }

    #[test]
    fn test_dangling_exit_is_reported_once_and_skips_reciprocity() {
        let mut store = make_world(
            &[("loc:a", "A")],
            &[("loc:a", "north", "loc:zz")],
        );
        let report = scan_world(&mut store, &no_anchors()).unwrap();

        assert_eq!(report.summary.dangling_exits_count, 1);
        let entry = &report.dangling_exits[0];
        assert_eq!(entry.from, "loc:a");
        assert_eq!(entry.direction, "north");
        assert_eq!(entry.to, "loc:zz");
        // The ghost destination produces no reciprocity noise.
        assert_eq!(report.summary.missing_reciprocal_count, 0);
        // loc:a is touched by its own edge, so it is not an orphan.
        assert_eq!(report.summary.orphan_locations_count, 0);
    }

    #[test]
    fn test_isolated_location_is_an_orphan_unless_anchored() {
        let vertices = [("loc:a", "A"), ("loc:b", "B"), ("loc:island", "Island")];
        let edges = [("loc:a", "north", "loc:b"), ("loc:b", "south", "loc:a")];

        let mut store = make_world(&vertices, &edges);
        let report = scan_world(&mut store, &no_anchors()).unwrap();
        assert_eq!(report.summary.orphan_locations_count, 1);
        assert_eq!(report.orphan_locations[0].id, "loc:island");
        assert_eq!(report.orphan_locations[0].name, "Island");
        // Orphans alone never fail the scan.
        assert!(report.is_clean());

        let anchors: BTreeSet<String> = ["loc:island".to_string()].into();
        let mut store = make_world(&vertices, &edges);
        let report = scan_world(&mut store, &anchors).unwrap();
        assert_eq!(report.summary.orphan_locations_count, 0);
    }

    #[test]
    fn test_non_canonical_direction_connects_but_skips_reciprocity() {
        let mut store = make_world(
            &[("loc:a", "A"), ("loc:b", "B")],
            &[("loc:a", "teleport", "loc:b")],
        );
        let report = scan_world(&mut store, &no_anchors()).unwrap();

        // The edge still counts for connectivity, so neither end orphans.
        assert_eq!(report.summary.orphan_locations_count, 0);
        assert_eq!(report.summary.missing_reciprocal_count, 0);
        assert_eq!(report.summary.total_exits, 1);
        assert!(report.is_clean());
    }

    #[test]
    fn test_self_loop_without_its_own_reverse_is_missing() {
        let mut store = make_world(&[("loc:a", "A")], &[("loc:a", "north", "loc:a")]);
        let report = scan_world(&mut store, &no_anchors()).unwrap();

        assert_eq!(report.summary.missing_reciprocal_count, 1);
        let entry = &report.missing_reciprocal_exits[0];
        assert_eq!(entry.from, "loc:a");
        assert_eq!(entry.to, "loc:a");
        assert_eq!(entry.expected_reverse_direction, Direction::South);
    }

    #[test]
    fn test_report_lists_sort_deterministically() {
        let mut store = make_world(
            &[("loc:c", "C"), ("loc:a", "A"), ("loc:b", "B")],
            &[
                ("loc:c", "up", "loc:gone"),
                ("loc:a", "north", "loc:gone"),
                ("loc:b", "west", "loc:gone"),
            ],
        );
        let report = scan_world(&mut store, &no_anchors()).unwrap();

        let froms: Vec<&str> = report
            .dangling_exits
            .iter()
            .map(|d| d.from.as_str())
            .collect();
        assert_eq!(froms, ["loc:a", "loc:b", "loc:c"]);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let mut store = make_world(
            &[("loc:a", "A")],
            &[("loc:a", "north", "loc:zz")],
        );
        let report = scan_world(&mut store, &no_anchors()).unwrap();
        let value = serde_json::to_value(&report).unwrap();

        assert!(value.get("scannedAt").is_some());
        assert_eq!(value["summary"]["totalLocations"], 1);
        assert_eq!(value["summary"]["danglingExitsCount"], 1);
        assert_eq!(value["danglingExits"][0]["from"], "loc:a");
        assert!(value.get("missingReciprocalExits").is_some());
    }
}
