//! Graph store abstraction: an opaque capability exposing `submit(query) -> rows`.
//!
//! The mutation engine and the consistency scanner speak only this vocabulary,
//! so they stay agnostic of the backing store's query language and transport.
//! Two implementations ship here: [`MemoryStore`] for tests and dry work, and
//! the durable file store in [`crate::filestore`].

use crate::world::{ExitAvailability, Location};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Errors from graph store operations. All of these are infrastructure
/// failures: the caller cannot fix them by editing input files.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store cannot be reached or read/written.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The store answered, but with undecodable or protocol-violating data.
    #[error("malformed store data: {0}")]
    Malformed(String),
    #[error("unsupported world file version {found} (expected {expected})")]
    Version { found: String, expected: String },
    #[error("storage mode '{0}' has no durable world graph; set [storage] mode = \"store\"")]
    WrongMode(String),
}

/// A location vertex as the store holds it. Hard exits live in edge rows, not
/// here; availability stays on the vertex because it is per-location metadata,
/// not a passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexRow {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "ExitAvailability::is_empty")]
    pub availability: ExitAvailability,
}

/// A directed passage as the store holds it.
///
/// `direction` is a raw string on purpose: stored labels may be corrupted or
/// custom, and the scanner decides canonicality itself instead of failing at
/// the row boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRow {
    pub from: String,
    pub direction: String,
    pub to: String,
}

/// The query vocabulary the engine and scanner are allowed to speak.
///
/// `InsertVertex` and `UpdateVertex` both resolve to upsert-by-id in the
/// stores shipped here; the split exists so a query-language store can map
/// them to distinct statements.
#[derive(Debug, Clone)]
pub enum StoreQuery {
    Vertices,
    Edges,
    InsertVertex(VertexRow),
    UpdateVertex(VertexRow),
    InsertEdge(EdgeRow),
}

/// One row of a store response.
#[derive(Debug, Clone)]
pub enum StoreRow {
    Vertex(VertexRow),
    Edge(EdgeRow),
    /// A mutation was accepted; carries no data.
    Ack,
}

impl StoreRow {
    /// Row discriminant for protocol-violation diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreRow::Vertex(_) => "vertex",
            StoreRow::Edge(_) => "edge",
            StoreRow::Ack => "ack",
        }
    }
}

/// Abstraction over the backing graph store.
///
/// `submit` is blocking: callers run one-shot batch jobs, not services, and
/// the CLI carries no async runtime.
pub trait GraphStore {
    fn submit(&mut self, query: StoreQuery) -> Result<Vec<StoreRow>, StoreError>;
}

/// Fetch the full vertex set, surfacing any non-vertex row as a protocol
/// violation.
pub fn fetch_vertices<S: GraphStore + ?Sized>(store: &mut S) -> Result<Vec<VertexRow>, StoreError> {
    store
        .submit(StoreQuery::Vertices)?
        .into_iter()
        .map(|row| match row {
            StoreRow::Vertex(v) => Ok(v),
            other => Err(StoreError::Malformed(format!(
                "vertex query returned a {} row",
                other.kind()
            ))),
        })
        .collect()
}

/// Fetch the full edge set, surfacing any non-edge row as a protocol
/// violation.
pub fn fetch_edges<S: GraphStore + ?Sized>(store: &mut S) -> Result<Vec<EdgeRow>, StoreError> {
    store
        .submit(StoreQuery::Edges)?
        .into_iter()
        .map(|row| match row {
            StoreRow::Edge(e) => Ok(e),
            other => Err(StoreError::Malformed(format!(
                "edge query returned a {} row",
                other.kind()
            ))),
        })
        .collect()
}

impl VertexRow {
    /// Project a blueprint location onto its vertex row. Hard exits are not
    /// part of the vertex; the engine turns them into edge rows separately.
    pub fn from_location(location: &Location) -> Self {
        Self {
            id: location.id.clone(),
            name: location.name.clone(),
            description: location.description.clone(),
            tags: location.tags.clone(),
            availability: location.exit_availability.clone(),
        }
    }
}

/// In-memory graph store: the unit-test fake, and the backing for dry runs.
/// Holds vertices keyed by id for deterministic iteration and edges in
/// insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    vertices: BTreeMap<String, VertexRow>,
    edges: Vec<EdgeRow>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphStore for MemoryStore {
    fn submit(&mut self, query: StoreQuery) -> Result<Vec<StoreRow>, StoreError> {
        match query {
            StoreQuery::Vertices => Ok(self
                .vertices
                .values()
                .cloned()
                .map(StoreRow::Vertex)
                .collect()),
            StoreQuery::Edges => Ok(self.edges.iter().cloned().map(StoreRow::Edge).collect()),
            StoreQuery::InsertVertex(row) | StoreQuery::UpdateVertex(row) => {
                self.vertices.insert(row.id.clone(), row);
                Ok(vec![StoreRow::Ack])
            }
            StoreQuery::InsertEdge(row) => {
                self.edges.push(row);
                Ok(vec![StoreRow::Ack])
            }
        }
    }
}
