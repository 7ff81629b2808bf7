//! Durable graph store backed by a JSON file under `.atlas/`.
//!
//! The file carries a schema version checked on load. Writes optionally
//! compress with zstd; decompression on load is automatic (detected by the
//! zstd magic bytes), so a project can flip `compress` without migrating.

use crate::store::{EdgeRow, GraphStore, StoreError, StoreQuery, StoreRow, VertexRow};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const ATLAS_DIR: &str = ".atlas";
const WORLD_FILE: &str = "world.json";

/// Current world file schema version. Bump on breaking layout changes.
pub const WORLD_VERSION: &str = "1.0.0";

const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Get the path to the atlas directory for a given project root.
pub fn atlas_dir(project_root: &Path) -> PathBuf {
    project_root.join(ATLAS_DIR)
}

/// Get the path to the world file for a given project root.
pub fn world_file(project_root: &Path) -> PathBuf {
    atlas_dir(project_root).join(WORLD_FILE)
}

/// Check if a world file exists for the given project root.
pub fn world_exists(project_root: &Path) -> bool {
    world_file(project_root).exists()
}

/// On-disk layout of the world file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorldFile {
    version: String,
    updated_at: DateTime<Utc>,
    vertices: BTreeMap<String, VertexRow>,
    edges: Vec<EdgeRow>,
}

impl WorldFile {
    fn empty() -> Self {
        Self {
            version: WORLD_VERSION.to_string(),
            updated_at: Utc::now(),
            vertices: BTreeMap::new(),
            edges: Vec::new(),
        }
    }
}

/// File-backed [`GraphStore`]. Mutations accumulate in memory and hit disk on
/// [`FileStore::flush`]; one-shot CLI jobs flush once at the end of the run.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    compress: bool,
    world: WorldFile,
    dirty: bool,
}

impl FileStore {
    /// Open the world file under `project_root`, or start empty if none
    /// exists yet. A present-but-undecodable file is an infrastructure error,
    /// never silently replaced.
    pub fn open(project_root: &Path, compress: bool) -> Result<Self, StoreError> {
        let path = world_file(project_root);
        let world = match fs::read(&path) {
            Ok(bytes) => decode_world(&bytes, &path)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => WorldFile::empty(),
            Err(e) => {
                return Err(StoreError::Unavailable(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };
        Ok(Self {
            path,
            compress,
            world,
            dirty: false,
        })
    }

    /// The world file path this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write pending mutations to disk. No-op when nothing changed since the
    /// last flush, so a no-op seed leaves the file untouched.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| {
                StoreError::Unavailable(format!("failed to create {}: {e}", dir.display()))
            })?;
        }
        self.world.updated_at = Utc::now();
        let json = serde_json::to_string_pretty(&self.world)
            .map_err(|e| StoreError::Malformed(format!("failed to serialize world: {e}")))?;
        let bytes = if self.compress {
            zstd::encode_all(json.as_bytes(), 3).map_err(|e| {
                StoreError::Unavailable(format!("zstd compression failed: {e}"))
            })?
        } else {
            json.into_bytes()
        };
        fs::write(&self.path, bytes).map_err(|e| {
            StoreError::Unavailable(format!("failed to write {}: {e}", self.path.display()))
        })?;
        self.dirty = false;
        Ok(())
    }
}

fn decode_world(bytes: &[u8], path: &Path) -> Result<WorldFile, StoreError> {
    let json = if bytes.starts_with(&ZSTD_MAGIC) {
        zstd::decode_all(bytes).map_err(|e| {
            StoreError::Malformed(format!("zstd decode of {} failed: {e}", path.display()))
        })?
    } else {
        bytes.to_vec()
    };
    let world: WorldFile = serde_json::from_slice(&json)
        .map_err(|e| StoreError::Malformed(format!("invalid world file {}: {e}", path.display())))?;
    if world.version != WORLD_VERSION {
        return Err(StoreError::Version {
            found: world.version,
            expected: WORLD_VERSION.to_string(),
        });
    }
    Ok(world)
}

impl GraphStore for FileStore {
    fn submit(&mut self, query: StoreQuery) -> Result<Vec<StoreRow>, StoreError> {
        match query {
            StoreQuery::Vertices => Ok(self
                .world
                .vertices
                .values()
                .cloned()
                .map(StoreRow::Vertex)
                .collect()),
            StoreQuery::Edges => Ok(self
                .world
                .edges
                .iter()
                .cloned()
                .map(StoreRow::Edge)
                .collect()),
            StoreQuery::InsertVertex(row) | StoreQuery::UpdateVertex(row) => {
                self.world.vertices.insert(row.id.clone(), row);
                self.dirty = true;
                Ok(vec![StoreRow::Ack])
            }
            StoreQuery::InsertEdge(row) => {
                self.world.edges.push(row);
                self.dirty = true;
                Ok(vec![StoreRow::Ack])
            }
        }
    }
}

/// Ensure .atlas is in .gitignore. Returns true if it was already there.
pub fn ensure_gitignore(project_root: &Path) -> Result<bool> {
    let gitignore = project_root.join(".gitignore");

    if gitignore.exists() {
        let content = fs::read_to_string(&gitignore)?;
        if content
            .lines()
            .any(|line| line.trim() == ".atlas" || line.trim() == ".atlas/")
        {
            return Ok(true); // already ignored
        }
        // Append
        let mut new_content = content;
        if !new_content.ends_with('\n') {
            new_content.push('\n');
        }
        new_content.push_str("\n# Atlas world graph\n.atlas/\n");
        fs::write(&gitignore, new_content)
            .with_context(|| format!("failed to update {}", gitignore.display()))?;
    } else {
        fs::write(&gitignore, "# Atlas world graph\n.atlas/\n")
            .with_context(|| format!("failed to create {}", gitignore.display()))?;
    }

    Ok(false)
}
