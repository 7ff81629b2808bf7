use atlas_core::filestore::{self, FileStore};
use atlas_core::store::{
    EdgeRow, GraphStore, StoreQuery, VertexRow, fetch_edges, fetch_vertices,
};
use atlas_core::world::{ExitAvailability, ForbiddenExit};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tempfile::TempDir;

fn make_vertex(id: &str, name: &str) -> VertexRow {
    VertexRow {
        id: id.to_string(),
        name: name.to_string(),
        description: Some(format!("{name}, seen from the road")),
        tags: BTreeSet::new(),
        availability: ExitAvailability::default(),
    }
}

#[test]
fn test_flush_and_reopen_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    let mut store = FileStore::open(root, false).unwrap();
    let mut gate = make_vertex("loc:gate", "River Gate");
    gate.availability
        .pending
        .insert("east".parse().unwrap(), "ferry planned".to_string());
    gate.availability.forbidden.insert(
        "west".parse().unwrap(),
        ForbiddenExit {
            reason: "sheer cliffs".to_string(),
            motif: Some("cliff".parse().unwrap()),
            reveal: None,
        },
    );
    store.submit(StoreQuery::InsertVertex(gate)).unwrap();
    store
        .submit(StoreQuery::InsertVertex(make_vertex("loc:wharf", "Wharf")))
        .unwrap();
    store
        .submit(StoreQuery::InsertEdge(EdgeRow {
            from: "loc:gate".to_string(),
            direction: "south".to_string(),
            to: "loc:wharf".to_string(),
        }))
        .unwrap();
    store.flush().unwrap();
    assert!(filestore::world_exists(root));

    let mut loaded = FileStore::open(root, false).unwrap();
    let vertices = fetch_vertices(&mut loaded).unwrap();
    assert_eq!(vertices.len(), 2);
    let gate = vertices.iter().find(|v| v.id == "loc:gate").unwrap();
    assert_eq!(gate.availability.pending.len(), 1);
    assert_eq!(
        gate.availability.forbidden.values().next().unwrap().reason,
        "sheer cliffs"
    );

    let edges = fetch_edges(&mut loaded).unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].direction, "south");
}

#[test]
fn test_compressed_write_is_autodetected_on_load() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    let mut store = FileStore::open(root, true).unwrap();
    store
        .submit(StoreQuery::InsertVertex(make_vertex("loc:keep", "Keep")))
        .unwrap();
    store.flush().unwrap();

    // zstd frame magic, not JSON
    let bytes = std::fs::read(filestore::world_file(root)).unwrap();
    assert_eq!(&bytes[..4], &[0x28, 0xB5, 0x2F, 0xFD]);

    // Reopening with compression off still reads the compressed file.
    let mut loaded = FileStore::open(root, false).unwrap();
    let vertices = fetch_vertices(&mut loaded).unwrap();
    assert_eq!(vertices.len(), 1);
    assert_eq!(vertices[0].name, "Keep");
}

#[test]
fn test_world_exists_false() {
    let tmp = TempDir::new().unwrap();
    assert!(!filestore::world_exists(tmp.path()));
}

#[test]
fn test_atlas_dir_and_file_paths() {
    let root = PathBuf::from("/project");
    assert_eq!(filestore::atlas_dir(&root), PathBuf::from("/project/.atlas"));
    assert_eq!(
        filestore::world_file(&root),
        PathBuf::from("/project/.atlas/world.json")
    );
}

#[test]
fn test_ensure_gitignore_appends_once() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    std::fs::write(root.join(".gitignore"), "target/\n").unwrap();

    assert!(!filestore::ensure_gitignore(root).unwrap());
    assert!(filestore::ensure_gitignore(root).unwrap());

    let content = std::fs::read_to_string(root.join(".gitignore")).unwrap();
    assert!(content.starts_with("target/"));
    assert_eq!(content.matches(".atlas/").count(), 1);
}

#[test]
fn test_ensure_gitignore_creates_file() {
    let tmp = TempDir::new().unwrap();
    assert!(!filestore::ensure_gitignore(tmp.path()).unwrap());
    let content = std::fs::read_to_string(tmp.path().join(".gitignore")).unwrap();
    assert!(content.contains(".atlas/"));
}
