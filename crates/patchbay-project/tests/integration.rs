//! Disk round-trip tests for project persistence.

use tempfile::TempDir;

use patchbay_catalog::{Catalog, CompositeLibrary, PropertyValue};
use patchbay_graph::{GraphStore, Position};
use patchbay_project::{ProjectError, ProjectFile};

fn build_session() -> (Catalog, CompositeLibrary, GraphStore) {
    let mut catalog = Catalog::new();
    let mut library = CompositeLibrary::with_factory_defaults();
    let bus = library.get("mono-bus").cloned().unwrap();
    catalog.register_composite(&bus).unwrap();

    let mut store = GraphStore::new();
    let osc = store
        .add_node(&catalog, "oscillator", Position::new(0.0, 0.0))
        .unwrap();
    store
        .set_property(&catalog, osc, "frequency", PropertyValue::Number(880.0))
        .unwrap();
    let slider = store
        .add_node(&catalog, "slider", Position::new(0.0, 150.0))
        .unwrap();
    let gain = store
        .add_node(&catalog, "gain", Position::new(200.0, 0.0))
        .unwrap();
    let dest = store
        .add_node(&catalog, "destination", Position::new(400.0, 0.0))
        .unwrap();
    store.add_edge(&catalog, osc, gain, None, None).unwrap();
    store
        .add_edge(&catalog, slider, gain, None, Some("gain"))
        .unwrap();
    store.add_edge(&catalog, gain, dest, None, None).unwrap();

    (catalog, library, store)
}

#[test]
fn save_then_load_reconstructs_the_model_exactly() {
    let (catalog, library, store) = build_session();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");

    ProjectFile::from_store(&store, &library)
        .save(&path)
        .unwrap();

    let loaded = ProjectFile::load(&path).unwrap();
    let restored = loaded.to_store(&catalog).unwrap();

    assert_eq!(restored.snapshot(), store.snapshot());
    let osc = restored
        .nodes()
        .find(|n| n.node_type == "oscillator")
        .unwrap();
    assert_eq!(
        osc.properties.get("frequency").and_then(PropertyValue::as_number),
        Some(880.0)
    );
}

#[test]
fn user_composites_survive_the_round_trip() {
    let (_, mut library, store) = build_session();
    let copy_id = library.save_as("mono-bus", "House Bus").unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    ProjectFile::from_store(&store, &library).save(&path).unwrap();

    let loaded = ProjectFile::load(&path).unwrap();
    assert_eq!(loaded.composites.len(), 1);

    // A fresh session registers the file's composites before rebuilding.
    let mut catalog = Catalog::new();
    let mut fresh_library = CompositeLibrary::with_factory_defaults();
    for def in &loaded.composites {
        fresh_library.upsert(def.clone()).unwrap();
        catalog.register_composite(def).unwrap();
    }
    assert!(fresh_library.get(&copy_id).is_some());
    assert!(!fresh_library.get(&copy_id).unwrap().prebuilt);
}

#[test]
fn save_creates_missing_parent_directories() {
    let (_, library, store) = build_session();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("session.json");

    ProjectFile::from_store(&store, &library).save(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn load_of_missing_file_reports_the_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.json");

    let err = ProjectFile::load(&path).unwrap_err();
    match err {
        ProjectError::ReadFile { path: p, .. } => assert_eq!(p, path),
        other => panic!("expected ReadFile, got {other:?}"),
    }
}

#[test]
fn load_of_garbage_is_a_json_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("garbage.json");
    std::fs::write(&path, "not json at all").unwrap();

    let err = ProjectFile::load(&path).unwrap_err();
    assert!(matches!(err, ProjectError::Json(_)));
}

#[test]
fn composite_node_requires_registration_before_rebuild() {
    let (catalog, library, mut store) = build_session();
    store
        .add_node(&catalog, "composite:mono-bus", Position::new(0.0, 300.0))
        .unwrap();

    let project = ProjectFile::from_store(&store, &library);

    // A catalog without the composite registered rejects the load.
    let bare = Catalog::new();
    let err = project.to_store(&bare).unwrap_err();
    assert!(matches!(err, ProjectError::UnknownNodeType(t) if t == "composite:mono-bus"));

    // With registration, the same file loads.
    assert!(project.to_store(&catalog).is_ok());
}
