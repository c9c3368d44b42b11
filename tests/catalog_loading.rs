//! Integration tests for loading room catalogs from disk.

use portalcrawl::{
    MapGenerationParams, MapGenerator, MinimapLog, PortalcrawlError, RoomCatalog, SandboxWorld,
};
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

#[test]
fn test_saved_catalog_loads_back() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("catalog.json");

    let catalog = RoomCatalog::sample();
    catalog.save(&path).expect("Failed to save catalog");
    let loaded = RoomCatalog::from_file(&path).expect("Failed to load catalog");

    assert_eq!(loaded, catalog);
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_loaded_catalog_drives_generation() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    let json = serde_json::to_string(&RoomCatalog::sample()).unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let catalog = RoomCatalog::from_file(file.path()).expect("Failed to load catalog");
    let params = MapGenerationParams::from_catalog(&catalog, 7);
    let world = SandboxWorld::new(&catalog);
    let mut gen = MapGenerator::new(catalog, world, MinimapLog::new());

    let summary = gen.generate_map(&params).expect("generation failed");
    assert_eq!(summary.battle_rooms as u32, params.battle_room_count);
}

#[test]
fn test_minimal_catalog_uses_defaults() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    write!(
        file,
        r#"{{
            "map_size": 0,
            "start_rooms": [{{
                "name": "hall",
                "half_extents": [500.0, 500.0, 200.0],
                "entrance": {{ "label": "door", "offset": [-500.0, 0.0, 0.0] }}
            }}]
        }}"#
    )
    .unwrap();

    let catalog = RoomCatalog::from_file(file.path()).expect("Failed to load catalog");
    assert!(catalog.validate().is_ok());
    assert!(catalog.battle_rooms.is_empty());
    assert!(catalog.start_room_portal.is_none());
    assert_eq!(
        catalog.nav_volume_pool_size,
        portalcrawl::config::DEFAULT_NAV_VOLUME_POOL_SIZE
    );
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    let result = RoomCatalog::from_file(dir.path().join("absent.json"));
    assert!(matches!(result, Err(PortalcrawlError::Io(_))));
}

#[test]
fn test_malformed_json_is_a_serde_error() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(b"{ \"map_size\": ").unwrap();
    let result = RoomCatalog::from_file(file.path());
    assert!(matches!(result, Err(PortalcrawlError::Serde(_))));
}

#[test]
fn test_catalog_without_start_rooms_is_rejected() {
    let mut catalog = RoomCatalog::sample();
    catalog.start_rooms.clear();
    assert!(matches!(
        catalog.validate(),
        Err(PortalcrawlError::InvalidCatalog(_))
    ));
}
