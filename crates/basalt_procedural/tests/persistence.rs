//! Save, load, and edit-overlay durability across the full world surface.

use basalt_procedural::{
    ChunkDims, EditStore, GenerationParams, World, WorldError, WorldSave,
};
use basalt_registry::BlockKind;

fn flat_params(seed: u64) -> (GenerationParams, i32) {
    let mut params = GenerationParams::default();
    params.seed = seed;
    params.terrain.magnitude = 0.0;
    params.terrain.offset = 0.5;
    params.terrain.water_height = 0;
    params.trees.frequency = 0.0;
    params.clouds.density = 0.0;
    let surface = (params.dims.height as f64 * 0.5).floor() as i32;
    (params, surface)
}

#[test]
fn a_session_survives_save_and_load() {
    let (params, y) = flat_params(31);
    let mut world = World::new(params).unwrap();
    world.ensure_loaded_around(0, 0);

    // Dig a little staircase and build a pillar, spanning two chunks.
    for step in 0..4 {
        assert!(world.remove_block(step, y - step, 0));
    }
    for h in 1..=3 {
        assert!(world.add_block(20, y + h, 20, BlockKind::Stone));
    }

    let save = world.save().unwrap();
    let mut restored = World::load(&save).unwrap();
    restored.ensure_loaded_around(0, 0);

    for step in 0..4 {
        assert_eq!(
            restored.get_block(step, y - step, 0),
            Some(BlockKind::Empty),
            "stair step {step} lost"
        );
    }
    for h in 1..=3 {
        assert_eq!(restored.get_block(20, y + h, 20), Some(BlockKind::Stone));
    }
    assert_eq!(restored.stats().edited_blocks, 7);
}

#[test]
fn saving_twice_yields_identical_blobs() {
    let (params, y) = flat_params(8);
    let mut world = World::new(params).unwrap();
    world.ensure_loaded_around(0, 0);
    world.remove_block(5, y, 5);
    world.add_block(6, y + 1, 6, BlockKind::Sand);

    let first = world.save().unwrap();
    let second = world.save().unwrap();
    assert_eq!(first, second);

    // A load/save cycle preserves the blob too.
    let reloaded = World::load(&first).unwrap();
    assert_eq!(reloaded.save().unwrap(), first);
}

#[test]
fn empty_world_round_trips() {
    let (params, _) = flat_params(0);
    let world = World::new(params).unwrap();
    let save = world.save().unwrap();
    let restored = World::load(&save).unwrap();
    assert!(restored.edits().is_empty());
    assert_eq!(restored.params(), world.params());
}

#[test]
fn corrupted_save_is_rejected() {
    let (params, y) = flat_params(3);
    let mut world = World::new(params).unwrap();
    world.ensure_loaded_around(0, 0);
    world.remove_block(0, y, 0);
    let save = world.save().unwrap();

    let bad_params = WorldSave {
        params: b"{ not json".to_vec(),
        edits: save.edits.clone(),
    };
    assert!(matches!(
        World::load(&bad_params),
        Err(WorldError::MalformedParamsBlob(_))
    ));

    let bad_edits = WorldSave {
        params: save.params.clone(),
        edits: vec![0xff; 16],
    };
    assert!(matches!(
        World::load(&bad_edits),
        Err(WorldError::MalformedEditBlob(_))
    ));
}

#[test]
fn toml_parameter_files_round_trip() {
    let (mut params, _) = flat_params(12);
    params.trees.frequency = 0.05;
    params.dims = ChunkDims::new(8, 16);
    params.terrain.water_height = 2;

    let text = params.to_toml_string().unwrap();
    let parsed = GenerationParams::from_toml_str(&text).unwrap();
    assert_eq!(parsed, params);

    // A world built from the parsed file matches one built in memory.
    let mut a = World::new(params).unwrap();
    let mut b = World::new(parsed).unwrap();
    a.ensure_loaded_around(0, 0);
    b.ensure_loaded_around(0, 0);
    assert_eq!(a.get_block(3, 5, 3), b.get_block(3, 5, 3));
}

#[test]
fn edit_blob_rejects_mismatched_dimensions() {
    let mut store = EditStore::new();
    store.set(
        basalt_procedural::ChunkCoord::new(0, 0),
        basalt_procedural::LocalPos::new(15, 31, 15),
        BlockKind::Stone,
    );
    let blob = store.to_blob(ChunkDims::new(16, 32)).unwrap();
    assert!(EditStore::from_blob(&blob, ChunkDims::new(16, 32)).is_ok());
    assert!(EditStore::from_blob(&blob, ChunkDims::new(4, 4)).is_err());
}
