use dungeon_editor_core::{
    transforms::InstanceTransforms, ActorId, ActorKind, Command, Event, GridCoord, Orientation,
    Rotation, SlotIndex, Spin, TileId, TileKind,
};
use dungeon_editor_rendering::InstanceBuffers;
use dungeon_editor_system_scene_export::{
    export_actors, export_scene, export_tiles, replay, ActorPlacement, ExportError, Scene,
    TilePlacement,
};
use dungeon_editor_world::{
    apply,
    catalog::{Catalog, TileSpec},
    World,
};

fn catalog() -> Catalog {
    let mut catalog = Catalog::builtin();
    catalog.tiles.insert(0, TileSpec::new("bridge", 2, 1));
    catalog
}

struct Session {
    world: World,
    buffers: InstanceBuffers,
}

impl Session {
    fn new() -> Self {
        Self {
            world: World::new(12, 12, &catalog()),
            buffers: InstanceBuffers::new(),
        }
    }

    fn run(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(&mut self.world, command, &mut events);
        self.buffers.apply_events(&events);
        events
    }

    fn place(&mut self, kind: &str, anchor: GridCoord, orientation: Orientation) -> Vec<Event> {
        self.run(Command::PlaceTile {
            kind: TileKind::new(kind),
            anchor,
            rotation: Rotation::default(),
            orientation,
        })
    }
}

#[test]
fn rotated_footprint_anchor_survives_export() {
    let mut session = Session::new();
    let events = session.place("bridge", GridCoord::new(3, 2), Orientation::Rotated);
    assert!(matches!(events.as_slice(), [Event::TilePlaced { .. }]));

    let tiles = export_tiles(&session.world, &session.buffers).expect("transforms present");
    assert_eq!(
        tiles,
        vec![TilePlacement {
            kind: TileKind::new("bridge"),
            anchor: GridCoord::new(3, 2),
            rotation: Rotation::default(),
            orientation: Orientation::Rotated,
        }]
    );
}

#[test]
fn removed_slots_are_skipped_and_never_reused() {
    let mut session = Session::new();
    for q in [-4, -2, 0] {
        let _ = session.place("bridge", GridCoord::new(q, 0), Orientation::Default);
    }
    let _ = session.run(Command::RemoveTile {
        tile: TileId::new(TileKind::new("bridge"), SlotIndex::new(1)),
    });
    let events = session.place("bridge", GridCoord::new(2, 0), Orientation::Default);
    assert!(matches!(
        events.as_slice(),
        [Event::TilePlaced { tile, .. }] if tile.slot == SlotIndex::new(3)
    ));

    let anchors: Vec<GridCoord> = export_tiles(&session.world, &session.buffers)
        .expect("transforms present")
        .into_iter()
        .map(|tile| tile.anchor)
        .collect();
    assert_eq!(
        anchors,
        vec![
            GridCoord::new(-4, 0),
            GridCoord::new(0, 0),
            GridCoord::new(2, 0),
        ]
    );
}

#[test]
fn export_follows_catalog_order_then_slot_order() {
    let mut session = Session::new();
    let _ = session.place("second", GridCoord::new(0, 0), Orientation::Default);
    let _ = session.place("first", GridCoord::new(1, 1), Orientation::Default);
    let _ = session.place("bridge", GridCoord::new(-3, -3), Orientation::Default);
    let _ = session.place("first", GridCoord::new(2, 2), Orientation::Default);

    let kinds: Vec<String> = export_tiles(&session.world, &session.buffers)
        .expect("transforms present")
        .into_iter()
        .map(|tile| tile.kind.to_string())
        .collect();
    assert_eq!(kinds, ["bridge", "first", "first", "second"]);
}

#[test]
fn missing_renderer_transform_is_reported() {
    let mut session = Session::new();
    let _ = session.place("first", GridCoord::new(0, 0), Orientation::Default);

    let error = export_tiles(&session.world, &InstanceBuffers::new()).expect_err("no transforms");
    assert_eq!(
        error,
        ExportError::MissingTransform(TileId::new(TileKind::new("first"), SlotIndex::new(0)))
    );
}

#[test]
fn renderer_position_is_authoritative_for_anchor() {
    let mut session = Session::new();
    let _ = session.place("first", GridCoord::new(0, 0), Orientation::Default);
    session.buffers.set_transform_at(
        &TileKind::new("first"),
        SlotIndex::new(0),
        glam::Mat4::from_translation(glam::Vec3::new(4.5, 0.0, -1.5)),
    );

    let tiles = export_tiles(&session.world, &session.buffers).expect("transforms present");
    assert_eq!(tiles[0].anchor, GridCoord::new(4, -2));
}

#[test]
fn actors_export_current_action_and_facing() {
    let mut session = Session::new();
    let goblin = ActorId::new(ActorKind::new("goblin"), SlotIndex::new(0));
    let _ = session.run(Command::PlaceActor {
        kind: ActorKind::new("goblin"),
        anchor: GridCoord::new(-1, 3),
        rotation: Rotation::default(),
        default_action: Some("Idle".to_owned()),
    });
    let _ = session.run(Command::RotateActor {
        actor: goblin.clone(),
        spin: Spin::Clockwise,
    });
    let _ = session.run(Command::PlaceActor {
        kind: ActorKind::new("bat"),
        anchor: GridCoord::new(0, 0),
        rotation: Rotation::new(2),
        default_action: None,
    });

    assert_eq!(
        export_actors(&session.world),
        vec![
            ActorPlacement {
                kind: ActorKind::new("goblin"),
                anchor: GridCoord::new(-1, 3),
                rotation: Rotation::new(1),
                default_action: Some("Idle".to_owned()),
            },
            ActorPlacement {
                kind: ActorKind::new("bat"),
                anchor: GridCoord::new(0, 0),
                rotation: Rotation::new(2),
                default_action: None,
            },
        ]
    );
}

#[test]
fn replayed_scene_rebuilds_identical_export() {
    let mut session = Session::new();
    let _ = session.place("bridge", GridCoord::new(3, 2), Orientation::Rotated);
    let _ = session.place("first", GridCoord::new(-5, -5), Orientation::Default);
    let _ = session.run(Command::RotateTile {
        tile: TileId::new(TileKind::new("first"), SlotIndex::new(0)),
        turn: dungeon_editor_core::Turn::Half,
    });
    let _ = session.run(Command::PlaceActor {
        kind: ActorKind::new("skeleton"),
        anchor: GridCoord::new(1, -4),
        rotation: Rotation::new(3),
        default_action: Some("Spawn".to_owned()),
    });
    let scene = export_scene(&session.world, &session.buffers).expect("transforms present");

    let mut rebuilt = Session::new();
    for command in replay(&scene) {
        let events = rebuilt.run(command);
        assert!(events.iter().all(|event| !matches!(
            event,
            Event::TilePlacementRejected { .. } | Event::ActorPlacementRejected { .. }
        )));
    }

    assert_eq!(
        export_scene(&rebuilt.world, &rebuilt.buffers).expect("transforms present"),
        scene
    );
}

#[test]
fn scene_json_uses_type_and_camel_case_keys() {
    let scene = Scene {
        tiles: vec![TilePlacement {
            kind: TileKind::new("first"),
            anchor: GridCoord::new(1, -1),
            rotation: Rotation::new(3),
            orientation: Orientation::Rotated,
        }],
        actors: vec![ActorPlacement {
            kind: ActorKind::new("dad"),
            anchor: GridCoord::new(0, 0),
            rotation: Rotation::default(),
            default_action: None,
        }],
    };

    let value = serde_json::to_value(&scene).expect("scene serialises");
    assert_eq!(
        value,
        serde_json::json!({
            "tiles": [{
                "type": "first",
                "anchor": { "q": 1, "s": -1 },
                "rotation": 3,
                "orientation": "rotated",
            }],
            "actors": [{
                "type": "dad",
                "anchor": { "q": 0, "s": 0 },
                "rotation": 0,
                "defaultAction": null,
            }],
        })
    );
}
