use dungeon_editor_core::{
    Command, EditMode, Event, FootprintSize, GridCoord, Orientation, Rotation, SlotIndex, TileId,
    TileKind, Turn,
};
use dungeon_editor_system_builder::{Builder, BuilderInput, PlacementPreview};
use dungeon_editor_world::{apply, catalog::Catalog, query, World};

fn first_preview_at(cell: GridCoord, placeable: bool) -> PlacementPreview {
    PlacementPreview::new(
        TileKind::new("first"),
        cell,
        Orientation::Default,
        Rotation::default(),
        FootprintSize::UNIT,
        placeable,
    )
}

fn first_tile(slot: u32) -> TileId {
    TileId::new(TileKind::new("first"), SlotIndex::new(slot))
}

fn build_mode() -> [Event; 1] {
    [Event::EditModeChanged {
        mode: EditMode::Build,
    }]
}

#[test]
fn confirm_emits_place_command_in_build_mode() {
    let mut builder = Builder::default();
    let mut commands = Vec::new();

    builder.handle(
        &build_mode(),
        Some(&first_preview_at(GridCoord::new(2, 2), true)),
        BuilderInput {
            confirm_action: true,
            ..BuilderInput::default()
        },
        |_| None,
        &mut commands,
    );

    assert_eq!(
        commands,
        vec![Command::PlaceTile {
            kind: TileKind::new("first"),
            anchor: GridCoord::new(2, 2),
            rotation: Rotation::default(),
            orientation: Orientation::Default,
        }],
        "builder should emit a placement command when confirming a valid preview",
    );
}

#[test]
fn confirm_ignored_when_preview_not_placeable() {
    let mut builder = Builder::default();
    let mut commands = Vec::new();

    builder.handle(
        &build_mode(),
        Some(&first_preview_at(GridCoord::new(2, 2), false)),
        BuilderInput {
            confirm_action: true,
            ..BuilderInput::default()
        },
        |_| None,
        &mut commands,
    );

    assert!(commands.is_empty(), "invalid preview must not emit commands");
}

#[test]
fn confirm_in_select_mode_toggles_hovered_tile() {
    let mut builder = Builder::default();
    let mut commands = Vec::new();

    builder.handle(
        &[],
        Some(&first_preview_at(GridCoord::new(2, 2), true)),
        BuilderInput {
            confirm_action: true,
            cursor_cell: Some(GridCoord::new(2, 2)),
            ..BuilderInput::default()
        },
        |_| Some(first_tile(4)),
        &mut commands,
    );

    assert_eq!(builder.mode(), EditMode::Select);
    assert_eq!(
        commands,
        vec![Command::ToggleTileActive {
            tile: first_tile(4)
        }],
    );
}

#[test]
fn remove_and_rotate_target_hovered_tile() {
    let mut builder = Builder::new();
    let mut commands = Vec::new();

    builder.handle(
        &build_mode(),
        None,
        BuilderInput::new(false, true, Some(Turn::Half), Some(GridCoord::new(1, 1))),
        |cell| (cell == GridCoord::new(1, 1)).then(|| first_tile(0)),
        &mut commands,
    );

    assert_eq!(
        commands,
        vec![
            Command::RotateTile {
                tile: first_tile(0),
                turn: Turn::Half,
            },
            Command::RemoveTile {
                tile: first_tile(0)
            },
        ],
    );
}

#[test]
fn remove_without_hovered_tile_is_ignored() {
    let mut builder = Builder::new();
    let mut commands = Vec::new();

    builder.handle(
        &build_mode(),
        None,
        BuilderInput {
            remove_action: true,
            cursor_cell: Some(GridCoord::new(0, 0)),
            ..BuilderInput::default()
        },
        |_| None,
        &mut commands,
    );

    assert!(commands.is_empty());
}

#[test]
fn returning_to_select_mode_stops_placements() {
    let mut builder = Builder::new();
    let mut commands = Vec::new();
    let input = BuilderInput {
        confirm_action: true,
        ..BuilderInput::default()
    };
    let preview = first_preview_at(GridCoord::new(0, 0), true);

    builder.handle(&build_mode(), Some(&preview), input, |_| None, &mut commands);
    builder.handle(
        &[Event::EditModeChanged {
            mode: EditMode::Select,
        }],
        Some(&preview),
        input,
        |_| None,
        &mut commands,
    );

    assert_eq!(commands.len(), 1);
}

#[test]
fn builder_round_trip_through_world() {
    let mut world = World::new(8, 8, &Catalog::builtin());
    let mut builder = Builder::new();
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::SetEditMode {
            mode: EditMode::Build,
        },
        &mut events,
    );

    let kind = TileKind::new("first");
    let anchor = GridCoord::new(-1, 2);
    let preview = PlacementPreview::new(
        kind.clone(),
        anchor,
        Orientation::Default,
        Rotation::default(),
        FootprintSize::UNIT,
        query::can_place_tile(&world, &kind, anchor, Orientation::Default),
    );

    let mut commands = Vec::new();
    builder.handle(
        &events,
        Some(&preview),
        BuilderInput {
            confirm_action: true,
            ..BuilderInput::default()
        },
        |cell| query::tile_at(&world, cell).ok().flatten(),
        &mut commands,
    );

    events.clear();
    for command in commands.drain(..) {
        apply(&mut world, command, &mut events);
    }
    assert!(matches!(events.as_slice(), [Event::TilePlaced { .. }]));
    assert_eq!(query::tile_at(&world, anchor), Ok(Some(first_tile(0))));

    builder.handle(
        &events,
        None,
        BuilderInput {
            remove_action: true,
            cursor_cell: Some(anchor),
            ..BuilderInput::default()
        },
        |cell| query::tile_at(&world, cell).ok().flatten(),
        &mut commands,
    );
    events.clear();
    for command in commands.drain(..) {
        apply(&mut world, command, &mut events);
    }

    assert_eq!(
        events,
        vec![Event::TileRemoved {
            tile: first_tile(0),
            anchor,
        }]
    );
    assert_eq!(query::tile_at(&world, anchor), Ok(None));
}
