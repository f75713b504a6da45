#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scene serialization: flattens live instances into placement records and
//! replays saved records back into world commands.

use dungeon_editor_core::{
    coords, transforms::InstanceTransforms, ActorKind, Command, GridCoord, Orientation, Rotation,
    TileId, TileKind,
};
use dungeon_editor_world::{query, World};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Saved placement of one tile instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilePlacement {
    /// Tile type name.
    #[serde(rename = "type")]
    pub kind: TileKind,
    /// Anchor cell of the instance footprint.
    pub anchor: GridCoord,
    /// Display rotation in quarter turns.
    pub rotation: Rotation,
    /// Footprint axis mapping.
    pub orientation: Orientation,
}

/// Saved placement of one actor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorPlacement {
    /// Actor type name.
    #[serde(rename = "type")]
    pub kind: ActorKind,
    /// Anchor cell of the actor footprint.
    pub anchor: GridCoord,
    /// Facing in quarter turns.
    pub rotation: Rotation,
    /// State action the actor starts in.
    pub default_action: Option<String>,
}

/// Every live instance of a map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// Tile records, grouped by catalog order then slot order.
    pub tiles: Vec<TilePlacement>,
    /// Actor records, grouped by catalog order then ordinal order.
    pub actors: Vec<ActorPlacement>,
}

/// Failures raised while exporting.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    /// The renderer holds no transform for a live tile.
    #[error("renderer holds no transform for tile {0}")]
    MissingTransform(TileId),
}

/// Lists every live tile, recovering anchors from renderer-owned positions.
pub fn export_tiles(
    world: &World,
    transforms: &impl InstanceTransforms,
) -> Result<Vec<TilePlacement>, ExportError> {
    let mut placements = Vec::new();
    for table in query::tile_tables(world) {
        for (slot_index, slot) in table.live() {
            let position = transforms
                .position_at(table.kind(), slot_index)
                .ok_or_else(|| {
                    ExportError::MissingTransform(TileId::new(table.kind().clone(), slot_index))
                })?;
            let footprint = table.footprint_for(slot.orientation());
            let anchor = coords::anchor_from_placement_position(position, footprint);
            if anchor != slot.anchor() {
                warn!(
                    kind = %table.kind(),
                    slot = slot_index.get(),
                    recovered = %anchor,
                    recorded = %slot.anchor(),
                    "renderer position disagrees with recorded anchor"
                );
            }
            placements.push(TilePlacement {
                kind: table.kind().clone(),
                anchor,
                rotation: slot.rotation(),
                orientation: slot.orientation(),
            });
        }
    }
    Ok(placements)
}

/// Lists every live actor using its own pivot and static footprint.
#[must_use]
pub fn export_actors(world: &World) -> Vec<ActorPlacement> {
    query::actor_tables(world)
        .iter()
        .flat_map(|table| {
            table.live().map(move |(_, actor)| ActorPlacement {
                kind: table.kind().clone(),
                anchor: table.anchor_of(actor),
                rotation: actor.rotation(),
                default_action: actor.current_action().map(str::to_owned),
            })
        })
        .collect()
}

/// Exports tiles and actors together.
pub fn export_scene(
    world: &World,
    transforms: &impl InstanceTransforms,
) -> Result<Scene, ExportError> {
    Ok(Scene {
        tiles: export_tiles(world, transforms)?,
        actors: export_actors(world),
    })
}

/// Converts a saved scene into the placement commands that rebuild it.
#[must_use]
pub fn replay(scene: &Scene) -> Vec<Command> {
    let tiles = scene.tiles.iter().map(|tile| Command::PlaceTile {
        kind: tile.kind.clone(),
        anchor: tile.anchor,
        rotation: tile.rotation,
        orientation: tile.orientation,
    });
    let actors = scene.actors.iter().map(|actor| Command::PlaceActor {
        kind: actor.kind.clone(),
        anchor: actor.anchor,
        rotation: actor.rotation,
        default_action: actor.default_action.clone(),
    });
    tiles.chain(actors).collect()
}
