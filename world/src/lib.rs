#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative editor state for the dungeon editor.
//!
//! The [`World`] owns the occupancy grid and one append-only instance table
//! per catalog type. It is mutated exclusively through [`apply`] by a single
//! owner; nothing here is shared across threads.

pub mod actors;
pub mod board;
pub mod catalog;
pub mod slots;
pub mod tiles;

use dungeon_editor_core::{
    ActorId, ActorKind, Command, EditMode, Event, GridCoord, InstanceError, Orientation,
    PlacementError, Rotation, Spin, Step, TileId, TileKind, Turn,
};
use tracing::{debug, error, warn};

use crate::{
    actors::{ActorError, ActorTable},
    board::Board,
    catalog::Catalog,
    tiles::TileTable,
};

/// Represents the authoritative editor state.
#[derive(Clone, Debug)]
pub struct World {
    board: Board,
    tiles: Vec<TileTable>,
    actors: Vec<ActorTable>,
    mode: EditMode,
}

impl World {
    /// Creates an empty map of `q x s` cells with one table per catalog type.
    #[must_use]
    pub fn new(q: u32, s: u32, catalog: &Catalog) -> Self {
        Self::with_board(Board::new(q, s), catalog)
    }

    /// Creates an empty map on a prepared board.
    ///
    /// The catalog is taken as given; load untrusted catalogs through
    /// [`Catalog::from_toml_str`] or call [`Catalog::validate`] first. A
    /// duplicated name is shadowed by its first entry.
    #[must_use]
    pub fn with_board(board: Board, catalog: &Catalog) -> Self {
        let tiles = catalog
            .tiles
            .iter()
            .map(|spec| TileTable::new(spec.name.clone(), spec.footprint(), spec.capacity))
            .collect();
        let actors = catalog
            .actors
            .iter()
            .map(|spec| {
                ActorTable::new(
                    spec.name.clone(),
                    spec.footprint(),
                    spec.actions.clone(),
                    spec.capacity,
                )
            })
            .collect();
        let extents = board.extents();
        debug!(
            columns = extents.columns(),
            rows = extents.rows(),
            tile_types = catalog.tiles.len(),
            actor_types = catalog.actors.len(),
            "world created"
        );
        Self {
            board,
            tiles,
            actors,
            mode: EditMode::default(),
        }
    }

    fn tile_table_mut(&mut self, kind: &TileKind) -> Option<&mut TileTable> {
        self.tiles.iter_mut().find(|table| table.kind() == kind)
    }

    fn actor_table_mut(&mut self, kind: &ActorKind) -> Option<&mut ActorTable> {
        self.actors.iter_mut().find(|table| table.kind() == kind)
    }

    fn place_tile(
        &mut self,
        kind: TileKind,
        anchor: GridCoord,
        rotation: Rotation,
        orientation: Orientation,
        out_events: &mut Vec<Event>,
    ) {
        let Some(table) = self.tiles.iter_mut().find(|table| table.kind() == &kind) else {
            reject_tile_placement(kind, anchor, PlacementError::UnknownKind, out_events);
            return;
        };

        let footprint = table.footprint_for(orientation);
        if let Err(reason) = self.board.check_placement(anchor, footprint) {
            reject_tile_placement(kind, anchor, reason, out_events);
            return;
        }

        match table.add(&mut self.board, anchor, rotation, orientation) {
            Ok(slot) => {
                let position = table.placement_position(anchor, orientation);
                let tile = TileId::new(kind, slot);
                debug!(%tile, %anchor, ?orientation, "tile placed");
                out_events.push(Event::TilePlaced {
                    tile,
                    anchor,
                    footprint,
                    rotation,
                    orientation,
                    position,
                });
            }
            Err(slot_error) => {
                error!(%kind, %slot_error, "tile instance table rejected placement");
                reject_tile_placement(kind, anchor, PlacementError::CapacityExceeded, out_events);
            }
        }
    }

    fn rotate_tile(&mut self, tile: TileId, turn: Turn, out_events: &mut Vec<Event>) {
        let result = match self.tile_table_mut(&tile.kind) {
            Some(table) => table.rotate(tile.slot, turn).map_err(InstanceError::from),
            None => Err(InstanceError::UnknownInstance),
        };
        match result {
            Ok(rotation) => out_events.push(Event::TileRotated {
                tile,
                turn,
                rotation,
            }),
            Err(reason) => reject_tile_command(tile, reason, out_events),
        }
    }

    fn remove_tile(&mut self, tile: TileId, out_events: &mut Vec<Event>) {
        let Some(table) = self.tiles.iter_mut().find(|table| table.kind() == &tile.kind) else {
            reject_tile_command(tile, InstanceError::UnknownInstance, out_events);
            return;
        };

        if let Some(slot) = table.slot(tile.slot).filter(|slot| slot.exists()) {
            let anchor = slot.anchor();
            let anchored = self
                .board
                .cell_at(anchor)
                .and_then(|cell| cell.is_anchor())
                .unwrap_or(false);
            if !anchored {
                error!(%tile, %anchor, "tile anchor cell is not marked as an anchor");
                reject_tile_command(tile, InstanceError::CorruptOccupancy, out_events);
                return;
            }
        }

        match table.remove(&mut self.board, tile.slot) {
            Ok(anchor) => {
                debug!(%tile, %anchor, "tile removed");
                out_events.push(Event::TileRemoved { tile, anchor });
            }
            Err(slot_error) => reject_tile_command(tile, slot_error.into(), out_events),
        }
    }

    fn toggle_tile(&mut self, tile: TileId, out_events: &mut Vec<Event>) {
        let result = match self.tile_table_mut(&tile.kind) {
            Some(table) => table.toggle_active(tile.slot).map_err(InstanceError::from),
            None => Err(InstanceError::UnknownInstance),
        };
        match result {
            Ok(Some(active)) => out_events.push(Event::TileActiveToggled { tile, active }),
            Ok(None) => reject_tile_command(tile, InstanceError::Animating, out_events),
            Err(reason) => reject_tile_command(tile, reason, out_events),
        }
    }

    fn mark_tile_animating(&mut self, tile: TileId, animating: bool, out_events: &mut Vec<Event>) {
        let result = match self.tile_table_mut(&tile.kind) {
            Some(table) => table
                .set_animating(tile.slot, animating)
                .map_err(InstanceError::from),
            None => Err(InstanceError::UnknownInstance),
        };
        if let Err(reason) = result {
            reject_tile_command(tile, reason, out_events);
        }
    }

    fn place_actor(
        &mut self,
        kind: ActorKind,
        anchor: GridCoord,
        rotation: Rotation,
        default_action: Option<String>,
        out_events: &mut Vec<Event>,
    ) {
        let Some(table) = self.actors.iter_mut().find(|table| table.kind() == &kind) else {
            reject_actor_placement(kind, anchor, PlacementError::UnknownKind, out_events);
            return;
        };

        match table.add(&self.board, anchor, rotation, default_action) {
            Ok(placed) => {
                let actor = ActorId::new(kind, placed.ordinal);
                debug!(%actor, %anchor, "actor placed");
                out_events.push(Event::ActorPlaced {
                    actor,
                    position: placed.position,
                    rotation,
                    action: placed.action,
                });
            }
            Err(actor_error) => {
                let reason = match actor_error {
                    ActorError::OutOfBounds => PlacementError::OutOfBounds,
                    ActorError::UnknownAction(_) => PlacementError::UnknownAction,
                    ActorError::Slot(slot_error) => {
                        error!(%kind, %slot_error, "actor instance table rejected placement");
                        PlacementError::CapacityExceeded
                    }
                };
                reject_actor_placement(kind, anchor, reason, out_events);
            }
        }
    }

    fn rotate_actor(&mut self, actor: ActorId, spin: Spin, out_events: &mut Vec<Event>) {
        let result = match self.actor_table_mut(&actor.kind) {
            Some(table) => table.rotate(actor.ordinal, spin).map_err(instance_error),
            None => Err(InstanceError::UnknownInstance),
        };
        match result {
            Ok(rotation) => out_events.push(Event::ActorRotated { actor, rotation }),
            Err(reason) => reject_actor_command(actor, reason, out_events),
        }
    }

    fn move_actor(&mut self, actor: ActorId, step: Step, out_events: &mut Vec<Event>) {
        let board = &self.board;
        let result = match self.actors.iter_mut().find(|table| table.kind() == &actor.kind) {
            Some(table) => table
                .step(board, actor.ordinal, step)
                .map_err(instance_error),
            None => Err(InstanceError::UnknownInstance),
        };
        match result {
            Ok(position) => out_events.push(Event::ActorMoved { actor, position }),
            Err(reason) => reject_actor_command(actor, reason, out_events),
        }
    }

    fn set_actor_action(
        &mut self,
        actor: ActorId,
        action: Option<String>,
        out_events: &mut Vec<Event>,
    ) {
        let result = match self.actor_table_mut(&actor.kind) {
            Some(table) => table
                .set_action(actor.ordinal, action.clone())
                .map_err(instance_error),
            None => Err(InstanceError::UnknownInstance),
        };
        match result {
            Ok(previous) => out_events.push(Event::ActorActionChanged {
                actor,
                previous,
                current: action,
            }),
            Err(reason) => reject_actor_command(actor, reason, out_events),
        }
    }

    fn remove_actor(&mut self, actor: ActorId, out_events: &mut Vec<Event>) {
        let result = match self.actor_table_mut(&actor.kind) {
            Some(table) => table.remove(actor.ordinal).map_err(instance_error),
            None => Err(InstanceError::UnknownInstance),
        };
        match result {
            Ok(()) => {
                debug!(%actor, "actor removed");
                out_events.push(Event::ActorRemoved { actor });
            }
            Err(reason) => reject_actor_command(actor, reason, out_events),
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SetEditMode { mode } => {
            if world.mode != mode {
                world.mode = mode;
                out_events.push(Event::EditModeChanged { mode });
            }
        }
        Command::SetWalkable { cell, walkable } => {
            if world.board.set_walkable(cell, walkable) {
                out_events.push(Event::WalkabilityChanged { cell, walkable });
            } else {
                warn!(%cell, "walkability change outside the board ignored");
            }
        }
        Command::PlaceTile {
            kind,
            anchor,
            rotation,
            orientation,
        } => world.place_tile(kind, anchor, rotation, orientation, out_events),
        Command::RotateTile { tile, turn } => world.rotate_tile(tile, turn, out_events),
        Command::RemoveTile { tile } => world.remove_tile(tile, out_events),
        Command::ToggleTileActive { tile } => world.toggle_tile(tile, out_events),
        Command::SetTileAnimating { tile, animating } => {
            world.mark_tile_animating(tile, animating, out_events);
        }
        Command::PlaceActor {
            kind,
            anchor,
            rotation,
            default_action,
        } => world.place_actor(kind, anchor, rotation, default_action, out_events),
        Command::RotateActor { actor, spin } => world.rotate_actor(actor, spin, out_events),
        Command::MoveActor { actor, step } => world.move_actor(actor, step, out_events),
        Command::SetActorAction { actor, action } => {
            world.set_actor_action(actor, action, out_events);
        }
        Command::RemoveActor { actor } => world.remove_actor(actor, out_events),
    }
}

fn instance_error(error: ActorError) -> InstanceError {
    match error {
        ActorError::Slot(slot_error) => slot_error.into(),
        ActorError::OutOfBounds => InstanceError::OutOfBounds,
        ActorError::UnknownAction(action) => InstanceError::UnknownAction(action),
    }
}

fn reject_tile_placement(
    kind: TileKind,
    anchor: GridCoord,
    reason: PlacementError,
    out_events: &mut Vec<Event>,
) {
    debug!(%kind, %anchor, %reason, "tile placement rejected");
    out_events.push(Event::TilePlacementRejected {
        kind,
        anchor,
        reason,
    });
}

fn reject_tile_command(tile: TileId, reason: InstanceError, out_events: &mut Vec<Event>) {
    warn!(%tile, %reason, "tile command rejected");
    out_events.push(Event::TileCommandRejected { tile, reason });
}

fn reject_actor_placement(
    kind: ActorKind,
    anchor: GridCoord,
    reason: PlacementError,
    out_events: &mut Vec<Event>,
) {
    debug!(%kind, %anchor, %reason, "actor placement rejected");
    out_events.push(Event::ActorPlacementRejected {
        kind,
        anchor,
        reason,
    });
}

fn reject_actor_command(actor: ActorId, reason: InstanceError, out_events: &mut Vec<Event>) {
    warn!(%actor, %reason, "actor command rejected");
    out_events.push(Event::ActorCommandRejected { actor, reason });
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use dungeon_editor_core::{
        ActorKind, EditMode, GridCoord, Orientation, TileId, TileKind,
    };

    use super::World;
    use crate::{
        actors::ActorTable,
        board::{Board, InvalidAnchorReference},
        tiles::TileTable,
    };

    /// Mode the editor is in.
    #[must_use]
    pub fn edit_mode(world: &World) -> EditMode {
        world.mode
    }

    /// Provides read-only access to the occupancy grid.
    #[must_use]
    pub fn board(world: &World) -> &Board {
        &world.board
    }

    /// Walkability matrix derived from terrain.
    #[must_use]
    pub fn walkability_matrix(world: &World) -> Vec<Vec<u8>> {
        world.board.walkability_matrix()
    }

    /// Tile tables in catalog order.
    #[must_use]
    pub fn tile_tables(world: &World) -> &[TileTable] {
        &world.tiles
    }

    /// Actor tables in catalog order.
    #[must_use]
    pub fn actor_tables(world: &World) -> &[ActorTable] {
        &world.actors
    }

    /// Table for the provided tile type.
    #[must_use]
    pub fn tile_table<'w>(world: &'w World, kind: &TileKind) -> Option<&'w TileTable> {
        world.tiles.iter().find(|table| table.kind() == kind)
    }

    /// Table for the provided actor type.
    #[must_use]
    pub fn actor_table<'w>(world: &'w World, kind: &ActorKind) -> Option<&'w ActorTable> {
        world.actors.iter().find(|table| table.kind() == kind)
    }

    /// Reports whether a tile of `kind` could be placed at `anchor`.
    #[must_use]
    pub fn can_place_tile(
        world: &World,
        kind: &TileKind,
        anchor: GridCoord,
        orientation: Orientation,
    ) -> bool {
        tile_table(world, kind).is_some_and(|table| {
            world
                .board
                .can_place(anchor, table.footprint_for(orientation))
        })
    }

    /// Finds the live tile whose footprint covers `cell`.
    ///
    /// Returns `Ok(None)` for free or out-of-bounds cells. An error means the
    /// occupancy grid is corrupt.
    pub fn tile_at(world: &World, cell: GridCoord) -> Result<Option<TileId>, InvalidAnchorReference> {
        let Some(covered) = world.board.cell_at(cell).filter(|cell| cell.has_tile()) else {
            return Ok(None);
        };
        let anchor = world.board.resolve_anchor(covered)?.coord();
        Ok(world.tiles.iter().find_map(|table| {
            table
                .live()
                .find(|(_, slot)| slot.anchor() == anchor)
                .map(|(slot, _)| TileId::new(table.kind().clone(), slot))
        }))
    }
}
