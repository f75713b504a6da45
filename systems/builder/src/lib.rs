#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure editing system translating cursor input into tile commands.

use dungeon_editor_core::{
    Command, EditMode, Event, FootprintSize, GridCoord, Orientation, Rotation, TileId, TileKind,
    Turn,
};

/// Declarative placement preview describing a potential tile placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacementPreview {
    /// Type of tile proposed for placement.
    pub kind: TileKind,
    /// Anchor cell of the proposed footprint.
    pub anchor: GridCoord,
    /// Footprint axis mapping for the proposal.
    pub orientation: Orientation,
    /// Display rotation the tile would be placed with.
    pub rotation: Rotation,
    /// Cells the tile would cover, already oriented.
    pub footprint: FootprintSize,
    /// Indicates whether the preview represents a valid placement location.
    pub placeable: bool,
}

impl PlacementPreview {
    /// Creates a new placement preview descriptor.
    #[must_use]
    pub const fn new(
        kind: TileKind,
        anchor: GridCoord,
        orientation: Orientation,
        rotation: Rotation,
        footprint: FootprintSize,
        placeable: bool,
    ) -> Self {
        Self {
            kind,
            anchor,
            orientation,
            rotation,
            footprint,
            placeable,
        }
    }

    /// Cells the preview would cover, for highlighting.
    pub fn cells(&self) -> impl Iterator<Item = GridCoord> {
        self.footprint.cells(self.anchor)
    }
}

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuilderInput {
    /// Indicates whether the user clicked the primary action on this frame.
    pub confirm_action: bool,
    /// Indicates whether the user requested tile removal on this frame.
    pub remove_action: bool,
    /// Rotation requested for the hovered tile on this frame.
    pub rotate_action: Option<Turn>,
    /// Cell currently hovered by the cursor.
    pub cursor_cell: Option<GridCoord>,
}

impl BuilderInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(
        confirm_action: bool,
        remove_action: bool,
        rotate_action: Option<Turn>,
        cursor_cell: Option<GridCoord>,
    ) -> Self {
        Self {
            confirm_action,
            remove_action,
            rotate_action,
            cursor_cell,
        }
    }
}

/// Editing system that translates preview + input into tile commands.
///
/// In build mode a confirm places the previewed tile; in select mode it
/// toggles the highlight of the hovered tile.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    mode: EditMode,
}

impl Builder {
    /// Creates a new builder system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mode: EditMode::Select,
        }
    }

    /// Mode last announced by the world.
    #[must_use]
    pub const fn mode(&self) -> EditMode {
        self.mode
    }

    /// Consumes world events and adapter-derived input to emit editing commands.
    ///
    /// The `tile_at` closure should mirror the semantics of the world's
    /// `query::tile_at` helper so the system can identify the hovered tile.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        preview: Option<&PlacementPreview>,
        input: BuilderInput,
        mut tile_at: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(GridCoord) -> Option<TileId>,
    {
        for event in events {
            if let Event::EditModeChanged { mode } = event {
                self.mode = *mode;
            }
        }

        let hovered = input.cursor_cell.and_then(&mut tile_at);

        match self.mode {
            EditMode::Build => {
                if input.confirm_action {
                    if let Some(preview) = preview.filter(|preview| preview.placeable) {
                        out.push(Command::PlaceTile {
                            kind: preview.kind.clone(),
                            anchor: preview.anchor,
                            rotation: preview.rotation,
                            orientation: preview.orientation,
                        });
                    }
                }

                if let (Some(turn), Some(tile)) = (input.rotate_action, hovered.clone()) {
                    out.push(Command::RotateTile { tile, turn });
                }

                if input.remove_action {
                    if let Some(tile) = hovered {
                        out.push(Command::RemoveTile { tile });
                    }
                }
            }
            EditMode::Select => {
                if input.confirm_action {
                    if let Some(tile) = hovered {
                        out.push(Command::ToggleTileActive { tile });
                    }
                }
            }
        }
    }
}
