use anyhow::{Context, Result};
use dungeon_editor_core::{
    coords::MAX_BOARD_DIMENSION, ActorId, ActorKind, Command, GridCoord, Orientation, Rotation, Spin, Step, TileId, TileKind,
    Turn,
};
use serde::Deserialize;

/// Editing session described in TOML: a board plus an ordered list of steps.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub(crate) struct Script {
    /// Board extents.
    pub(crate) board: BoardSize,
    /// Steps applied in order.
    #[serde(default)]
    pub(crate) steps: Vec<ScriptStep>,
}

/// Board dimensions in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub(crate) struct BoardSize {
    /// Extent along the `q` axis.
    pub(crate) q: u32,
    /// Extent along the `s` axis.
    pub(crate) s: u32,
}

impl BoardSize {
    fn check(self) -> Result<(), BoardSizeError> {
        let fits = |length: u32| (1..=MAX_BOARD_DIMENSION).contains(&length);
        if fits(self.q) && fits(self.s) {
            Ok(())
        } else {
            Err(BoardSizeError(self))
        }
    }
}

/// Board dimensions outside `1..=MAX_BOARD_DIMENSION`.
#[derive(Debug, thiserror::Error)]
#[error(
    "board {}x{} must span 1 to {} cells per axis",
    .0.q,
    .0.s,
    MAX_BOARD_DIMENSION
)]
pub(crate) struct BoardSizeError(BoardSize);

/// One editing step. Instances are referred to by `{type}-{index}` handles.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub(crate) enum ScriptStep {
    SetWalkable {
        cell: GridCoord,
        walkable: bool,
    },
    PlaceTile {
        kind: TileKind,
        anchor: GridCoord,
        #[serde(default)]
        rotation: Rotation,
        #[serde(default)]
        orientation: Orientation,
    },
    RotateTile {
        tile: String,
        #[serde(default = "quarter")]
        turn: Turn,
    },
    RemoveTile {
        tile: String,
    },
    ToggleTile {
        tile: String,
    },
    PlaceActor {
        kind: ActorKind,
        anchor: GridCoord,
        #[serde(default)]
        rotation: Rotation,
        #[serde(default)]
        action: Option<String>,
    },
    RotateActor {
        actor: String,
        spin: Spin,
    },
    MoveActor {
        actor: String,
        step: Step,
    },
    SetActorAction {
        actor: String,
        #[serde(default)]
        action: Option<String>,
    },
    RemoveActor {
        actor: String,
    },
}

impl Script {
    /// Parses a script from TOML.
    pub(crate) fn from_toml_str(contents: &str) -> Result<Self> {
        let script: Self = toml::from_str(contents).context("could not parse editing script")?;
        script.board.check()?;
        Ok(script)
    }

    /// Converts every step into a world command.
    pub(crate) fn commands(&self) -> Result<Vec<Command>> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                step.to_command()
                    .with_context(|| format!("invalid step {}", index + 1))
            })
            .collect()
    }

    /// Tile type of every placement step, in script order.
    pub(crate) fn placed_tile_kinds(&self) -> Vec<TileKind> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                ScriptStep::PlaceTile { kind, .. } => Some(kind.clone()),
                _ => None,
            })
            .collect()
    }
}

impl ScriptStep {
    fn to_command(&self) -> Result<Command> {
        let command = match self {
            Self::SetWalkable { cell, walkable } => Command::SetWalkable {
                cell: *cell,
                walkable: *walkable,
            },
            Self::PlaceTile {
                kind,
                anchor,
                rotation,
                orientation,
            } => Command::PlaceTile {
                kind: kind.clone(),
                anchor: *anchor,
                rotation: *rotation,
                orientation: *orientation,
            },
            Self::RotateTile { tile, turn } => Command::RotateTile {
                tile: tile_handle(tile)?,
                turn: *turn,
            },
            Self::RemoveTile { tile } => Command::RemoveTile {
                tile: tile_handle(tile)?,
            },
            Self::ToggleTile { tile } => Command::ToggleTileActive {
                tile: tile_handle(tile)?,
            },
            Self::PlaceActor {
                kind,
                anchor,
                rotation,
                action,
            } => Command::PlaceActor {
                kind: kind.clone(),
                anchor: *anchor,
                rotation: *rotation,
                default_action: action.clone(),
            },
            Self::RotateActor { actor, spin } => Command::RotateActor {
                actor: actor_handle(actor)?,
                spin: *spin,
            },
            Self::MoveActor { actor, step } => Command::MoveActor {
                actor: actor_handle(actor)?,
                step: *step,
            },
            Self::SetActorAction { actor, action } => Command::SetActorAction {
                actor: actor_handle(actor)?,
                action: action.clone(),
            },
            Self::RemoveActor { actor } => Command::RemoveActor {
                actor: actor_handle(actor)?,
            },
        };
        Ok(command)
    }
}

fn tile_handle(handle: &str) -> Result<TileId> {
    handle
        .parse()
        .with_context(|| format!("'{handle}' is not a tile handle"))
}

fn actor_handle(handle: &str) -> Result<ActorId> {
    handle
        .parse()
        .with_context(|| format!("'{handle}' is not an actor handle"))
}

fn quarter() -> Turn {
    Turn::Quarter
}
