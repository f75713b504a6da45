#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the dungeon editor.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative editor world, and pure systems. Adapters submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values that
//! renderers and systems mirror. Rejections are reported as events carrying a
//! typed reason instead of being raised.

use std::{fmt, str::FromStr};

use glam::Vec3;
use serde::{Deserialize, Serialize};

pub mod coords;
pub mod transforms;

/// Interaction mode the editor is currently in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EditMode {
    /// Pointer input selects and toggles existing instances.
    #[default]
    Select,
    /// Pointer input places new instances of the chosen type.
    Build,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests that the world transition to the provided edit mode.
    SetEditMode {
        /// Mode the world should activate.
        mode: EditMode,
    },
    /// Updates the static terrain walkability of a single cell.
    SetWalkable {
        /// Cell whose terrain changes.
        cell: GridCoord,
        /// Whether the terrain can be walked on.
        walkable: bool,
    },
    /// Requests placement of a tile whose footprint is anchored at `anchor`.
    PlaceTile {
        /// Catalog type of the tile.
        kind: TileKind,
        /// Cell that becomes the footprint's anchor.
        anchor: GridCoord,
        /// Initial display rotation.
        rotation: Rotation,
        /// Whether the footprint axes are used as authored or swapped.
        orientation: Orientation,
    },
    /// Turns a placed tile around its pivot without changing occupancy.
    RotateTile {
        /// Tile to rotate.
        tile: TileId,
        /// Size of the turn.
        turn: Turn,
    },
    /// Tombstones a tile and frees the cells it covered.
    RemoveTile {
        /// Tile to remove.
        tile: TileId,
    },
    /// Flips the highlight state of a tile unless it is mid-transition.
    ToggleTileActive {
        /// Tile whose highlight flips.
        tile: TileId,
    },
    /// Reports that the renderer started or finished animating a tile.
    SetTileAnimating {
        /// Tile being animated.
        tile: TileId,
        /// Whether a transition is in progress.
        animating: bool,
    },
    /// Requests placement of an actor whose footprint is anchored at `anchor`.
    PlaceActor {
        /// Catalog type of the actor.
        kind: ActorKind,
        /// Cell that anchors the actor's footprint.
        anchor: GridCoord,
        /// Initial facing.
        rotation: Rotation,
        /// State action the actor starts in, if any.
        default_action: Option<String>,
    },
    /// Turns an actor a quarter turn.
    RotateActor {
        /// Actor to rotate.
        actor: ActorId,
        /// Direction of the turn.
        spin: Spin,
    },
    /// Moves an actor one cell along its facing.
    MoveActor {
        /// Actor to move.
        actor: ActorId,
        /// Whether the actor steps forward or backward.
        step: Step,
    },
    /// Switches the state action an actor is performing.
    SetActorAction {
        /// Actor whose action changes.
        actor: ActorId,
        /// New state action, or `None` to stop acting.
        action: Option<String>,
    },
    /// Tombstones an actor.
    RemoveActor {
        /// Actor to remove.
        actor: ActorId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that the editor entered a new edit mode.
    EditModeChanged {
        /// Mode that became active.
        mode: EditMode,
    },
    /// Confirms a terrain walkability change; the walkability matrix was rebuilt.
    WalkabilityChanged {
        /// Cell whose terrain changed.
        cell: GridCoord,
        /// New walkability of the cell.
        walkable: bool,
    },
    /// Confirms that a tile was written into its type's slot table.
    TilePlaced {
        /// Handle of the new tile instance.
        tile: TileId,
        /// Anchor cell of the footprint.
        anchor: GridCoord,
        /// Footprint after applying the orientation.
        footprint: FootprintSize,
        /// Display rotation of the tile.
        rotation: Rotation,
        /// Orientation the tile was placed with.
        orientation: Orientation,
        /// Pivot position for the renderer.
        position: Vec3,
    },
    /// Reports that a tile placement request was rejected.
    TilePlacementRejected {
        /// Type requested for placement.
        kind: TileKind,
        /// Anchor provided in the request.
        anchor: GridCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms a display rotation change.
    TileRotated {
        /// Tile that turned.
        tile: TileId,
        /// Size of the applied turn.
        turn: Turn,
        /// Rotation after the turn.
        rotation: Rotation,
    },
    /// Confirms that a tile was tombstoned and its cells vacated.
    TileRemoved {
        /// Tile that was removed.
        tile: TileId,
        /// Anchor of the vacated footprint.
        anchor: GridCoord,
    },
    /// Confirms that a tile's highlight state flipped.
    TileActiveToggled {
        /// Tile whose highlight flipped.
        tile: TileId,
        /// Highlight state after the flip.
        active: bool,
    },
    /// Reports that a command addressed to an existing tile was rejected.
    TileCommandRejected {
        /// Tile targeted by the command.
        tile: TileId,
        /// Specific reason the command failed.
        reason: InstanceError,
    },
    /// Confirms that an actor was written into its type's slot table.
    ActorPlaced {
        /// Handle of the new actor.
        actor: ActorId,
        /// Pivot position of the actor.
        position: Vec3,
        /// Facing of the actor.
        rotation: Rotation,
        /// State action the actor started in.
        action: Option<String>,
    },
    /// Reports that an actor placement request was rejected.
    ActorPlacementRejected {
        /// Type requested for placement.
        kind: ActorKind,
        /// Anchor provided in the request.
        anchor: GridCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that an actor turned.
    ActorRotated {
        /// Actor that turned.
        actor: ActorId,
        /// Facing after the turn.
        rotation: Rotation,
    },
    /// Confirms that an actor moved.
    ActorMoved {
        /// Actor that moved.
        actor: ActorId,
        /// Pivot position after the move.
        position: Vec3,
    },
    /// Confirms that an actor switched state action.
    ActorActionChanged {
        /// Actor whose action changed.
        actor: ActorId,
        /// Action that stopped, if any.
        previous: Option<String>,
        /// Action that started, if any.
        current: Option<String>,
    },
    /// Confirms that an actor was tombstoned.
    ActorRemoved {
        /// Actor that was removed.
        actor: ActorId,
    },
    /// Reports that a command addressed to an existing actor was rejected.
    ActorCommandRejected {
        /// Actor targeted by the command.
        actor: ActorId,
        /// Specific reason the command failed.
        reason: InstanceError,
    },
}

/// Integer coordinates of a board cell; the board is centred on the origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    q: i32,
    s: i32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(q: i32, s: i32) -> Self {
        Self { q, s }
    }

    /// Coordinate along the `q` axis (world `x`).
    #[must_use]
    pub const fn q(&self) -> i32 {
        self.q
    }

    /// Coordinate along the `s` axis (world `z`).
    #[must_use]
    pub const fn s(&self) -> i32 {
        self.s
    }

    /// Returns the coordinate shifted by the provided deltas.
    #[must_use]
    pub const fn offset(self, dq: i32, ds: i32) -> Self {
        Self::new(self.q.saturating_add(dq), self.s.saturating_add(ds))
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.s)
    }
}

/// Number of cells an object covers along each grid axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FootprintSize {
    q_length: u32,
    s_length: u32,
}

impl FootprintSize {
    /// Footprint covering a single cell.
    pub const UNIT: Self = Self::new(1, 1);

    /// Creates a new footprint size.
    #[must_use]
    pub const fn new(q_length: u32, s_length: u32) -> Self {
        Self { q_length, s_length }
    }

    /// Cells covered along the `q` axis.
    #[must_use]
    pub const fn q_length(&self) -> u32 {
        self.q_length
    }

    /// Cells covered along the `s` axis.
    #[must_use]
    pub const fn s_length(&self) -> u32 {
        self.s_length
    }

    /// Footprint with the two axes swapped.
    #[must_use]
    pub const fn transposed(self) -> Self {
        Self::new(self.s_length, self.q_length)
    }

    /// Footprint actually covered when placed with the provided orientation.
    #[must_use]
    pub const fn oriented(self, orientation: Orientation) -> Self {
        match orientation {
            Orientation::Default => self,
            Orientation::Rotated => self.transposed(),
        }
    }

    /// Iterates every cell of the footprint anchored at `anchor`, row by row.
    pub fn cells(self, anchor: GridCoord) -> impl Iterator<Item = GridCoord> {
        let q_length = i32::try_from(self.q_length).unwrap_or(i32::MAX);
        let s_length = i32::try_from(self.s_length).unwrap_or(i32::MAX);
        (0..s_length).flat_map(move |ds| (0..q_length).map(move |dq| anchor.offset(dq, ds)))
    }
}

/// Whether a footprint is used as authored or with its axes swapped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Footprint axes are used as authored.
    #[default]
    Default,
    /// Footprint axes are swapped.
    Rotated,
}

/// Display rotation expressed as a count of clockwise quarter turns, `0..=3`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rotation(u8);

impl Rotation {
    /// Creates a rotation, reducing the count modulo four.
    #[must_use]
    pub const fn new(quarter_turns: u8) -> Self {
        Self(quarter_turns % 4)
    }

    /// Number of quarter turns, always within `0..=3`.
    #[must_use]
    pub const fn quarter_turns(&self) -> u8 {
        self.0
    }

    /// Rotation after applying the provided turn.
    #[must_use]
    pub const fn turned(self, turn: Turn) -> Self {
        let steps = match turn {
            Turn::Quarter => 1,
            Turn::Half => 2,
        };
        Self::new(self.0 + steps)
    }

    /// Rotation after a quarter turn in the provided direction.
    #[must_use]
    pub const fn spun(self, spin: Spin) -> Self {
        match spin {
            Spin::Clockwise => Self::new(self.0 + 1),
            Spin::CounterClockwise => Self::new(self.0 + 3),
        }
    }

    /// Rotation around the vertical axis in radians.
    #[must_use]
    pub fn radians(self) -> f32 {
        f32::from(self.0) * std::f32::consts::FRAC_PI_2
    }

    /// Grid delta of a single step forward while facing this rotation.
    ///
    /// Rotation zero faces positive `s`; each quarter turn advances clockwise
    /// when viewed from above.
    #[must_use]
    pub const fn facing(self) -> (i32, i32) {
        match self.0 {
            0 => (0, 1),
            1 => (1, 0),
            2 => (0, -1),
            _ => (-1, 0),
        }
    }
}

impl TryFrom<u8> for Rotation {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value < 4 {
            Ok(Self(value))
        } else {
            Err(format!("rotation {value} is outside 0..=3"))
        }
    }
}

impl From<Rotation> for u8 {
    fn from(value: Rotation) -> Self {
        value.0
    }
}

/// Size of a display turn applied to a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Turn {
    /// A 90 degree turn.
    Quarter,
    /// A 180 degree turn.
    Half,
}

/// Direction of a quarter turn applied to an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Spin {
    /// Clockwise when viewed from above.
    Clockwise,
    /// Counter-clockwise when viewed from above.
    CounterClockwise,
}

/// Direction of a single-cell actor move relative to its facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// Along the facing.
    Forward,
    /// Against the facing.
    Backward,
}

/// Catalog name of a tile type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileKind(String);

impl TileKind {
    /// Creates a tile kind from its catalog name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Catalog name of the tile type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog name of an actor type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorKind(String);

impl ActorKind {
    /// Creates an actor kind from its catalog name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Catalog name of the actor type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Permanent index of an instance within its type's slot table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotIndex(u32);

impl SlotIndex {
    /// Creates a new slot index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index usable for addressing dense per-slot storage.
    #[must_use]
    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

/// Handle of a tile instance: its type plus its permanent slot index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    /// Catalog type of the tile.
    pub kind: TileKind,
    /// Slot the tile occupies within its type's table.
    pub slot: SlotIndex,
}

impl TileId {
    /// Creates a new tile handle.
    #[must_use]
    pub const fn new(kind: TileKind, slot: SlotIndex) -> Self {
        Self { kind, slot }
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.slot.get())
    }
}

impl FromStr for TileId {
    type Err = HandleParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (kind, index) = split_handle(value)?;
        Ok(Self::new(TileKind::new(kind), SlotIndex::new(index)))
    }
}

/// Handle of an actor: its type plus its ordinal within that type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId {
    /// Catalog type of the actor.
    pub kind: ActorKind,
    /// Ordinal assigned when the actor was placed.
    pub ordinal: SlotIndex,
}

impl ActorId {
    /// Creates a new actor handle.
    #[must_use]
    pub const fn new(kind: ActorKind, ordinal: SlotIndex) -> Self {
        Self { kind, ordinal }
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.ordinal.get())
    }
}

impl FromStr for ActorId {
    type Err = HandleParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (kind, index) = split_handle(value)?;
        Ok(Self::new(ActorKind::new(kind), SlotIndex::new(index)))
    }
}

/// Failure to parse a `{type}-{index}` instance handle.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("instance handle '{0}' is not of the form <type>-<index>")]
pub struct HandleParseError(String);

fn split_handle(value: &str) -> Result<(&str, u32), HandleParseError> {
    let malformed = || HandleParseError(value.to_owned());
    let (kind, index) = value.rsplit_once('-').ok_or_else(malformed)?;
    if kind.is_empty() {
        return Err(malformed());
    }
    let index = index.parse::<u32>().map_err(|_| malformed())?;
    Ok((kind, index))
}

/// Reasons a placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum PlacementError {
    /// Some cell of the requested footprint lies outside the board.
    #[error("footprint extends beyond the board")]
    OutOfBounds,
    /// The requested footprint overlaps an occupied cell.
    #[error("footprint overlaps an occupied cell")]
    Occupied,
    /// The requested type is not present in the catalog.
    #[error("type is not present in the catalog")]
    UnknownKind,
    /// The type's preallocated instance table is full.
    #[error("instance table is full")]
    CapacityExceeded,
    /// The requested starting action is not known for the type.
    #[error("starting action is not known for the type")]
    UnknownAction,
}

/// Reasons a command addressed to an existing instance may be rejected.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum InstanceError {
    /// No slot with the provided index was ever allocated.
    #[error("no such instance")]
    UnknownInstance,
    /// The instance was already tombstoned.
    #[error("instance was removed")]
    Removed,
    /// The instance is mid-transition and ignores state toggles.
    #[error("instance is animating")]
    Animating,
    /// The move would leave the board.
    #[error("destination lies outside the board")]
    OutOfBounds,
    /// The requested state action is not known for this actor type.
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    /// Occupancy bookkeeping referenced a cell that is not an anchor.
    #[error("occupancy grid holds an invalid anchor reference")]
    CorruptOccupancy,
}
