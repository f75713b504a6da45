//! Instance registry for tiles: one append-only slot table per tile type.

use dungeon_editor_core::{
    coords, FootprintSize, GridCoord, Orientation, Rotation, SlotIndex, TileKind, Turn,
};
use glam::Vec3;

use crate::{
    board::Board,
    slots::{SlotError, SlotTable, Tombstone},
};

/// Bookkeeping for one rendered tile instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileSlot {
    exists: bool,
    is_active: bool,
    animating: bool,
    rotation: Rotation,
    orientation: Orientation,
    anchor: GridCoord,
}

impl TileSlot {
    /// Whether the instance is logically present.
    #[must_use]
    pub const fn exists(&self) -> bool {
        self.exists
    }

    /// Highlight state, unrelated to occupancy.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Whether the renderer reported a transition in progress.
    #[must_use]
    pub const fn is_animating(&self) -> bool {
        self.animating
    }

    /// Display rotation.
    #[must_use]
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Which footprint axis mapping the instance was placed with.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Anchor cell of the footprint the instance covers.
    #[must_use]
    pub const fn anchor(&self) -> GridCoord {
        self.anchor
    }
}

impl Tombstone for TileSlot {
    fn exists(&self) -> bool {
        self.exists
    }

    fn bury(&mut self) {
        self.exists = false;
        self.is_active = false;
    }
}

/// Slot table for every instance of one tile type.
#[derive(Clone, Debug)]
pub struct TileTable {
    kind: TileKind,
    footprint: FootprintSize,
    slots: SlotTable<TileSlot>,
}

impl TileTable {
    /// Creates an empty table for `kind` with `capacity` preallocated slots.
    #[must_use]
    pub fn new(kind: TileKind, footprint: FootprintSize, capacity: usize) -> Self {
        Self {
            kind,
            footprint,
            slots: SlotTable::with_capacity(capacity),
        }
    }

    /// Tile type stored in this table.
    #[must_use]
    pub const fn kind(&self) -> &TileKind {
        &self.kind
    }

    /// Footprint of the type as authored.
    #[must_use]
    pub const fn footprint(&self) -> FootprintSize {
        self.footprint
    }

    /// Footprint covered when placed with `orientation`.
    #[must_use]
    pub const fn footprint_for(&self, orientation: Orientation) -> FootprintSize {
        self.footprint.oriented(orientation)
    }

    /// Number of slots ever allocated.
    #[must_use]
    pub fn count(&self) -> usize {
        self.slots.count()
    }

    /// Size of the preallocated instance buffer.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Slot record at `index`, tombstoned or not.
    #[must_use]
    pub fn slot(&self, index: SlotIndex) -> Option<&TileSlot> {
        self.slots.get(index)
    }

    /// Live instances in allocation order.
    pub fn live(&self) -> impl Iterator<Item = (SlotIndex, &TileSlot)> {
        self.slots.iter_live()
    }

    /// Pivot position for an instance anchored at `anchor` with `orientation`.
    #[must_use]
    pub fn placement_position(&self, anchor: GridCoord, orientation: Orientation) -> Vec3 {
        coords::placement_position(anchor, self.footprint_for(orientation))
    }

    /// Footprint covered by the instance at `index`.
    pub fn effective_footprint(&self, index: SlotIndex) -> Result<FootprintSize, SlotError> {
        let slot = self.slots.get(index).ok_or(SlotError::UnknownSlot(index))?;
        Ok(self.footprint_for(slot.orientation))
    }

    /// Writes a new instance at index `count` and occupies its footprint.
    ///
    /// The footprint is not re-validated; callers confirm
    /// [`Board::can_place`] first. Capacity is checked before anything is
    /// written, so a full table leaves both the slots and the board untouched.
    pub fn add(
        &mut self,
        board: &mut Board,
        anchor: GridCoord,
        rotation: Rotation,
        orientation: Orientation,
    ) -> Result<SlotIndex, SlotError> {
        let index = self.slots.push(TileSlot {
            exists: true,
            is_active: false,
            animating: false,
            rotation,
            orientation,
            anchor,
        })?;
        board.occupy(anchor, self.footprint_for(orientation));
        Ok(index)
    }

    /// Tombstones the instance and vacates its footprint; the index stays retired.
    pub fn remove(&mut self, board: &mut Board, index: SlotIndex) -> Result<GridCoord, SlotError> {
        let footprint = self.effective_footprint(index)?;
        let anchor = self.slots.bury(index)?.anchor;
        board.vacate(anchor, footprint);
        Ok(anchor)
    }

    /// Advances the display rotation; occupancy is unaffected.
    pub fn rotate(&mut self, index: SlotIndex, turn: Turn) -> Result<Rotation, SlotError> {
        let slot = self.slots.live_mut(index)?;
        slot.rotation = slot.rotation.turned(turn);
        Ok(slot.rotation)
    }

    /// Flips the highlight state.
    ///
    /// Returns `Ok(None)` without touching state while the instance is
    /// animating.
    pub fn toggle_active(&mut self, index: SlotIndex) -> Result<Option<bool>, SlotError> {
        let slot = self.slots.live_mut(index)?;
        if slot.animating {
            return Ok(None);
        }
        slot.is_active = !slot.is_active;
        Ok(Some(slot.is_active))
    }

    /// Records whether the renderer is animating the instance.
    pub fn set_animating(&mut self, index: SlotIndex, animating: bool) -> Result<(), SlotError> {
        self.slots.live_mut(index)?.animating = animating;
        Ok(())
    }
}
