//! Occupancy grid: the board's cells and the footprints anchored on them.

use dungeon_editor_core::{
    coords::{self, GridExtents},
    FootprintSize, GridCoord, PlacementError,
};
use glam::Vec3;
use tracing::trace;

/// One grid unit of the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    coord: GridCoord,
    walkable: bool,
    has_tile: bool,
    is_anchor: Option<bool>,
    anchor_ref: Option<GridCoord>,
}

impl Cell {
    fn new(coord: GridCoord, walkable: bool) -> Self {
        Self {
            coord,
            walkable,
            has_tile: false,
            is_anchor: None,
            anchor_ref: None,
        }
    }

    /// Coordinates of the cell.
    #[must_use]
    pub const fn coord(&self) -> GridCoord {
        self.coord
    }

    /// Static terrain walkability, independent of occupancy.
    #[must_use]
    pub const fn walkable(&self) -> bool {
        self.walkable
    }

    /// Whether any footprint covers this cell.
    #[must_use]
    pub const fn has_tile(&self) -> bool {
        self.has_tile
    }

    /// `Some(true)` for an anchor, `Some(false)` for a covered non-anchor, `None` when free.
    #[must_use]
    pub const fn is_anchor(&self) -> Option<bool> {
        self.is_anchor
    }

    /// Coordinates of the footprint's anchor when this cell is covered but not the anchor.
    #[must_use]
    pub const fn anchor_ref(&self) -> Option<GridCoord> {
        self.anchor_ref
    }

    fn cover(&mut self, anchor: GridCoord) {
        self.has_tile = true;
        if anchor == self.coord {
            self.is_anchor = Some(true);
            self.anchor_ref = None;
        } else {
            self.is_anchor = Some(false);
            self.anchor_ref = Some(anchor);
        }
    }

    fn clear(&mut self) {
        self.has_tile = false;
        self.is_anchor = None;
        self.anchor_ref = None;
    }
}

/// Occupancy bookkeeping no longer resolves to an anchor cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("cell {cell} references anchor {anchor:?}, which is missing or not an anchor")]
pub struct InvalidAnchorReference {
    /// Cell whose reference failed to resolve.
    pub cell: GridCoord,
    /// Reference stored in the cell.
    pub anchor: Option<GridCoord>,
}

/// Fixed-size grid of cells centred on the origin.
#[derive(Clone, Debug)]
pub struct Board {
    extents: GridExtents,
    cells: Vec<Cell>,
}

impl Board {
    /// Creates a board whose terrain is walkable everywhere.
    #[must_use]
    pub fn new(q: u32, s: u32) -> Self {
        Self::with_terrain(q, s, |_| true)
    }

    /// Creates a board whose terrain walkability is decided per cell.
    #[must_use]
    pub fn with_terrain(q: u32, s: u32, mut walkable: impl FnMut(GridCoord) -> bool) -> Self {
        let extents = GridExtents::for_dimensions(q, s);
        let q_half = extents.q_half() as i32;
        let s_half = extents.s_half() as i32;
        let capacity = extents.columns() as usize * extents.rows() as usize;
        let mut cells = Vec::with_capacity(capacity);
        for s in -s_half..s_half {
            for q in -q_half..q_half {
                let coord = GridCoord::new(q, s);
                cells.push(Cell::new(coord, walkable(coord)));
            }
        }

        Self { extents, cells }
    }

    /// Half extents the board was constructed with.
    #[must_use]
    pub const fn extents(&self) -> GridExtents {
        self.extents
    }

    /// Looks up a cell, returning `None` when the coordinate lies outside the board.
    #[must_use]
    pub fn cell_at(&self, coord: GridCoord) -> Option<&Cell> {
        self.index(coord).and_then(|index| self.cells.get(index))
    }

    /// Looks up the cell containing a world point.
    #[must_use]
    pub fn cell_at_point(&self, point: Vec3) -> Option<&Cell> {
        self.cell_at(coords::world_to_grid_coord(point))
    }

    /// Resolves the anchor of the footprint covering `cell`.
    ///
    /// An unoccupied cell has no anchor and is reported the same way as a
    /// dangling reference.
    pub fn resolve_anchor<'a>(&'a self, cell: &'a Cell) -> Result<&'a Cell, InvalidAnchorReference> {
        if cell.is_anchor == Some(true) {
            return Ok(cell);
        }

        let invalid = InvalidAnchorReference {
            cell: cell.coord,
            anchor: cell.anchor_ref,
        };
        let anchor = cell.anchor_ref.ok_or(invalid)?;
        match self.cell_at(anchor) {
            Some(resolved) if resolved.is_anchor == Some(true) => Ok(resolved),
            _ => Err(invalid),
        }
    }

    /// Checks whether a footprint anchored at `anchor` fits entirely on free cells.
    #[must_use]
    pub fn can_place(&self, anchor: GridCoord, size: FootprintSize) -> bool {
        self.check_placement(anchor, size).is_ok()
    }

    /// Same as [`Board::can_place`] but reports why the footprint does not fit.
    ///
    /// Stops at the first cell that is either missing or already covered. A
    /// footprint longer than the board on either axis is out of bounds.
    pub fn check_placement(
        &self,
        anchor: GridCoord,
        size: FootprintSize,
    ) -> Result<(), PlacementError> {
        if size.q_length() > self.extents.columns() || size.s_length() > self.extents.rows() {
            return Err(PlacementError::OutOfBounds);
        }
        for coord in size.cells(anchor) {
            match self.cell_at(coord) {
                None => return Err(PlacementError::OutOfBounds),
                Some(cell) if cell.has_tile => return Err(PlacementError::Occupied),
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Checks whether every cell of the footprint exists, ignoring occupancy.
    #[must_use]
    pub fn contains(&self, anchor: GridCoord, size: FootprintSize) -> bool {
        size.cells(anchor).all(|coord| self.index(coord).is_some())
    }

    /// Marks the footprint as covered, with `anchor` as its anchor cell.
    ///
    /// Callers must have confirmed [`Board::can_place`]; the check is not repeated.
    pub fn occupy(&mut self, anchor: GridCoord, size: FootprintSize) {
        debug_assert!(self.can_place(anchor, size), "occupy without can_place");
        for coord in size.cells(anchor) {
            if let Some(cell) = self.cell_mut(coord) {
                cell.cover(anchor);
            }
        }
        trace!(%anchor, ?size, "footprint occupied");
    }

    /// Frees every cell of the footprint.
    ///
    /// No check is made that the footprint matches what was occupied.
    pub fn vacate(&mut self, anchor: GridCoord, size: FootprintSize) {
        for coord in size.cells(anchor) {
            if let Some(cell) = self.cell_mut(coord) {
                cell.clear();
            }
        }
        trace!(%anchor, ?size, "footprint vacated");
    }

    /// Updates a cell's terrain walkability.
    ///
    /// Returns `false` when the coordinate lies outside the board.
    pub fn set_walkable(&mut self, coord: GridCoord, walkable: bool) -> bool {
        let Some(cell) = self.cell_mut(coord) else {
            return false;
        };
        cell.walkable = walkable;
        true
    }

    /// Row-major matrix of `1` for walkable terrain and `0` otherwise.
    ///
    /// Derived from the cells on every call.
    #[must_use]
    pub fn walkability_matrix(&self) -> Vec<Vec<u8>> {
        let columns = self.extents.columns() as usize;
        self.cells
            .chunks(columns.max(1))
            .map(|row| row.iter().map(|cell| u8::from(cell.walkable)).collect())
            .collect()
    }

    /// Iterates all cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    fn cell_mut(&mut self, coord: GridCoord) -> Option<&mut Cell> {
        self.index(coord).and_then(|index| self.cells.get_mut(index))
    }

    fn index(&self, coord: GridCoord) -> Option<usize> {
        let index = coords::grid_coord_to_index(self.extents, coord);
        let row = usize::try_from(index.row).ok()?;
        let col = usize::try_from(index.col).ok()?;
        let columns = self.extents.columns() as usize;
        if row < self.extents.rows() as usize && col < columns {
            Some(row * columns + col)
        } else {
            None
        }
    }
}
