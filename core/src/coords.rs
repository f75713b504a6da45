//! Pure transforms between world positions, grid coordinates and array indices.
//!
//! The board is centred on the origin, so grid coordinates range from
//! `-half` to `half - 1` on each axis. World space uses `x` for the `q` axis,
//! `z` for the `s` axis and `y` as the vertical axis, which never takes part
//! in grid addressing.

use glam::Vec3;

use crate::{FootprintSize, GridCoord};

/// Largest board dimension, in cells, along either axis.
pub const MAX_BOARD_DIMENSION: u32 = 4096;

/// Half extents of a board measured in whole cells along each axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridExtents {
    q_half: u32,
    s_half: u32,
}

impl GridExtents {
    /// Derives the half extents for a board constructed with the provided dimensions.
    ///
    /// Odd dimensions round up, so a board requested as `5 x 3` allocates
    /// `6 x 4` cells. Dimensions above [`MAX_BOARD_DIMENSION`] are clamped to it.
    #[must_use]
    pub const fn for_dimensions(q: u32, s: u32) -> Self {
        Self {
            q_half: clamp_dimension(q).div_ceil(2),
            s_half: clamp_dimension(s).div_ceil(2),
        }
    }

    /// Half extent along the `q` axis.
    #[must_use]
    pub const fn q_half(&self) -> u32 {
        self.q_half
    }

    /// Half extent along the `s` axis.
    #[must_use]
    pub const fn s_half(&self) -> u32 {
        self.s_half
    }

    /// Number of cell columns allocated for the board.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.q_half * 2
    }

    /// Number of cell rows allocated for the board.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.s_half * 2
    }
}

const fn clamp_dimension(length: u32) -> u32 {
    if length > MAX_BOARD_DIMENSION {
        MAX_BOARD_DIMENSION
    } else {
        length
    }
}

/// Row and column of a cell inside the board's row-major storage.
///
/// Values are signed because the conversion performs no bounds check; a
/// coordinate left of or above the board maps to a negative index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridIndex {
    /// Row index, derived from the `s` coordinate.
    pub row: i64,
    /// Column index, derived from the `q` coordinate.
    pub col: i64,
}

/// Floors the horizontal axes of a world position into a grid coordinate.
///
/// The vertical axis is ignored. Already-integral positions map to themselves.
#[must_use]
pub fn world_to_grid_coord(point: Vec3) -> GridCoord {
    GridCoord::new(point.x.floor() as i32, point.z.floor() as i32)
}

/// Maps a grid coordinate onto the board's storage indices without bounds checks.
#[must_use]
pub fn grid_coord_to_index(extents: GridExtents, coord: GridCoord) -> GridIndex {
    GridIndex {
        row: i64::from(coord.s()) + i64::from(extents.s_half()),
        col: i64::from(coord.q()) + i64::from(extents.q_half()),
    }
}

/// Inverse of [`grid_coord_to_index`].
#[must_use]
pub fn index_to_grid_coord(extents: GridExtents, index: GridIndex) -> GridCoord {
    GridCoord::new(
        (index.col - i64::from(extents.q_half())) as i32,
        (index.row - i64::from(extents.s_half())) as i32,
    )
}

/// World position of an object's pivot: the geometric centre of its footprint.
#[must_use]
pub fn placement_position(anchor: GridCoord, size: FootprintSize) -> Vec3 {
    Vec3::new(
        anchor.q() as f32 + size.q_length() as f32 / 2.0,
        0.0,
        anchor.s() as f32 + size.s_length() as f32 / 2.0,
    )
}

/// Recovers the anchor cell from a pivot produced by [`placement_position`].
#[must_use]
pub fn anchor_from_placement_position(position: Vec3, size: FootprintSize) -> GridCoord {
    let corner = Vec3::new(
        position.x - size.q_length() as f32 / 2.0,
        0.0,
        position.z - size.s_length() as f32 / 2.0,
    );
    world_to_grid_coord(corner)
}

/// Snaps a world point onto the centre of the cell containing it, on the ground plane.
#[must_use]
pub fn snap_to_cell_center(point: Vec3) -> Vec3 {
    placement_position(world_to_grid_coord(point), FootprintSize::UNIT)
}
