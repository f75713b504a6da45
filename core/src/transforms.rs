//! Renderer boundary for per-instance tile transforms.

use glam::{Mat4, Vec3};

use crate::{SlotIndex, TileKind};

/// Per-instance transform storage owned by a renderer.
///
/// Instances are addressed by tile type and slot index; the editor core never
/// owns rendering resources directly.
pub trait InstanceTransforms {
    /// Stores the transform of the instance at `slot`.
    fn set_transform_at(&mut self, kind: &TileKind, slot: SlotIndex, transform: Mat4);

    /// Transform of the instance at `slot`, if the renderer holds one.
    fn transform_at(&self, kind: &TileKind, slot: SlotIndex) -> Option<Mat4>;

    /// World position of the instance pivot.
    fn position_at(&self, kind: &TileKind, slot: SlotIndex) -> Option<Vec3> {
        self.transform_at(kind, slot)
            .map(|transform| transform.w_axis.truncate())
    }
}
