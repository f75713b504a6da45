#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Renderer-side mirror of the dungeon editor world.
//!
//! [`InstanceBuffers`] keeps one transform buffer per tile type, indexed by
//! slot, and one pose per actor. It never mutates the world; it only replays
//! the events the world broadcasts.

use std::collections::{HashMap, HashSet};

use dungeon_editor_core::{
    transforms::InstanceTransforms, ActorId, Event, Rotation, SlotIndex, TileId, TileKind,
};
use glam::{Mat4, Vec3};
use tracing::trace;

/// Presentation state of one actor.
#[derive(Clone, Debug, PartialEq)]
pub struct ActorPose {
    /// Pivot position.
    pub position: Vec3,
    /// Facing.
    pub rotation: Rotation,
    /// Animation clip currently playing.
    pub action: Option<String>,
}

/// Per-type instance transform buffers.
#[derive(Clone, Debug, Default)]
pub struct InstanceBuffers {
    tiles: HashMap<TileKind, Vec<Mat4>>,
    highlighted: HashSet<TileId>,
    actors: HashMap<ActorId, ActorPose>,
}

impl InstanceBuffers {
    /// Creates empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirrors a batch of world events.
    pub fn apply_events(&mut self, events: &[Event]) {
        for event in events {
            self.apply_event(event);
        }
    }

    /// Number of transforms allocated for `kind`, hidden ones included.
    #[must_use]
    pub fn instance_count(&self, kind: &TileKind) -> usize {
        self.tiles.get(kind).map_or(0, Vec::len)
    }

    /// Whether the tile is drawn highlighted.
    #[must_use]
    pub fn is_highlighted(&self, tile: &TileId) -> bool {
        self.highlighted.contains(tile)
    }

    /// Presentation state of a live actor.
    #[must_use]
    pub fn actor_pose(&self, actor: &ActorId) -> Option<&ActorPose> {
        self.actors.get(actor)
    }

    fn apply_event(&mut self, event: &Event) {
        match event {
            Event::TilePlaced {
                tile,
                rotation,
                position,
                ..
            } => {
                self.set_transform_at(&tile.kind, tile.slot, pose_matrix(*position, *rotation));
            }
            Event::TileRotated { tile, rotation, .. } => {
                if let Some(position) = self.position_at(&tile.kind, tile.slot) {
                    self.set_transform_at(&tile.kind, tile.slot, pose_matrix(position, *rotation));
                }
            }
            Event::TileRemoved { tile, .. } => {
                if let Some(transform) = self.transform_at(&tile.kind, tile.slot) {
                    let hidden = transform * Mat4::from_scale(Vec3::ZERO);
                    self.set_transform_at(&tile.kind, tile.slot, hidden);
                }
                let _ = self.highlighted.remove(tile);
            }
            Event::TileActiveToggled { tile, active } => {
                if *active {
                    let _ = self.highlighted.insert(tile.clone());
                } else {
                    let _ = self.highlighted.remove(tile);
                }
            }
            Event::ActorPlaced {
                actor,
                position,
                rotation,
                action,
            } => {
                let _ = self.actors.insert(
                    actor.clone(),
                    ActorPose {
                        position: *position,
                        rotation: *rotation,
                        action: action.clone(),
                    },
                );
            }
            Event::ActorRotated { actor, rotation } => {
                if let Some(pose) = self.actors.get_mut(actor) {
                    pose.rotation = *rotation;
                }
            }
            Event::ActorMoved { actor, position } => {
                if let Some(pose) = self.actors.get_mut(actor) {
                    pose.position = *position;
                }
            }
            Event::ActorActionChanged { actor, current, .. } => {
                if let Some(pose) = self.actors.get_mut(actor) {
                    pose.action.clone_from(current);
                }
            }
            Event::ActorRemoved { actor } => {
                let _ = self.actors.remove(actor);
            }
            _ => {}
        }
    }
}

impl InstanceTransforms for InstanceBuffers {
    fn set_transform_at(&mut self, kind: &TileKind, slot: SlotIndex, transform: Mat4) {
        let buffer = self.tiles.entry(kind.clone()).or_default();
        let index = slot.as_usize();
        if buffer.len() <= index {
            buffer.resize(index + 1, Mat4::from_scale(Vec3::ZERO));
        }
        trace!(%kind, slot = slot.get(), "instance transform updated");
        buffer[index] = transform;
    }

    fn transform_at(&self, kind: &TileKind, slot: SlotIndex) -> Option<Mat4> {
        self.tiles
            .get(kind)
            .and_then(|buffer| buffer.get(slot.as_usize()))
            .copied()
    }
}

fn pose_matrix(position: Vec3, rotation: Rotation) -> Mat4 {
    Mat4::from_translation(position) * Mat4::from_rotation_y(rotation.radians())
}
