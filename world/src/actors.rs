//! Instance registry for actors: characters and props with a directly owned pivot.

use dungeon_editor_core::{
    coords, ActorKind, FootprintSize, GridCoord, Rotation, SlotIndex, Spin, Step,
};
use glam::Vec3;

use crate::{
    board::Board,
    slots::{SlotError, SlotTable, Tombstone},
};

/// Details of an actor that was just placed.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedActor {
    /// Ordinal the actor was assigned.
    pub ordinal: SlotIndex,
    /// Pivot at the centre of its footprint.
    pub position: Vec3,
    /// State action it starts in.
    pub action: Option<String>,
}

/// One placed actor.
#[derive(Clone, Debug, PartialEq)]
pub struct ActorInstance {
    name: String,
    exists: bool,
    rotation: Rotation,
    position: Vec3,
    current_action: Option<String>,
}

impl ActorInstance {
    /// Name of the instance, formed as `{type}-{ordinal}`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the actor is logically present.
    #[must_use]
    pub const fn exists(&self) -> bool {
        self.exists
    }

    /// Facing of the actor.
    #[must_use]
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Pivot position at the centre of the actor's footprint.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// State action the actor is performing, if any.
    #[must_use]
    pub fn current_action(&self) -> Option<&str> {
        self.current_action.as_deref()
    }
}

impl Tombstone for ActorInstance {
    fn exists(&self) -> bool {
        self.exists
    }

    fn bury(&mut self) {
        self.exists = false;
    }
}

/// Failures specific to actor commands.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActorError {
    /// Slot bookkeeping failed.
    #[error(transparent)]
    Slot(#[from] SlotError),
    /// The actor's footprint would leave the board.
    #[error("actor footprint would leave the board")]
    OutOfBounds,
    /// The action is not a state action of this actor type.
    #[error("actor type has no state action '{0}'")]
    UnknownAction(String),
}

/// Slot table for every actor of one type.
#[derive(Clone, Debug)]
pub struct ActorTable {
    kind: ActorKind,
    footprint: FootprintSize,
    actions: Vec<String>,
    slots: SlotTable<ActorInstance>,
}

impl ActorTable {
    /// Creates an empty table for `kind`.
    #[must_use]
    pub fn new(
        kind: ActorKind,
        footprint: FootprintSize,
        actions: Vec<String>,
        capacity: usize,
    ) -> Self {
        Self {
            kind,
            footprint,
            actions,
            slots: SlotTable::with_capacity(capacity),
        }
    }

    /// Actor type stored in this table.
    #[must_use]
    pub const fn kind(&self) -> &ActorKind {
        &self.kind
    }

    /// Static footprint of the type.
    #[must_use]
    pub const fn footprint(&self) -> FootprintSize {
        self.footprint
    }

    /// State actions an actor of this type may perform.
    #[must_use]
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    /// Number of ordinals ever allocated.
    #[must_use]
    pub fn count(&self) -> usize {
        self.slots.count()
    }

    /// Configured capacity of the table.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Actor at `ordinal`, removed or not.
    #[must_use]
    pub fn get(&self, ordinal: SlotIndex) -> Option<&ActorInstance> {
        self.slots.get(ordinal)
    }

    /// Live actors in placement order.
    pub fn live(&self) -> impl Iterator<Item = (SlotIndex, &ActorInstance)> {
        self.slots.iter_live()
    }

    /// Anchor cell recovered from an actor's pivot.
    #[must_use]
    pub fn anchor_of(&self, actor: &ActorInstance) -> GridCoord {
        coords::anchor_from_placement_position(actor.position, self.footprint)
    }

    /// Places a new actor. Actors stand on tiles and never occupy board cells.
    pub fn add(
        &mut self,
        board: &Board,
        anchor: GridCoord,
        rotation: Rotation,
        action: Option<String>,
    ) -> Result<PlacedActor, ActorError> {
        if !board.contains(anchor, self.footprint) {
            return Err(ActorError::OutOfBounds);
        }
        if let Some(action) = &action {
            self.validate_action(action)?;
        }
        let ordinal = self.slots.ensure_vacancy()?;
        let position = coords::placement_position(anchor, self.footprint);
        let actor = ActorInstance {
            name: format!("{}-{}", self.kind, ordinal.get()),
            exists: true,
            rotation,
            position,
            current_action: action.clone(),
        };
        let ordinal = self.slots.push(actor)?;
        Ok(PlacedActor {
            ordinal,
            position,
            action,
        })
    }

    /// Applies a quarter turn.
    pub fn rotate(&mut self, ordinal: SlotIndex, spin: Spin) -> Result<Rotation, ActorError> {
        let actor = self.slots.live_mut(ordinal)?;
        actor.rotation = actor.rotation.spun(spin);
        Ok(actor.rotation)
    }

    /// Moves the actor one cell along or against its facing.
    pub fn step(
        &mut self,
        board: &Board,
        ordinal: SlotIndex,
        step: Step,
    ) -> Result<Vec3, ActorError> {
        let footprint = self.footprint;
        let actor = self.slots.live(ordinal)?;
        let (dq, ds) = actor.rotation.facing();
        let (dq, ds) = match step {
            Step::Forward => (dq, ds),
            Step::Backward => (-dq, -ds),
        };
        let destination = self.anchor_of(actor).offset(dq, ds);
        if !board.contains(destination, footprint) {
            return Err(ActorError::OutOfBounds);
        }

        let actor = self.slots.live_mut(ordinal)?;
        actor.position = coords::placement_position(destination, footprint);
        Ok(actor.position)
    }

    /// Replaces the current state action, returning the previous one.
    pub fn set_action(
        &mut self,
        ordinal: SlotIndex,
        action: Option<String>,
    ) -> Result<Option<String>, ActorError> {
        if let Some(action) = &action {
            self.validate_action(action)?;
        }
        let actor = self.slots.live_mut(ordinal)?;
        Ok(std::mem::replace(&mut actor.current_action, action))
    }

    /// Tombstones the actor; its ordinal is never handed out again.
    pub fn remove(&mut self, ordinal: SlotIndex) -> Result<(), ActorError> {
        let _ = self.slots.bury(ordinal)?;
        Ok(())
    }

    fn validate_action(&self, action: &str) -> Result<(), ActorError> {
        if self.actions.iter().any(|known| known == action) {
            Ok(())
        } else {
            Err(ActorError::UnknownAction(action.to_owned()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goblins(capacity: usize) -> ActorTable {
        ActorTable::new(
            ActorKind::new("goblin"),
            FootprintSize::UNIT,
            vec!["Idle".to_owned(), "Run".to_owned()],
            capacity,
        )
    }

    #[test]
    fn actors_are_named_by_type_and_ordinal() {
        let board = Board::new(8, 8);
        let mut table = goblins(4);
        let first = table
            .add(&board, GridCoord::new(0, 0), Rotation::default(), None)
            .expect("placed")
            .ordinal;
        let second = table
            .add(&board, GridCoord::new(0, 0), Rotation::default(), Some("Idle".to_owned()))
            .expect("placed")
            .ordinal;

        assert_eq!(table.get(first).map(ActorInstance::name), Some("goblin-0"));
        assert_eq!(table.get(second).map(ActorInstance::name), Some("goblin-1"));
        assert_eq!(table.get(second).and_then(ActorInstance::current_action), Some("Idle"));
        assert!(board.can_place(GridCoord::new(0, 0), FootprintSize::UNIT));
    }

    #[test]
    fn anchor_is_recovered_from_pivot() {
        let board = Board::new(8, 8);
        let mut table = goblins(1);
        let ordinal = table
            .add(&board, GridCoord::new(-3, 2), Rotation::new(1), None)
            .expect("placed")
            .ordinal;
        let actor = table.get(ordinal).expect("actor");
        assert_eq!(actor.position(), Vec3::new(-2.5, 0.0, 2.5));
        assert_eq!(table.anchor_of(actor), GridCoord::new(-3, 2));
    }

    #[test]
    fn step_follows_facing_and_respects_bounds() {
        let board = Board::new(4, 4);
        let mut table = goblins(1);
        let ordinal = table
            .add(&board, GridCoord::new(0, 0), Rotation::new(1), None)
            .expect("placed")
            .ordinal;

        assert_eq!(
            table.step(&board, ordinal, Step::Forward),
            Ok(Vec3::new(1.5, 0.0, 0.5))
        );
        assert_eq!(
            table.step(&board, ordinal, Step::Forward),
            Err(ActorError::OutOfBounds)
        );
        assert_eq!(
            table.step(&board, ordinal, Step::Backward),
            Ok(Vec3::new(0.5, 0.0, 0.5))
        );
    }

    #[test]
    fn unknown_actions_are_rejected() {
        let board = Board::new(4, 4);
        let mut table = goblins(1);
        let ordinal = table
            .add(&board, GridCoord::new(0, 0), Rotation::default(), None)
            .expect("placed")
            .ordinal;

        assert_eq!(
            table.set_action(ordinal, Some("Dance".to_owned())),
            Err(ActorError::UnknownAction("Dance".to_owned()))
        );
        assert_eq!(table.set_action(ordinal, Some("Run".to_owned())), Ok(None));
        assert_eq!(table.set_action(ordinal, None), Ok(Some("Run".to_owned())));
    }

    #[test]
    fn removed_actor_ordinal_is_retired() {
        let board = Board::new(4, 4);
        let mut table = goblins(3);
        let first = table
            .add(&board, GridCoord::new(0, 0), Rotation::default(), None)
            .expect("placed")
            .ordinal;
        table.remove(first).expect("live actor");

        assert_eq!(
            table.rotate(first, Spin::Clockwise),
            Err(ActorError::Slot(SlotError::Removed(first)))
        );
        let next = table
            .add(&board, GridCoord::new(0, 0), Rotation::default(), None)
            .expect("placed")
            .ordinal;
        assert_eq!(next, SlotIndex::new(1));
        assert_eq!(table.live().count(), 1);
    }

    #[test]
    fn placement_outside_board_is_rejected() {
        let board = Board::new(4, 4);
        let mut table = goblins(1);
        assert_eq!(
            table.add(&board, GridCoord::new(2, 0), Rotation::default(), None),
            Err(ActorError::OutOfBounds)
        );
        assert_eq!(table.count(), 0);
    }
}
