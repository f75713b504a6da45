//! Fixed-capacity, append-only slot storage shared by tile and actor tables.

use dungeon_editor_core::{InstanceError, SlotIndex};

/// Per-slot record that can be tombstoned.
pub trait Tombstone {
    /// Whether the slot still holds a logically present instance.
    fn exists(&self) -> bool;

    /// Marks the slot as logically deleted.
    fn bury(&mut self);
}

/// Failures raised by slot bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    /// Every preallocated slot has been handed out.
    #[error("all {capacity} instance slots are allocated")]
    CapacityExceeded {
        /// Configured capacity of the table.
        capacity: usize,
    },
    /// The index was never allocated.
    #[error("slot {0:?} was never allocated")]
    UnknownSlot(SlotIndex),
    /// The slot was tombstoned.
    #[error("slot {0:?} was removed")]
    Removed(SlotIndex),
}

impl From<SlotError> for InstanceError {
    fn from(error: SlotError) -> Self {
        match error {
            SlotError::UnknownSlot(_) | SlotError::CapacityExceeded { .. } => {
                InstanceError::UnknownInstance
            }
            SlotError::Removed(_) => InstanceError::Removed,
        }
    }
}

/// Dense table whose indices are handed out once and never reused.
#[derive(Clone, Debug)]
pub struct SlotTable<T> {
    capacity: usize,
    slots: Vec<T>,
}

impl<T: Tombstone> SlotTable<T> {
    /// Creates an empty table with storage reserved for `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Number of slots ever allocated, tombstones included.
    #[must_use]
    pub fn count(&self) -> usize {
        self.slots.len()
    }

    /// Configured capacity of the table.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Verifies that another slot can be allocated.
    pub fn ensure_vacancy(&self) -> Result<SlotIndex, SlotError> {
        if self.slots.len() >= self.capacity {
            return Err(SlotError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        u32::try_from(self.slots.len())
            .map(SlotIndex::new)
            .map_err(|_| SlotError::CapacityExceeded {
                capacity: self.capacity,
            })
    }

    /// Appends a record at index `count`. Nothing is written when the table is full.
    pub fn push(&mut self, value: T) -> Result<SlotIndex, SlotError> {
        let index = self.ensure_vacancy()?;
        self.slots.push(value);
        Ok(index)
    }

    /// Record stored at `index`, tombstoned or not.
    #[must_use]
    pub fn get(&self, index: SlotIndex) -> Option<&T> {
        self.slots.get(index.as_usize())
    }

    /// Live record stored at `index`.
    pub fn live(&self, index: SlotIndex) -> Result<&T, SlotError> {
        let slot = self.get(index).ok_or(SlotError::UnknownSlot(index))?;
        if slot.exists() {
            Ok(slot)
        } else {
            Err(SlotError::Removed(index))
        }
    }

    /// Mutable live record stored at `index`.
    pub fn live_mut(&mut self, index: SlotIndex) -> Result<&mut T, SlotError> {
        let slot = self
            .slots
            .get_mut(index.as_usize())
            .ok_or(SlotError::UnknownSlot(index))?;
        if slot.exists() {
            Ok(slot)
        } else {
            Err(SlotError::Removed(index))
        }
    }

    /// Tombstones the live record at `index`, keeping the index allocated.
    pub fn bury(&mut self, index: SlotIndex) -> Result<&T, SlotError> {
        let slot = self.live_mut(index)?;
        slot.bury();
        Ok(slot)
    }

    /// Iterates live records in allocation order.
    pub fn iter_live(&self) -> impl Iterator<Item = (SlotIndex, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.exists())
            .map(|(index, slot)| (SlotIndex::new(index as u32), slot))
    }
}
