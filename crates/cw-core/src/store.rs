//! The authoritative booking collection.
//!
//! # Thread Safety
//!
//! All access goes through [`BookingStore`], which keeps the table behind one
//! `RwLock`. Readers get either a cloned snapshot or a closure run under the
//! read lock; every state transition runs as a single closure under the write
//! lock, so a check-then-insert can never interleave with another writer.
//! The lock is never exposed to callers.
//!
//! Slot uniqueness is structural: the table is keyed by [`Slot`], and the only
//! insertion path refuses an occupied key.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::{PoisonError, RwLock};

use crate::booking::Booking;
use crate::time::Slot;
use crate::types::{BookingId, UserId};

/// Bookings keyed by the slot they occupy.
#[derive(Debug, Default)]
pub struct SlotTable {
    slots: BTreeMap<Slot, Booking>,
}

impl SlotTable {
    pub fn is_free(&self, slot: &Slot) -> bool {
        !self.slots.contains_key(slot)
    }

    pub fn get(&self, slot: &Slot) -> Option<&Booking> {
        self.slots.get(slot)
    }

    pub fn find_by_id(&self, id: &BookingId) -> Option<&Booking> {
        self.slots.values().find(|booking| &booking.id == id)
    }

    /// Inserts `booking` if its slot is free. Returns `false` if occupied.
    pub fn insert(&mut self, booking: Booking) -> bool {
        match self.slots.entry(booking.slot()) {
            Entry::Vacant(entry) => {
                entry.insert(booking);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn remove(&mut self, slot: &Slot) -> Option<Booking> {
        self.slots.remove(slot)
    }

    /// Bookings in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Booking> {
        self.slots.values()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn user_bookings(&self, user_id: UserId) -> impl Iterator<Item = &Booking> {
        self.iter().filter(move |booking| booking.user_id == user_id)
    }

    /// Every entry is filed under its own slot and no ID appears twice.
    fn is_consistent(&self) -> bool {
        let mut ids = std::collections::HashSet::with_capacity(self.slots.len());
        self.slots
            .iter()
            .all(|(slot, booking)| *slot == booking.slot() && ids.insert(&booking.id))
    }
}

/// Serialized access to the [`SlotTable`].
///
/// See the [module documentation](self) for the locking contract.
#[derive(Debug, Default)]
pub struct BookingStore {
    table: RwLock<SlotTable>,
}

impl BookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all current bookings, in slot order.
    pub fn snapshot(&self) -> Vec<Booking> {
        self.read(|table| table.iter().cloned().collect())
    }

    /// Runs a read-only query against a consistent view of the table.
    pub fn read<R>(&self, query: impl FnOnce(&SlotTable) -> R) -> R {
        // Poisoning is safe to ignore: each insert or remove leaves the table
        // valid on its own, so a panic between two of them loses at most the
        // rest of that transition.
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        query(&table)
    }

    /// Runs one state transition with exclusive access.
    pub fn mutate<R>(&self, transition: impl FnOnce(&mut SlotTable) -> R) -> R {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        let result = transition(&mut table);
        debug_assert!(table.is_consistent(), "booking table is inconsistent");
        result
    }
}
