//! Durable backing for the in-memory engine.
//!
//! The engine is authoritative. A mirror seeds it at startup and receives
//! a copy of every committed create and cancel, in commit order.

use std::sync::{Condvar, Mutex, PoisonError};

use thiserror::Error;

use crate::booking::Booking;
use crate::types::BookingId;

/// A persistence backend failed.
#[derive(Debug, Error)]
#[error("booking persistence failed: {source}")]
pub struct MirrorError {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl MirrorError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// A write-through copy of the booking collection.
pub trait BookingMirror: Send + Sync {
    /// Every persisted booking, used to seed the engine.
    fn load_all(&self) -> Result<Vec<Booking>, MirrorError>;

    fn on_create(&self, booking: &Booking) -> Result<(), MirrorError>;

    fn on_cancel(&self, id: &BookingId) -> Result<(), MirrorError>;
}

/// When the engine calls the mirror relative to its critical section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MirrorMode {
    /// After the lock is released. Writes still reach the mirror in commit
    /// order; a failed write is logged and the in-memory change stands.
    #[default]
    AfterCommit,
    /// While still holding the lock. A failed write undoes the in-memory
    /// change and the operation returns
    /// [`BookingError::NotPersisted`](crate::BookingError::NotPersisted).
    InsideLock,
}

/// Lets after-commit mirror writes through one at a time, in the order
/// their commits happened.
///
/// A ticket is issued while the commit still holds the store's write lock;
/// the write to the mirror happens once every earlier ticket is done.
#[derive(Debug, Default)]
pub(crate) struct CommitOrder {
    issued: Mutex<u64>,
    next: Mutex<u64>,
    turn: Condvar,
}

impl CommitOrder {
    /// Must be called under the store's write lock.
    pub fn issue(&self) -> u64 {
        let mut issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);
        let ticket = *issued;
        *issued += 1;
        ticket
    }

    /// Blocks until `ticket` is next. The returned guard passes the turn on
    /// when dropped.
    pub fn wait(&self, ticket: u64) -> Turn<'_> {
        let next = self.next.lock().unwrap_or_else(PoisonError::into_inner);
        let next = self
            .turn
            .wait_while(next, |next| *next != ticket)
            .unwrap_or_else(PoisonError::into_inner);
        drop(next);
        Turn { order: self }
    }
}

pub(crate) struct Turn<'a> {
    order: &'a CommitOrder,
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        let mut next = self.order.next.lock().unwrap_or_else(PoisonError::into_inner);
        *next += 1;
        self.order.turn.notify_all();
    }
}
