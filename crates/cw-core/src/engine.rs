//! Availability queries and booking lifecycle.
//!
//! [`BookingEngine`] is the single entry point the conversation layer talks
//! to. It owns the [`BookingStore`] and never hands out references into it:
//! every query returns copies.
//!
//! Expected outcomes (slot taken, unknown booking, wrong owner, bad input)
//! are ordinary [`BookingError`] values. The engine neither logs nor retries
//! them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::booking::{Booking, NewBooking, Vehicle, VehiclePolicy};
use crate::clock::{Clock, SystemClock};
use crate::mirror::{BookingMirror, CommitOrder, MirrorError, MirrorMode};
use crate::store::BookingStore;
use crate::time::{BookingDate, HourWindow, ParseError, Slot, SlotTime};
use crate::types::{BookingId, UserId, ValidationError};

/// Errors returned by engine operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The requested hour is not part of the availability window.
    #[error("{time} is outside opening hours {window}")]
    OutsideWindow { time: SlotTime, window: HourWindow },

    /// The slot is already booked.
    #[error("slot {slot} is already booked")]
    Conflict { slot: Slot },

    #[error("no such booking: {key}")]
    NotFound { key: CancelKey },

    /// The requester neither owns the booking nor is an administrator.
    #[error("user {requester} may not cancel booking {id}")]
    Forbidden { id: BookingId, requester: UserId },

    /// An inside-lock mirror write failed and the change was undone.
    #[error("booking for slot {slot} could not be saved: {reason}")]
    NotPersisted { slot: Slot, reason: String },
}

/// Failure to rebuild the engine from its mirror.
#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("failed to load persisted bookings")]
    Load(#[from] MirrorError),

    #[error("persisted bookings are inconsistent")]
    Seed(#[from] BookingError),
}

/// How a cancellation names its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelKey {
    /// The opaque booking ID.
    Id(BookingId),
    /// The owner's booking at a slot.
    Slot {
        user_id: UserId,
        date: BookingDate,
        time: SlotTime,
    },
}

impl fmt::Display for CancelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Slot {
                user_id,
                date,
                time,
            } => write!(f, "user {user_id} at {date} {time}"),
        }
    }
}

/// Who is asking for a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub user_id: UserId,
    /// Administrator privilege, decided by the caller.
    pub is_admin: bool,
}

impl Requester {
    #[must_use]
    pub const fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    #[must_use]
    pub const fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }

    fn may_cancel(self, booking: &Booking) -> bool {
        self.is_admin || booking.user_id == self.user_id
    }
}

/// Free/occupied status of one hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotStatus {
    pub time: SlotTime,
    pub available: bool,
}

/// Engine settings, fixed at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub window: HourWindow,
    pub vehicle_policy: VehiclePolicy,
    pub mirror_mode: MirrorMode,
}

impl EngineConfig {
    #[must_use]
    pub fn new(window: HourWindow) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_vehicle_policy(mut self, policy: VehiclePolicy) -> Self {
        self.vehicle_policy = policy;
        self
    }

    #[must_use]
    pub const fn with_mirror_mode(mut self, mode: MirrorMode) -> Self {
        self.mirror_mode = mode;
        self
    }
}

/// The booking and availability engine.
pub struct BookingEngine {
    store: BookingStore,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    mirror: Option<Arc<dyn BookingMirror>>,
    mirror_order: CommitOrder,
}

impl fmt::Debug for BookingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookingEngine")
            .field("store", &self.store)
            .field("config", &self.config)
            .field("mirror", &self.mirror.is_some())
            .finish_non_exhaustive()
    }
}

impl BookingEngine {
    /// Creates an empty engine using the system clock.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            store: BookingStore::new(),
            config,
            clock: Arc::new(SystemClock),
            mirror: None,
            mirror_order: CommitOrder::default(),
        }
    }

    /// Creates an engine holding `seed`.
    ///
    /// Fails with [`BookingError::Conflict`] if two seeded bookings share a slot.
    pub fn with_bookings(
        config: EngineConfig,
        seed: impl IntoIterator<Item = Booking>,
    ) -> Result<Self, BookingError> {
        let engine = Self::new(config);
        engine.store.mutate(|table| {
            for booking in seed {
                let slot = booking.slot();
                if !table.insert(booking) {
                    return Err(BookingError::Conflict { slot });
                }
            }
            Ok(())
        })?;
        Ok(engine)
    }

    /// Seeds an engine from `mirror` and attaches it for subsequent writes.
    pub fn restore(
        config: EngineConfig,
        mirror: Arc<dyn BookingMirror>,
    ) -> Result<Self, RestoreError> {
        let seed = mirror.load_all()?;
        Ok(Self::with_bookings(config, seed)?.with_mirror(mirror))
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_mirror(mut self, mirror: Arc<dyn BookingMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub const fn window(&self) -> HourWindow {
        self.config.window
    }

    /// True iff no booking occupies `(date, time)`.
    pub fn is_available(&self, date: BookingDate, time: SlotTime) -> bool {
        let slot = Slot::new(date, time);
        self.store.read(|table| table.is_free(&slot))
    }

    /// Free hours of `date` within the window, ascending.
    pub fn available_slots(&self, date: BookingDate) -> Vec<SlotTime> {
        self.slot_statuses(date)
            .into_iter()
            .filter(|status| status.available)
            .map(|status| status.time)
            .collect()
    }

    /// Every hour of `date` within the window with its status, ascending.
    pub fn slot_statuses(&self, date: BookingDate) -> Vec<SlotStatus> {
        let window = self.config.window;
        self.store.read(|table| {
            window
                .slots()
                .map(|time| SlotStatus {
                    time,
                    available: table.is_free(&Slot::new(date, time)),
                })
                .collect()
        })
    }

    /// Books a slot if it is free.
    ///
    /// The availability check and the insert happen under one write lock. A
    /// [`BookingError::Conflict`] means the caller should offer another slot.
    /// Under [`MirrorMode::InsideLock`] the booking only stands if the mirror
    /// accepted it; otherwise it is removed again and
    /// [`BookingError::NotPersisted`] is returned.
    pub fn create_booking(&self, request: NewBooking) -> Result<Booking, BookingError> {
        let window = self.config.window;
        if !window.contains(request.time) {
            return Err(BookingError::OutsideWindow {
                time: request.time,
                window,
            });
        }
        let vehicle = Vehicle::new(
            &request.car_model,
            &request.car_number,
            &self.config.vehicle_policy,
        )?;

        let booking = Booking {
            id: BookingId::generate(),
            user_id: request.user_id,
            date: request.date,
            time: request.time,
            car_model: vehicle.model,
            car_number: vehicle.number,
            created_at: self.clock.now(),
        };
        let slot = booking.slot();

        let ticket = self.store.mutate(|table| {
            if !table.insert(booking.clone()) {
                return Err(BookingError::Conflict { slot });
            }
            if let Err(err) = self.mirror_inside_lock(|mirror| mirror.on_create(&booking)) {
                table.remove(&slot);
                return Err(BookingError::NotPersisted {
                    slot,
                    reason: err.to_string(),
                });
            }
            Ok(self.after_commit_ticket())
        })?;

        if let Some(ticket) = ticket {
            let _turn = self.mirror_order.wait(ticket);
            self.mirror_create(&booking);
        }
        Ok(booking)
    }

    /// Cancels a booking and returns the removed record.
    ///
    /// Lookup happens before the ownership check, so an unknown key is
    /// [`BookingError::NotFound`] even for non-owners. Under
    /// [`MirrorMode::InsideLock`] a failed mirror write puts the booking back
    /// and returns [`BookingError::NotPersisted`].
    pub fn cancel_booking(
        &self,
        key: &CancelKey,
        requester: Requester,
    ) -> Result<Booking, BookingError> {
        let (removed, ticket) = self.store.mutate(|table| {
            let target = match key {
                CancelKey::Id(id) => table.find_by_id(id),
                CancelKey::Slot {
                    user_id,
                    date,
                    time,
                } => table
                    .get(&Slot::new(*date, *time))
                    .filter(|booking| booking.user_id == *user_id),
            };
            let Some(target) = target else {
                return Err(BookingError::NotFound { key: key.clone() });
            };
            if !requester.may_cancel(target) {
                return Err(BookingError::Forbidden {
                    id: target.id.clone(),
                    requester: requester.user_id,
                });
            }

            let slot = target.slot();
            let removed = table
                .remove(&slot)
                .ok_or_else(|| BookingError::NotFound { key: key.clone() })?;
            if let Err(err) = self.mirror_inside_lock(|mirror| mirror.on_cancel(&removed.id)) {
                table.insert(removed);
                return Err(BookingError::NotPersisted {
                    slot,
                    reason: err.to_string(),
                });
            }
            Ok((removed, self.after_commit_ticket()))
        })?;

        if let Some(ticket) = ticket {
            let _turn = self.mirror_order.wait(ticket);
            self.mirror_cancel(&removed.id);
        }
        Ok(removed)
    }

    /// The user's bookings, ascending by date then hour.
    pub fn user_bookings(&self, user_id: UserId) -> Vec<Booking> {
        self.store
            .read(|table| table.user_bookings(user_id).cloned().collect())
    }

    /// The user's booking at `(date, time)`, if any.
    pub fn find_booking(
        &self,
        user_id: UserId,
        date: BookingDate,
        time: SlotTime,
    ) -> Option<Booking> {
        let slot = Slot::new(date, time);
        self.store.read(|table| {
            table
                .get(&slot)
                .filter(|booking| booking.user_id == user_id)
                .cloned()
        })
    }

    /// All bookings. Callers must not rely on the order.
    pub fn all_bookings(&self) -> Vec<Booking> {
        self.store.snapshot()
    }

    /// All bookings grouped by date, each group ascending by hour.
    pub fn all_bookings_grouped_by_date(&self) -> BTreeMap<BookingDate, Vec<Booking>> {
        let mut groups: BTreeMap<BookingDate, Vec<Booking>> = BTreeMap::new();
        for booking in self.store.snapshot() {
            groups.entry(booking.date).or_default().push(booking);
        }
        for bookings in groups.values_mut() {
            bookings.sort_by_key(|booking| booking.time);
        }
        groups
    }

    pub fn booking_count(&self) -> usize {
        self.store.read(crate::store::SlotTable::len)
    }

    /// Runs `write` now if the mirror is written inside the lock.
    fn mirror_inside_lock(
        &self,
        write: impl FnOnce(&dyn BookingMirror) -> Result<(), MirrorError>,
    ) -> Result<(), MirrorError> {
        match &self.mirror {
            Some(mirror) if self.config.mirror_mode == MirrorMode::InsideLock => {
                write(mirror.as_ref())
            }
            _ => Ok(()),
        }
    }

    /// A place in the after-commit queue. Taken under the write lock.
    fn after_commit_ticket(&self) -> Option<u64> {
        (self.mirror.is_some() && self.config.mirror_mode == MirrorMode::AfterCommit)
            .then(|| self.mirror_order.issue())
    }

    fn mirror_create(&self, booking: &Booking) {
        let Some(mirror) = &self.mirror else {
            return;
        };
        if let Err(err) = mirror.on_create(booking) {
            tracing::warn!(booking_id = %booking.id, error = %err, "failed to mirror new booking");
        }
    }

    fn mirror_cancel(&self, id: &BookingId) {
        let Some(mirror) = &self.mirror else {
            return;
        };
        if let Err(err) = mirror.on_cancel(id) {
            tracing::warn!(booking_id = %id, error = %err, "failed to mirror cancellation");
        }
    }
}
