//! Booking and availability engine for the car wash assistant.
//!
//! This crate holds the authoritative set of reservations and covers:
//! - Date and hour-slot formats (`DD.MM.YYYY`, `HH:00`)
//! - Availability: free/occupied status of each hour in the opening window
//! - Lifecycle: atomic create-if-free, cancel with ownership checks, queries
//! - Mirroring: seeding from and writing through to durable storage

pub mod booking;
pub mod clock;
mod engine;
pub mod mirror;
mod store;
pub mod time;
pub mod types;

pub use booking::{Booking, NewBooking, Vehicle, VehiclePolicy};
pub use clock::{Clock, DayLabel, DayOffer, FixedClock, SystemClock, upcoming_days};
pub use engine::{
    BookingEngine, BookingError, CancelKey, EngineConfig, Requester, RestoreError, SlotStatus,
};
pub use mirror::{BookingMirror, MirrorError, MirrorMode};
pub use time::{BookingDate, HourWindow, ParseError, Slot, SlotTime};
pub use types::{BookingId, UserId, ValidationError};
