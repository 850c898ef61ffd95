//! Booking records and vehicle validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::{BookingDate, Slot, SlotTime};
use crate::types::{BookingId, UserId, ValidationError};

/// Placeholder used by [`VehiclePolicy::Placeholder`] when none is configured.
pub const DEFAULT_PLACEHOLDER: &str = "not specified";

/// A confirmed reservation of one slot.
///
/// Bookings are never edited after creation. Callers always hold copies;
/// the engine owns the stored instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub date: BookingDate,
    pub time: SlotTime,
    pub car_model: String,
    pub car_number: String,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    #[must_use]
    pub const fn slot(&self) -> Slot {
        Slot::new(self.date, self.time)
    }
}

/// A request to book a slot, as received from the conversation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub date: BookingDate,
    pub time: SlotTime,
    pub car_model: String,
    pub car_number: String,
    pub user_id: UserId,
}

/// What to do with a blank car model or number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VehiclePolicy {
    /// Fail with [`ValidationError::Empty`].
    #[default]
    Reject,
    /// Substitute the given text.
    Placeholder(String),
}

/// Normalized vehicle details: both fields trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vehicle {
    pub model: String,
    pub number: String,
}

impl Vehicle {
    pub fn new(model: &str, number: &str, policy: &VehiclePolicy) -> Result<Self, ValidationError> {
        Ok(Self {
            model: normalize(model, "car model", policy)?,
            number: normalize(number, "car number", policy)?,
        })
    }
}

fn normalize(
    value: &str,
    field: &'static str,
    policy: &VehiclePolicy,
) -> Result<String, ValidationError> {
    let value = value.trim();
    if !value.is_empty() {
        return Ok(value.to_string());
    }
    match policy {
        VehiclePolicy::Reject => Err(ValidationError::Empty { field }),
        VehiclePolicy::Placeholder(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        VehiclePolicy::Placeholder(_) => Ok(DEFAULT_PLACEHOLDER.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_trims_fields() {
        let vehicle = Vehicle::new("  Toyota ", "A123\n", &VehiclePolicy::Reject).unwrap();
        assert_eq!(vehicle.model, "Toyota");
        assert_eq!(vehicle.number, "A123");
    }

    #[test]
    fn reject_policy_refuses_blank_fields() {
        assert_eq!(
            Vehicle::new("   ", "A123", &VehiclePolicy::Reject),
            Err(ValidationError::Empty { field: "car model" })
        );
        assert_eq!(
            Vehicle::new("Kia", "", &VehiclePolicy::Reject),
            Err(ValidationError::Empty {
                field: "car number"
            })
        );
    }

    #[test]
    fn placeholder_policy_substitutes_text() {
        let policy = VehiclePolicy::Placeholder("unknown".to_string());
        let vehicle = Vehicle::new("", "A123", &policy).unwrap();
        assert_eq!(vehicle.model, "unknown");
        assert_eq!(vehicle.number, "A123");
    }

    #[test]
    fn blank_placeholder_falls_back_to_default() {
        let policy = VehiclePolicy::Placeholder("  ".to_string());
        let vehicle = Vehicle::new("Kia", " ", &policy).unwrap();
        assert_eq!(vehicle.number, DEFAULT_PLACEHOLDER);
    }

    #[test]
    fn booking_serializes_wire_formats() {
        let booking = Booking {
            id: BookingId::new("b-1").unwrap(),
            user_id: UserId::new(42),
            date: "15.06.2025".parse().unwrap(),
            time: "10:00".parse().unwrap(),
            car_model: "Toyota".to_string(),
            car_number: "A123".to_string(),
            created_at: "2025-06-01T09:30:00Z".parse().unwrap(),
        };
        let json = serde_json::to_value(&booking).unwrap();
        assert_eq!(json["date"], "15.06.2025");
        assert_eq!(json["time"], "10:00");
        assert_eq!(json["user_id"], 42);

        let parsed: Booking = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, booking);
    }
}
