//! Cancel command: remove a booking by ID or by slot.

use std::io::Write;

use anyhow::{Result, bail};
use clap::Args;

use cw_core::{BookingId, CancelKey, UserId};

use crate::Session;

#[derive(Debug, Args)]
pub struct CancelArgs {
    /// ID of the booking to cancel.
    #[arg(required_unless_present = "date", conflicts_with = "date")]
    pub booking_id: Option<String>,

    /// ID of the user asking for the cancellation.
    #[arg(long)]
    pub user: i64,

    /// Cancel the booking --user holds on this day instead (DD.MM.YYYY).
    ///
    /// The slot key only matches the requester's own booking; an
    /// administrator cancels someone else's booking by ID.
    #[arg(long, requires = "time")]
    pub date: Option<String>,

    /// Hour of the booking to cancel with --date (HH:00).
    #[arg(long, requires = "date")]
    pub time: Option<String>,
}

impl CancelArgs {
    fn key(&self) -> Result<CancelKey> {
        match (&self.booking_id, &self.date, &self.time) {
            (Some(id), None, None) => Ok(CancelKey::Id(BookingId::new(id.as_str())?)),
            (None, Some(date), Some(time)) => Ok(CancelKey::Slot {
                user_id: UserId::new(self.user),
                date: date.parse()?,
                time: time.parse()?,
            }),
            _ => bail!("specify either a booking ID or both --date and --time"),
        }
    }
}

pub fn run<W: Write>(writer: &mut W, args: &CancelArgs, session: &Session) -> Result<()> {
    let key = args.key()?;
    let requester = session.requester(UserId::new(args.user));
    let booking = session.engine().cancel_booking(&key, requester)?;

    writeln!(writer, "Booking cancelled:")?;
    writeln!(
        writer,
        "{} {} - {} {}",
        booking.date, booking.time, booking.car_model, booking.car_number
    )?;
    if booking.user_id != requester.user_id {
        tracing::info!(
            target: "carwash::notify",
            owner = %booking.user_id,
            admin = %requester.user_id,
            booking_id = %booking.id,
            "booking cancelled by administrator"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use cw_core::{BookingError, NewBooking};

    use crate::session::testing::{reopen, session};

    fn book(session: &Session, user: i64) -> cw_core::Booking {
        session
            .engine()
            .create_booking(NewBooking {
                date: "15.06.2025".parse().unwrap(),
                time: "10:00".parse().unwrap(),
                car_model: "Toyota".to_string(),
                car_number: "A123".to_string(),
                user_id: UserId::new(user),
            })
            .unwrap()
    }

    fn by_id(id: &BookingId, user: i64) -> CancelArgs {
        CancelArgs {
            booking_id: Some(id.to_string()),
            user,
            date: None,
            time: None,
        }
    }

    #[test]
    fn owner_cancels_and_change_is_persisted() {
        let (_temp, session) = session("15.06.2025", None);
        let booking = book(&session, 42);

        let mut output = Vec::new();
        run(&mut output, &by_id(&booking.id, 42), &session).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Booking cancelled:\n15.06.2025 10:00 - Toyota A123\n"
        );
        assert!(reopen(&session).engine().all_bookings().is_empty());
    }

    #[test]
    fn stranger_is_forbidden_and_booking_stays() {
        let (_temp, session) = session("15.06.2025", Some(1));
        let booking = book(&session, 42);

        let err = run(&mut Vec::new(), &by_id(&booking.id, 7), &session).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BookingError>(),
            Some(BookingError::Forbidden { .. })
        ));
        assert_eq!(reopen(&session).engine().all_bookings(), vec![booking]);
    }

    #[test]
    fn configured_admin_may_cancel() {
        let (_temp, session) = session("15.06.2025", Some(1));
        let booking = book(&session, 42);

        run(&mut Vec::new(), &by_id(&booking.id, 1), &session).unwrap();
        assert_eq!(session.engine().booking_count(), 0);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let (_temp, session) = session("15.06.2025", None);
        let id = BookingId::new("nope").unwrap();
        let err = run(&mut Vec::new(), &by_id(&id, 42), &session).unwrap_err();
        assert_eq!(err.to_string(), "no such booking: nope");
    }

    #[test]
    fn cancel_by_slot() {
        let (_temp, session) = session("15.06.2025", None);
        book(&session, 42);

        let args = CancelArgs {
            booking_id: None,
            user: 42,
            date: Some("15.06.2025".to_string()),
            time: Some("10:00".to_string()),
        };
        run(&mut Vec::new(), &args, &session).unwrap();
        assert!(
            session
                .engine()
                .is_available("15.06.2025".parse().unwrap(), "10:00".parse().unwrap())
        );
    }

    #[test]
    fn admin_slot_key_only_matches_own_booking() {
        let (_temp, session) = session("15.06.2025", Some(1));
        let booking = book(&session, 42);

        let args = CancelArgs {
            booking_id: None,
            user: 1,
            date: Some("15.06.2025".to_string()),
            time: Some("10:00".to_string()),
        };
        let err = run(&mut Vec::new(), &args, &session).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BookingError>(),
            Some(BookingError::NotFound { .. })
        ));

        run(&mut Vec::new(), &by_id(&booking.id, 1), &session).unwrap();
        assert_eq!(session.engine().booking_count(), 0);
    }

    #[test]
    fn missing_key_is_rejected() {
        let (_temp, session) = session("15.06.2025", None);
        let args = CancelArgs {
            booking_id: None,
            user: 42,
            date: Some("15.06.2025".to_string()),
            time: None,
        };
        let err = run(&mut Vec::new(), &args, &session).unwrap_err();
        assert!(err.to_string().contains("booking ID or both --date and --time"));
    }
}
