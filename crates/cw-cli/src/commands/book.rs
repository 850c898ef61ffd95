//! Book command: reserve a slot for a vehicle.

use std::io::Write;

use anyhow::{Result, bail};
use clap::Args;

use cw_core::clock::is_past;
use cw_core::{Booking, BookingDate, BookingError, NewBooking, SlotTime, UserId};
use cw_db::UserRecord;

use super::util::{day_heading, parse_car_info};
use crate::Session;

#[derive(Debug, Args)]
pub struct BookArgs {
    /// Day to book (DD.MM.YYYY).
    pub date: String,

    /// Hour to book (HH:00).
    pub time: String,

    /// ID of the user making the booking.
    #[arg(long)]
    pub user: i64,

    /// Car model and number separated by a space, e.g. "Kia ABC123".
    #[arg(long)]
    pub car: String,

    /// Username to store with the user's profile.
    #[arg(long)]
    pub username: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, args: &BookArgs, session: &Session) -> Result<()> {
    let date: BookingDate = args.date.parse()?;
    if is_past(session.clock(), date) {
        bail!("cannot book a past date: {date}");
    }
    let time: SlotTime = args.time.parse()?;
    let (car_model, car_number) = parse_car_info(&args.car)?;
    let user_id = UserId::new(args.user);

    session.remember_user(&UserRecord {
        external_id: args.user,
        username: args.username.clone(),
        first_name: None,
        last_name: None,
    });

    let request = NewBooking {
        date,
        time,
        car_model,
        car_number,
        user_id,
    };
    match session.engine().create_booking(request) {
        Ok(booking) => {
            writeln!(writer, "Booking confirmed!")?;
            writeln!(writer, "Date: {}", day_heading(session.clock(), booking.date))?;
            writeln!(writer, "Time: {}", booking.time)?;
            writeln!(writer, "Car:  {} {}", booking.car_model, booking.car_number)?;
            writeln!(writer, "ID:   {}", booking.id)?;
            notify_admin(session, &booking);
            Ok(())
        }
        Err(err @ BookingError::Conflict { .. }) => {
            let free = session.engine().available_slots(date);
            if free.is_empty() {
                writeln!(writer, "No free hours left on {date}.")?;
            } else {
                let free: Vec<String> = free.iter().map(ToString::to_string).collect();
                writeln!(writer, "Free hours on {date}: {}", free.join(", "))?;
            }
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

/// Text sent to the administrator about a new booking.
pub fn admin_notice(booking: &Booking) -> String {
    format!(
        "New booking: {} {}, {} {} (user {})",
        booking.date, booking.time, booking.car_model, booking.car_number, booking.user_id
    )
}

fn notify_admin(session: &Session, booking: &Booking) {
    let Some(admin_id) = session.config().admin_id else {
        return;
    };
    tracing::info!(target: "carwash::notify", admin_id, "{}", admin_notice(booking));
}
