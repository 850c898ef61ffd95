//! Mine command: a user's active bookings.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use cw_core::UserId;

use crate::Session;

#[derive(Debug, Args)]
pub struct MineArgs {
    /// ID of the user whose bookings to list.
    #[arg(long)]
    pub user: i64,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &MineArgs, session: &Session) -> Result<()> {
    let bookings = session.engine().user_bookings(UserId::new(args.user));

    if args.json {
        let json =
            serde_json::to_string_pretty(&bookings).context("failed to serialize bookings")?;
        writeln!(writer, "{json}")?;
        return Ok(());
    }

    if bookings.is_empty() {
        writeln!(writer, "You have no active bookings.")?;
        return Ok(());
    }

    writeln!(writer, "Your bookings:")?;
    for booking in &bookings {
        writeln!(
            writer,
            "{} {}  {} {}  ({})",
            booking.date, booking.time, booking.car_model, booking.car_number, booking.id
        )?;
    }
    Ok(())
}
