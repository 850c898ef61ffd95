//! Schedule command: every booking grouped by day.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use super::util::day_heading;
use crate::Session;

#[derive(Debug, Args)]
pub struct ScheduleArgs {
    /// Output as JSON, keyed by date.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &ScheduleArgs, session: &Session) -> Result<()> {
    let groups = session.engine().all_bookings_grouped_by_date();

    if args.json {
        let json =
            serde_json::to_string_pretty(&groups).context("failed to serialize schedule")?;
        writeln!(writer, "{json}")?;
        return Ok(());
    }

    if groups.is_empty() {
        writeln!(writer, "No bookings.")?;
        return Ok(());
    }

    writeln!(writer, "Full schedule:")?;
    for (date, bookings) in &groups {
        writeln!(writer)?;
        writeln!(writer, "=== {} ===", day_heading(session.clock(), *date))?;
        for booking in bookings {
            writeln!(
                writer,
                "{} - {} {} (user {})",
                booking.time, booking.car_model, booking.car_number, booking.user_id
            )?;
        }
    }
    Ok(())
}
