//! Slots command: free hours on a given day.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use cw_core::BookingDate;

use super::util::day_heading;
use crate::Session;

#[derive(Debug, Args)]
pub struct SlotsArgs {
    /// Day to inspect (DD.MM.YYYY).
    pub date: String,

    /// Show booked hours too.
    #[arg(long)]
    pub all: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &SlotsArgs, session: &Session) -> Result<()> {
    let date: BookingDate = args.date.parse()?;
    let engine = session.engine();
    let heading = day_heading(session.clock(), date);

    if args.all {
        writeln!(writer, "Hours on {heading}:")?;
        for status in engine.slot_statuses(date) {
            let mark = if status.available { "free" } else { "booked" };
            writeln!(writer, "{}  {mark}", status.time)?;
        }
        return Ok(());
    }

    let free = engine.available_slots(date);
    if free.is_empty() {
        writeln!(writer, "No free hours on {heading}.")?;
        return Ok(());
    }
    writeln!(writer, "Free hours on {heading}:")?;
    for time in free {
        writeln!(writer, "{time}")?;
    }
    Ok(())
}
