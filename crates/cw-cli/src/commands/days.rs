//! Days command: the booking horizon with free-slot counts.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use cw_core::upcoming_days;

use super::util::day_heading;
use crate::Session;

#[derive(Debug, Args)]
pub struct DaysArgs {
    /// Number of days to list (defaults to `days_ahead` from config).
    #[arg(long)]
    pub count: Option<usize>,
}

pub fn run<W: Write>(writer: &mut W, args: &DaysArgs, session: &Session) -> Result<()> {
    let count = args.count.unwrap_or(session.config().days_ahead);
    let engine = session.engine();

    writeln!(writer, "Choose a day:")?;
    for offer in upcoming_days(session.clock(), count) {
        let free = engine.available_slots(offer.date).len();
        writeln!(
            writer,
            "{}  {} - {free} free",
            offer.date,
            day_heading(session.clock(), offer.date)
        )?;
    }
    Ok(())
}
