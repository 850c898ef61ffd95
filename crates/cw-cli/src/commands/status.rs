//! Status command for showing the configured database and table size.

use std::io::Write;

use anyhow::Result;

use crate::Session;

pub fn run<W: Write>(writer: &mut W, session: &Session) -> Result<()> {
    let config = session.config();
    let engine = session.engine();

    writeln!(writer, "Car wash status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    writeln!(writer, "Opening hours: {}", engine.window())?;
    writeln!(writer, "Active bookings: {}", engine.booking_count())?;
    match config.admin_id {
        Some(admin_id) => writeln!(writer, "Administrator: {admin_id}")?,
        None => writeln!(writer, "Administrator: not configured")?,
    }
    Ok(())
}
