//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::book::BookArgs;
use crate::commands::cancel::CancelArgs;
use crate::commands::days::DaysArgs;
use crate::commands::mine::MineArgs;
use crate::commands::schedule::ScheduleArgs;
use crate::commands::slots::SlotsArgs;

/// Car wash booking assistant.
///
/// Offers free hour slots, takes bookings with vehicle details and lets
/// owners or the administrator cancel them.
#[derive(Debug, Parser)]
#[command(name = "carwash", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the days open for booking.
    Days(DaysArgs),

    /// Show free hours on a day.
    Slots(SlotsArgs),

    /// Book a slot.
    Book(BookArgs),

    /// Cancel a booking.
    Cancel(CancelArgs),

    /// List a user's bookings.
    Mine(MineArgs),

    /// Show every booking grouped by day.
    Schedule(ScheduleArgs),

    /// Show database and opening hours.
    Status,
}
