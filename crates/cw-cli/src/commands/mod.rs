//! CLI subcommand implementations.

pub mod book;
pub mod cancel;
pub mod days;
pub mod mine;
pub mod schedule;
pub mod slots;
pub mod status;
pub mod util;
