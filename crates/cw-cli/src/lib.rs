//! Car wash booking assistant CLI library.
//!
//! Each subcommand opens a [`Session`] over the configured database and
//! drives the booking engine from `cw-core`.

mod cli;
pub mod commands;
mod config;
mod session;

pub use cli::{Cli, Commands};
pub use config::{Config, VehiclePolicyKind};
pub use session::Session;
