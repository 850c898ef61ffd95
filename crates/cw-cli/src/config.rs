//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use cw_core::booking::DEFAULT_PLACEHOLDER;
use cw_core::{EngineConfig, HourWindow, MirrorMode, UserId, ValidationError, VehiclePolicy};

/// How blank vehicle fields are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehiclePolicyKind {
    #[default]
    Reject,
    Placeholder,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// First bookable hour of the day.
    pub start_hour: u8,

    /// Last bookable hour of the day (inclusive).
    pub end_hour: u8,

    /// User allowed to cancel any booking and notified of new ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<i64>,

    /// Number of days offered for booking, starting today.
    pub days_ahead: usize,

    pub vehicle_policy: VehiclePolicyKind,

    /// Text substituted for blank vehicle fields under the placeholder policy.
    pub placeholder: String,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("carwash.db"),
            start_hour: 8,
            end_hour: 20,
            admin_id: None,
            days_ahead: 7,
            vehicle_policy: VehiclePolicyKind::default(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (CARWASH_*)
        figment = figment.merge(Env::prefixed("CARWASH_"));

        figment.extract()
    }

    /// Builds the engine settings, validating the opening hours.
    ///
    /// Every invocation runs its own engine over the shared database, so
    /// writes go to SQLite inside the engine lock and a rejected write fails
    /// the command instead of leaving the two out of step.
    pub fn engine_config(&self) -> Result<EngineConfig, ValidationError> {
        let window = HourWindow::new(self.start_hour, self.end_hour)?;
        let policy = match self.vehicle_policy {
            VehiclePolicyKind::Reject => VehiclePolicy::Reject,
            VehiclePolicyKind::Placeholder => VehiclePolicy::Placeholder(self.placeholder.clone()),
        };
        Ok(EngineConfig::new(window)
            .with_vehicle_policy(policy)
            .with_mirror_mode(MirrorMode::InsideLock))
    }

    /// True if `user` is the configured administrator.
    pub fn is_admin(&self, user: UserId) -> bool {
        self.admin_id == Some(user.get())
    }
}

/// Returns the platform-specific config directory for carwash.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("carwash"))
}

/// Returns the platform-specific data directory for carwash.
///
/// On Linux: `~/.local/share/carwash`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("carwash"))
}
