//! Wiring between configuration, storage and the booking engine.

use std::sync::Arc;

use anyhow::{Context, Result};

use cw_core::{BookingEngine, Clock, Requester, SystemClock, UserId};
use cw_db::{Database, SqliteMirror, UserRecord};

use crate::Config;

/// An engine restored from the configured database.
///
/// Each CLI invocation opens one session: the engine is seeded from SQLite
/// and every create or cancel is mirrored back before the process exits.
pub struct Session {
    config: Config,
    engine: BookingEngine,
    mirror: Arc<SqliteMirror>,
    clock: Arc<dyn Clock>,
}

impl Session {
    /// Opens a session using the system clock.
    pub fn open(config: Config) -> Result<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    /// Opens a session, creating the database directory if needed.
    pub fn open_with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create database directory")?;
        }
        let db = Database::open(&config.database_path)
            .with_context(|| format!("failed to open {}", config.database_path.display()))?;
        let mirror = Arc::new(SqliteMirror::new(db));

        let engine_config = config
            .engine_config()
            .context("invalid opening hours in configuration")?;
        let engine = BookingEngine::restore(engine_config, mirror.clone())
            .context("failed to restore bookings")?
            .with_clock(clock.clone());

        Ok(Self {
            config,
            engine,
            mirror,
            clock,
        })
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn engine(&self) -> &BookingEngine {
        &self.engine
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// The requester identity for `user`, with admin rights from config.
    pub fn requester(&self, user: UserId) -> Requester {
        Requester {
            user_id: user,
            is_admin: self.config.is_admin(user),
        }
    }

    /// The stored profile of a user, if any.
    pub fn user_profile(&self, external_id: i64) -> Result<Option<UserRecord>> {
        Ok(self.mirror.database().get_user(external_id)?)
    }

    /// Records the user's profile. Failures are logged, not returned.
    pub fn remember_user(&self, user: &UserRecord) {
        if let Err(err) = self.mirror.database().upsert_user(user) {
            tracing::warn!(user = user.external_id, error = %err, "failed to save user");
        }
    }
}
