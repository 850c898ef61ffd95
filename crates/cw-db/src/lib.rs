//! Storage layer for the car wash assistant.
//!
//! Provides durable backing for the booking engine using `rusqlite`. The
//! in-memory engine stays authoritative; this crate seeds it at startup and
//! receives a copy of every committed create and cancel through
//! [`SqliteMirror`].
//!
//! # Thread Safety
//!
//! [`Database`] wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! [`SqliteMirror`] puts it behind a `Mutex` so the engine can share it
//! across threads.
//!
//! # Schema
//!
//! Dates and times are stored in their wire formats (`DD.MM.YYYY`, `HH:00`)
//! so persisted rows match what users see. Because `DD.MM.YYYY` does not sort
//! lexically, queries never order by `date`; callers sort parsed values.
//!
//! `created_at` is stored as RFC 3339 TEXT in UTC.
//!
//! A UNIQUE index on `(date, time)` backs the engine's one-booking-per-slot
//! rule, so a second process writing the same file cannot persist a double
//! booking.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;

use cw_core::{Booking, BookingId, BookingMirror, MirrorError, UserId};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored booking row could not be converted back into a booking.
    #[error("invalid booking record {id}: {message}")]
    InvalidRecord { id: String, message: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Profile of a user known to the conversation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// External (chat platform) identifier.
    pub external_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id INTEGER UNIQUE NOT NULL,
                username TEXT,
                first_name TEXT,
                last_name TEXT,
                created_at TEXT NOT NULL
            );

            -- date: 'DD.MM.YYYY', time: 'HH:00'
            -- user_id: external id of the owner, not users.id
            CREATE TABLE IF NOT EXISTS bookings (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                time TEXT NOT NULL,
                car_model TEXT NOT NULL,
                car_number TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_bookings_user ON bookings(user_id);
            CREATE INDEX IF NOT EXISTS idx_bookings_date ON bookings(date);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_bookings_slot ON bookings(date, time);
            ",
        )?;
        tracing::debug!("database schema ready");
        Ok(())
    }

    /// Persists a booking. Fails if its ID or slot is already stored.
    pub fn insert_booking(&self, booking: &Booking) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO bookings (id, user_id, date, time, car_model, car_number, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                booking.id.as_str(),
                booking.user_id.get(),
                booking.date.to_string(),
                booking.time.to_string(),
                booking.car_model,
                booking.car_number,
                format_timestamp(booking.created_at),
            ],
        )?;
        Ok(())
    }

    /// Deletes a booking by ID. Returns whether a row was removed.
    pub fn delete_booking(&self, id: &BookingId) -> Result<bool, DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM bookings WHERE id = ?", [id.as_str()])?;
        Ok(deleted > 0)
    }

    /// Lists all stored bookings ordered by creation time then ID.
    pub fn list_bookings(&self) -> Result<Vec<Booking>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, user_id, date, time, car_model, car_number, created_at
            FROM bookings
            ORDER BY created_at ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map([], BookingRow::from_row)?;
        let mut bookings = Vec::new();
        for row in rows {
            bookings.push(row?.into_booking()?);
        }
        Ok(bookings)
    }

    /// Inserts a user or refreshes the profile of an existing one.
    pub fn upsert_user(&self, user: &UserRecord) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO users (external_id, username, first_name, last_name, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(external_id) DO UPDATE SET
                username = excluded.username,
                first_name = excluded.first_name,
                last_name = excluded.last_name
            ",
            params![
                user.external_id,
                user.username,
                user.first_name,
                user.last_name,
                format_timestamp(Utc::now()),
            ],
        )?;
        Ok(())
    }

    /// Looks up a user by external ID.
    pub fn get_user(&self, external_id: i64) -> Result<Option<UserRecord>, DbError> {
        let user = self
            .conn
            .query_row(
                "
                SELECT external_id, username, first_name, last_name
                FROM users WHERE external_id = ?
                ",
                [external_id],
                |row| {
                    Ok(UserRecord {
                        external_id: row.get(0)?,
                        username: row.get(1)?,
                        first_name: row.get(2)?,
                        last_name: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }
}

/// A booking row as stored, before parsing.
struct BookingRow {
    id: String,
    user_id: i64,
    date: String,
    time: String,
    car_model: String,
    car_number: String,
    created_at: String,
}

impl BookingRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            date: row.get(2)?,
            time: row.get(3)?,
            car_model: row.get(4)?,
            car_number: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_booking(self) -> Result<Booking, DbError> {
        let invalid = |message: String| DbError::InvalidRecord {
            id: self.id.clone(),
            message,
        };
        let date = self.date.parse().map_err(|e| invalid(format!("{e}")))?;
        let time = self.time.parse().map_err(|e| invalid(format!("{e}")))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|e| invalid(format!("invalid created_at {:?}: {e}", self.created_at)))?;
        let id = BookingId::new(self.id.clone()).map_err(|e| invalid(format!("{e}")))?;
        Ok(Booking {
            id,
            user_id: UserId::new(self.user_id),
            date,
            time,
            car_model: self.car_model,
            car_number: self.car_number,
            created_at,
        })
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Shares a [`Database`] with the booking engine as its write-through mirror.
pub struct SqliteMirror {
    db: Mutex<Database>,
}

impl SqliteMirror {
    pub const fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Locks the underlying database for direct queries.
    pub fn database(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BookingMirror for SqliteMirror {
    fn load_all(&self) -> Result<Vec<Booking>, MirrorError> {
        let bookings = self.database().list_bookings().map_err(MirrorError::new)?;
        tracing::debug!(count = bookings.len(), "loaded persisted bookings");
        Ok(bookings)
    }

    fn on_create(&self, booking: &Booking) -> Result<(), MirrorError> {
        self.database()
            .insert_booking(booking)
            .map_err(MirrorError::new)?;
        tracing::debug!(booking_id = %booking.id, "persisted booking");
        Ok(())
    }

    fn on_cancel(&self, id: &BookingId) -> Result<(), MirrorError> {
        let deleted = self.database().delete_booking(id).map_err(MirrorError::new)?;
        tracing::debug!(booking_id = %id, deleted, "removed persisted booking");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    use cw_core::{BookingEngine, CancelKey, EngineConfig, NewBooking, Requester};

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");

        assert_eq!(
            table_columns(&db.conn, "bookings"),
            vec![
                "id",
                "user_id",
                "date",
                "time",
                "car_model",
                "car_number",
                "created_at",
            ]
        );
        assert_eq!(
            table_columns(&db.conn, "users"),
            vec![
                "id",
                "external_id",
                "username",
                "first_name",
                "last_name",
                "created_at",
            ]
        );

        let booking_indexes = index_names(&db.conn, "bookings");
        let expected: HashSet<String> = ["idx_bookings_user", "idx_bookings_date", "idx_bookings_slot"]
            .into_iter()
            .map(String::from)
            .collect();
        assert!(expected.is_subset(&booking_indexes));
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index_list row")).collect()
    }

    fn booking(id: &str, user: i64, date: &str, time: &str, created_at: &str) -> Booking {
        Booking {
            id: BookingId::new(id).unwrap(),
            user_id: UserId::new(user),
            date: date.parse().unwrap(),
            time: time.parse().unwrap(),
            car_model: "Toyota".to_string(),
            car_number: "A123".to_string(),
            created_at: created_at.parse().unwrap(),
        }
    }

    #[test]
    fn insert_and_list_bookings_preserves_fields() {
        let db = Database::open_in_memory().expect("open in-memory db");
        let later = booking("b-2", 7, "01.06.2025", "09:00", "2025-05-02T10:00:00Z");
        let earlier = booking("b-1", 42, "15.06.2025", "10:00", "2025-05-01T10:00:00.123456Z");
        db.insert_booking(&later).unwrap();
        db.insert_booking(&earlier).unwrap();

        let bookings = db.list_bookings().unwrap();
        assert_eq!(bookings, vec![earlier, later]);

        let (date, time): (String, String) = db
            .conn
            .query_row("SELECT date, time FROM bookings WHERE id = 'b-1'", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(date, "15.06.2025");
        assert_eq!(time, "10:00");
    }

    #[test]
    fn insert_rejects_second_booking_for_slot() {
        let db = Database::open_in_memory().expect("open in-memory db");
        db.insert_booking(&booking("b-1", 1, "15.06.2025", "10:00", "2025-05-01T10:00:00Z"))
            .unwrap();
        let err = db
            .insert_booking(&booking("b-2", 2, "15.06.2025", "10:00", "2025-05-01T10:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, DbError::Sqlite(_)));
        assert_eq!(db.list_bookings().unwrap().len(), 1);
    }

    #[test]
    fn delete_booking_reports_whether_row_existed() {
        let db = Database::open_in_memory().expect("open in-memory db");
        let b = booking("b-1", 1, "15.06.2025", "10:00", "2025-05-01T10:00:00Z");
        db.insert_booking(&b).unwrap();

        assert!(db.delete_booking(&b.id).unwrap());
        assert!(!db.delete_booking(&b.id).unwrap());
        assert!(db.list_bookings().unwrap().is_empty());
    }

    #[test]
    fn list_bookings_reports_malformed_rows() {
        let db = Database::open_in_memory().expect("open in-memory db");
        db.conn
            .execute(
                "INSERT INTO bookings VALUES ('bad', 1, '2025-06-15', '10:00', 'Kia', 'X1', '2025-05-01T10:00:00Z')",
                [],
            )
            .unwrap();

        let err = db.list_bookings().unwrap_err();
        assert!(matches!(err, DbError::InvalidRecord { ref id, .. } if id == "bad"));
    }

    #[test]
    fn upsert_user_updates_existing_profile() {
        let db = Database::open_in_memory().expect("open in-memory db");
        let mut user = UserRecord {
            external_id: 42,
            username: Some("driver".to_string()),
            first_name: Some("Ann".to_string()),
            last_name: None,
        };
        db.upsert_user(&user).unwrap();
        user.username = Some("driver2".to_string());
        db.upsert_user(&user).unwrap();

        assert_eq!(db.get_user(42).unwrap(), Some(user));
        assert_eq!(db.get_user(7).unwrap(), None);

        let count: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn mirror_survives_restart() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("carwash.db");
        let request = NewBooking {
            date: "15.06.2025".parse().unwrap(),
            time: "10:00".parse().unwrap(),
            car_model: "Toyota".to_string(),
            car_number: "A123".to_string(),
            user_id: UserId::new(42),
        };

        let kept;
        {
            let mirror = Arc::new(SqliteMirror::new(Database::open(&path).unwrap()));
            let engine = BookingEngine::restore(EngineConfig::default(), mirror).unwrap();
            kept = engine.create_booking(request.clone()).unwrap();
            let mut second = request.clone();
            second.time = "11:00".parse().unwrap();
            let dropped = engine.create_booking(second).unwrap();
            engine
                .cancel_booking(&CancelKey::Id(dropped.id), Requester::user(UserId::new(42)))
                .unwrap();
        }

        let mirror = Arc::new(SqliteMirror::new(Database::open(&path).unwrap()));
        let engine = BookingEngine::restore(EngineConfig::default(), mirror).unwrap();
        assert_eq!(engine.all_bookings(), vec![kept.clone()]);
        assert!(!engine.is_available(kept.date, kept.time));
        assert!(engine.create_booking(request).is_err());
    }
}
