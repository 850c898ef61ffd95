//! Wall-clock access and day-offset generation.

use chrono::{DateTime, Local, Utc, Weekday};
use serde::Serialize;

use crate::time::BookingDate;

/// Source of the current time.
///
/// The engine stamps `created_at` from it and the day picker counts offsets
/// from [`Clock::today`].
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// The current local calendar day.
    fn today(&self) -> BookingDate;
}

/// The system clock. `today` follows the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> BookingDate {
        BookingDate::new(Local::now().date_naive())
    }
}

/// A clock frozen at one instant. `today` is the UTC date of that instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// A clock at midnight UTC on `date`.
    #[must_use]
    pub fn on(date: BookingDate) -> Self {
        Self {
            now: date.as_naive().and_time(chrono::NaiveTime::MIN).and_utc(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn today(&self) -> BookingDate {
        BookingDate::new(self.now.date_naive())
    }
}

/// How a day is presented relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayLabel {
    Today,
    Tomorrow,
    /// Any later day, shown by its weekday name.
    Weekday,
}

/// A bookable day offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayOffer {
    pub date: BookingDate,
    #[serde(serialize_with = "serialize_weekday")]
    pub weekday: Weekday,
    pub label: DayLabel,
}

fn serialize_weekday<S>(weekday: &Weekday, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(&weekday_name(*weekday))
}

/// Full English name of a weekday.
#[must_use]
pub const fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Labels `date` relative to the clock's current day.
///
/// Past days are labelled [`DayLabel::Weekday`]; use [`is_past`] to tell them apart.
pub fn day_label<C: Clock + ?Sized>(clock: &C, date: BookingDate) -> DayLabel {
    let today = clock.today();
    if date == today {
        DayLabel::Today
    } else if Some(date) == today.next_day() {
        DayLabel::Tomorrow
    } else {
        DayLabel::Weekday
    }
}

/// Returns `count` consecutive days starting today.
pub fn upcoming_days<C: Clock + ?Sized>(clock: &C, count: usize) -> Vec<DayOffer> {
    let today = clock.today();
    std::iter::successors(Some(today), |day| day.next_day())
        .take(count)
        .map(|date| DayOffer {
            date,
            weekday: date.weekday(),
            label: day_label(clock, date),
        })
        .collect()
}

/// True if `date` is strictly before the clock's current day.
pub fn is_past<C: Clock + ?Sized>(clock: &C, date: BookingDate) -> bool {
    date < clock.today()
}
