//! Concurrent access to a shared engine.

use std::sync::{Arc, Barrier};
use std::thread;

use cw_core::{
    BookingDate, BookingEngine, BookingError, CancelKey, EngineConfig, HourWindow, NewBooking,
    Requester, SlotTime, UserId,
};

const THREADS: usize = 32;

fn engine() -> Arc<BookingEngine> {
    Arc::new(BookingEngine::new(EngineConfig::new(
        HourWindow::new(8, 20).unwrap(),
    )))
}

fn request(date: BookingDate, time: SlotTime, user: i64) -> NewBooking {
    NewBooking {
        date,
        time,
        car_model: "Lada".to_string(),
        car_number: format!("X{user:03}"),
        user_id: UserId::new(user),
    }
}

/// Races `THREADS` creates for one slot; exactly one may win.
#[test]
fn concurrent_creates_for_one_slot_admit_exactly_one() {
    let engine = engine();
    let date: BookingDate = "15.06.2025".parse().unwrap();
    let time: SlotTime = "10:00".parse().unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            let user = i64::try_from(i).unwrap();
            thread::spawn(move || {
                barrier.wait();
                engine.create_booking(request(date, time, user))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1, "exactly one create should succeed");
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(BookingError::Conflict { .. })))
        .count();
    assert_eq!(conflicts, THREADS - 1);

    assert_eq!(engine.all_bookings(), vec![winners[0].clone()]);
    assert!(!engine.is_available(date, time));
}

/// Distinct slots booked in parallel all succeed and never collide.
#[test]
fn concurrent_creates_for_distinct_slots_all_succeed() {
    let engine = engine();
    let date: BookingDate = "15.06.2025".parse().unwrap();
    let hours: Vec<u8> = (8..=20).collect();
    let barrier = Arc::new(Barrier::new(hours.len()));

    let handles: Vec<_> = hours
        .iter()
        .map(|&hour| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let time = SlotTime::from_hour(hour).unwrap();
                engine.create_booking(request(date, time, i64::from(hour)))
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().is_ok());
    }
    assert!(engine.available_slots(date).is_empty());
    assert_eq!(engine.all_bookings_grouped_by_date()[&date].len(), hours.len());
}

/// Racing cancels of one booking: one removes it, the rest see it gone.
#[test]
fn concurrent_cancel_removes_once() {
    let engine = engine();
    let date: BookingDate = "15.06.2025".parse().unwrap();
    let time: SlotTime = "12:00".parse().unwrap();
    let booking = engine.create_booking(request(date, time, 1)).unwrap();
    let key = CancelKey::Id(booking.id);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            let key = key.clone();
            thread::spawn(move || {
                barrier.wait();
                engine.cancel_booking(&key, Requester::admin(UserId::new(0)))
            })
        })
        .collect();

    let removed = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(Result::is_ok)
        .count();
    assert_eq!(removed, 1);
    assert!(engine.is_available(date, time));
}
