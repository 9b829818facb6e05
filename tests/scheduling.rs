use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use grocery_drive_api::{
    config::SchedulingConfig,
    domain::scheduling::{BookingError, SlotAllocator, format_time, parse_time, slot_lock_key},
};

fn allocator() -> SlotAllocator {
    SlotAllocator::new(SchedulingConfig::default())
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[test]
fn default_day_has_22_slots() {
    let slots = allocator().slots();
    assert_eq!(slots.len(), 22);
    assert_eq!(slots.first(), Some(&hm(9, 0)));
    assert_eq!(slots.last(), Some(&hm(19, 30)));
    assert_eq!(allocator().last_slot_start(), hm(19, 30));
}

#[test]
fn availability_subtracts_bookings() {
    let mut bookings = HashMap::new();
    bookings.insert(hm(10, 0), 2);
    bookings.insert(hm(12, 30), 4);

    let availability = allocator().availability(&bookings);
    assert_eq!(availability.len(), 22);
    let at = |time: &str| {
        availability
            .iter()
            .find(|slot| slot.time == time)
            .map(|slot| slot.available)
            .unwrap()
    };
    assert_eq!(at("09:00"), 3);
    assert_eq!(at("10:00"), 1);
    assert_eq!(at("12:30"), -1);
}

#[test]
fn opening_hours_bounds() {
    let a = allocator();
    let date = "2024-03-12";
    assert!(a.validate_slot(today(), date, "09:00").is_ok());
    assert!(a.validate_slot(today(), date, "19:30").is_ok());
    assert!(matches!(
        a.validate_slot(today(), date, "08:59"),
        Err(BookingError::OutOfHours { .. })
    ));
    assert!(matches!(
        a.validate_slot(today(), date, "19:31"),
        Err(BookingError::OutOfHours { .. })
    ));
    assert!(matches!(
        a.validate_slot(today(), date, "20:00"),
        Err(BookingError::OutOfHours { .. })
    ));
}

#[test]
fn off_grid_times_are_rejected() {
    assert_eq!(
        allocator().validate_slot(today(), "2024-03-12", "10:15"),
        Err(BookingError::OffGrid(30))
    );
}

#[test]
fn booking_window_is_tomorrow_to_a_week_ahead() {
    let a = allocator();
    assert!(a.validate_slot(today(), "2024-03-12", "10:00").is_ok());
    assert!(a.validate_slot(today(), "2024-03-18", "10:00").is_ok());
    for date in ["2024-03-11", "2024-03-19", "2024-03-01"] {
        assert!(
            matches!(
                a.validate_slot(today(), date, "10:00"),
                Err(BookingError::OutOfWindow { .. })
            ),
            "{date} should be outside the window"
        );
    }
}

#[test]
fn time_format_is_checked_before_the_date() {
    let a = allocator();
    assert_eq!(
        a.validate_slot(today(), "not-a-date", "9h00"),
        Err(BookingError::InvalidFormat("9h00".into()))
    );
    assert_eq!(
        a.validate_slot(today(), "not-a-date", "10:00"),
        Err(BookingError::InvalidDate("not-a-date".into()))
    );
    assert_eq!(
        a.validate_slot(today(), "2030-01-01", "25:00"),
        Err(BookingError::InvalidFormat("25:00".into()))
    );
}

#[test]
fn strict_time_parsing() {
    assert_eq!(parse_time("07:05"), Ok(hm(7, 5)));
    for raw in ["7:05", "07:5", "07-05", "07:05:00", " 07:05", "ab:cd", "24:00"] {
        assert!(parse_time(raw).is_err(), "{raw} should be rejected");
    }
    assert_eq!(format_time(hm(9, 0)), "09:00");
}

#[test]
fn capacity_check() {
    let a = allocator();
    let date = today();
    assert!(a.ensure_capacity(date, hm(10, 0), 2).is_ok());
    assert_eq!(
        a.ensure_capacity(date, hm(10, 0), 3),
        Err(BookingError::SlotFull {
            date,
            time: "10:00".into()
        })
    );
}

#[test]
fn store_today_uses_the_configured_offset() {
    let a = allocator();
    let late_evening_utc = Utc.with_ymd_and_hms(2024, 3, 11, 23, 30, 0).unwrap();
    assert_eq!(
        a.store_today(late_evening_utc),
        NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()
    );
}

#[test]
fn summer_time_needs_its_own_offset() {
    let summer_evening_utc = Utc.with_ymd_and_hms(2024, 7, 11, 22, 30, 0).unwrap();
    assert_eq!(
        allocator().store_today(summer_evening_utc),
        NaiveDate::from_ymd_opt(2024, 7, 11).unwrap()
    );
    let summer = SlotAllocator::new(SchedulingConfig {
        utc_offset_minutes: 120,
        ..SchedulingConfig::default()
    });
    assert_eq!(
        summer.store_today(summer_evening_utc),
        NaiveDate::from_ymd_opt(2024, 7, 12).unwrap()
    );
}

#[test]
fn offsets_beyond_real_time_zones_are_rejected() {
    for minutes in [14 * 60, -12 * 60, 0] {
        let config = SchedulingConfig {
            utc_offset_minutes: minutes,
            ..SchedulingConfig::default()
        };
        assert!(config.validate().is_ok(), "{minutes}");
    }
    let config = SchedulingConfig {
        utc_offset_minutes: 24 * 60,
        ..SchedulingConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn lock_keys_differ_per_slot() {
    let d = today();
    assert_ne!(slot_lock_key(d, hm(9, 0)), slot_lock_key(d, hm(9, 30)));
    assert_ne!(
        slot_lock_key(d, hm(9, 0)),
        slot_lock_key(d.succ_opt().unwrap(), hm(9, 0))
    );
    assert_eq!(slot_lock_key(d, hm(9, 0)), slot_lock_key(d, hm(9, 0)));
}

#[test]
fn custom_hours_change_the_grid() {
    let config = SchedulingConfig {
        open_time: hm(8, 0),
        close_time: hm(12, 0),
        slot_minutes: 60,
        ..SchedulingConfig::default()
    };
    let a = SlotAllocator::new(config);
    assert_eq!(a.slots(), vec![hm(8, 0), hm(9, 0), hm(10, 0), hm(11, 0)]);
    assert_eq!(
        a.validate_slot(today(), "2024-03-12", "08:30"),
        Err(BookingError::OffGrid(60))
    );
}
