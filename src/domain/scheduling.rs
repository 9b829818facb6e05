//! Pickup/delivery slot calendar.
//!
//! The day is cut into fixed-length slots between opening and closing time.
//! A slot may start as late as `close - slot length`, so with the default
//! 09:00–20:00 hours and 30-minute slots the last bookable start is 19:30.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::config::SchedulingConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookingError {
    #[error("this cart already has an appointment")]
    AlreadyBooked,

    #[error("time must be formatted as HH:mm, got `{0}`")]
    InvalidFormat(String),

    #[error("date must be formatted as YYYY-MM-DD, got `{0}`")]
    InvalidDate(String),

    #[error("appointments can only be booked between {earliest} and {latest}")]
    OutOfWindow {
        earliest: NaiveDate,
        latest: NaiveDate,
    },

    #[error("appointments must start between {open} and {last}")]
    OutOfHours { open: String, last: String },

    #[error("appointments start every {0} minutes")]
    OffGrid(u32),

    #[error("a delivery address is required")]
    MissingAddress,

    #[error("the {time} slot on {date} is full")]
    SlotFull { date: NaiveDate, time: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SlotAvailability {
    /// Slot start, `HH:mm`.
    pub time: String,
    /// Remaining bookings; negative when the slot was overbooked.
    pub available: i64,
}

#[derive(Debug, Clone)]
pub struct SlotAllocator {
    config: SchedulingConfig,
}

impl SlotAllocator {
    pub fn new(config: SchedulingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    /// Every slot start of a day, in order.
    pub fn slots(&self) -> Vec<NaiveTime> {
        let step = self.config.slot_minutes;
        let close = minutes_of(self.config.close_time);
        let mut start = minutes_of(self.config.open_time);
        let mut slots = Vec::new();
        while start + step <= close {
            if let Some(time) = time_of(start) {
                slots.push(time);
            }
            start += step;
        }
        slots
    }

    pub fn last_slot_start(&self) -> NaiveTime {
        self.slots()
            .last()
            .copied()
            .unwrap_or(self.config.open_time)
    }

    /// Remaining capacity of every slot given the bookings already taken.
    pub fn availability(&self, bookings: &HashMap<NaiveTime, u64>) -> Vec<SlotAvailability> {
        let capacity = i64::from(self.config.slot_capacity);
        self.slots()
            .into_iter()
            .map(|slot| {
                let taken = bookings.get(&slot).copied().unwrap_or(0);
                SlotAvailability {
                    time: format_time(slot),
                    available: capacity - i64::try_from(taken).unwrap_or(i64::MAX),
                }
            })
            .collect()
    }

    /// Calendar date at the store for the given instant.
    pub fn store_today(&self, now: DateTime<Utc>) -> NaiveDate {
        (now + Duration::minutes(i64::from(self.config.utc_offset_minutes))).date_naive()
    }

    pub fn booking_window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        (
            today + Duration::days(i64::from(self.config.min_days_ahead)),
            today + Duration::days(i64::from(self.config.max_days_ahead)),
        )
    }

    /// Format, window, hours and grid checks for a requested slot, in that order.
    pub fn validate_slot(
        &self,
        today: NaiveDate,
        raw_date: &str,
        raw_time: &str,
    ) -> Result<(NaiveDate, NaiveTime), BookingError> {
        let time = parse_time(raw_time)?;
        let date = parse_date(raw_date)?;

        let (earliest, latest) = self.booking_window(today);
        if date < earliest || date > latest {
            return Err(BookingError::OutOfWindow { earliest, latest });
        }

        let last = self.last_slot_start();
        if time < self.config.open_time || time > last {
            return Err(BookingError::OutOfHours {
                open: format_time(self.config.open_time),
                last: format_time(last),
            });
        }

        let offset = minutes_of(time) - minutes_of(self.config.open_time);
        if offset % self.config.slot_minutes != 0 {
            return Err(BookingError::OffGrid(self.config.slot_minutes));
        }

        Ok((date, time))
    }

    pub fn ensure_capacity(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        booked: u64,
    ) -> Result<(), BookingError> {
        if booked >= u64::from(self.config.slot_capacity) {
            return Err(BookingError::SlotFull {
                date,
                time: format_time(time),
            });
        }
        Ok(())
    }
}

/// Strict `HH:mm` parsing: two-digit hour, colon, two-digit minute.
pub fn parse_time(raw: &str) -> Result<NaiveTime, BookingError> {
    let invalid = || BookingError::InvalidFormat(raw.to_string());
    let bytes = raw.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return Err(invalid());
    }
    let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }
    let hour = u32::from(bytes[0] - b'0') * 10 + u32::from(bytes[1] - b'0');
    let minute = u32::from(bytes[3] - b'0') * 10 + u32::from(bytes[4] - b'0');
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, BookingError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| BookingError::InvalidDate(raw.to_string()))
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Key for a transaction-scoped advisory lock serializing bookings of one slot.
pub fn slot_lock_key(date: NaiveDate, time: NaiveTime) -> i64 {
    i64::from(date.num_days_from_ce()) * 1440 + i64::from(minutes_of(time))
}

fn minutes_of(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn time_of(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}
