// Licensed under the Apache-2.0 license

//! Unix timestamp conversions for [`Time`].
//!
//! Uses Howard Hinnant's `civil_from_days` / `days_from_civil`, which are O(1)
//! and exact over the whole proleptic Gregorian calendar.
//! Reference: <http://howardhinnant.github.io/date_algorithms.html>

use super::common::{AmPm, Field, HourFormat, Time, YEAR_MAX, YEAR_MIN};

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_HOUR: i64 = 3_600;
/// Days from 0000-03-01 to 1970-01-01.
const EPOCH_SHIFT: i64 = 719_468;

/// Accepted time-zone offsets in whole hours.
pub const TIME_ZONE_MIN: i8 = -12;
pub const TIME_ZONE_MAX: i8 = 14;

#[must_use]
pub const fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[must_use]
pub const fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// ISO day of week (1 = Monday) for a day count since 1970-01-01, a Thursday.
#[must_use]
pub fn weekday_from_days(days: i64) -> u8 {
    // rem_euclid keeps the result in 0..7
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let offset = (days + 3).rem_euclid(7) as u8;
    offset + 1
}

fn civil_from_days(days: i64) -> (i64, u8, u8) {
    let z = days + EPOCH_SHIFT;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097; // [0, 146096]
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365; // [0, 399]
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]
    let mp = (5 * doy + 2) / 153; // [0, 11], March first
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u8;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

fn days_from_civil(year: u16, month: u8, day: u8) -> i64 {
    let (y, m) = if month <= 2 {
        (i64::from(year) - 1, i64::from(month) + 9)
    } else {
        (i64::from(year), i64::from(month) - 3)
    };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400; // [0, 399]
    let doy = (153 * m + 2) / 5 + i64::from(day) - 1; // [0, 365]
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // [0, 146096]
    era * 146_097 + doe - EPOCH_SHIFT
}

pub(crate) fn check_time_zone(zone: i8) -> Result<(), Field> {
    if (TIME_ZONE_MIN..=TIME_ZONE_MAX).contains(&zone) {
        Ok(())
    } else {
        Err(Field::TimeZone)
    }
}

impl Time {
    /// Build a 24 h `Time` from a calendar date and time of day, deriving the weekday.
    ///
    /// # Errors
    ///
    /// Returns the first field that is out of range, including dates that do
    /// not exist in the given month.
    pub fn from_ymd_hms(
        year: u16,
        month: u8,
        date: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, Field> {
        if !(YEAR_MIN..=YEAR_MAX).contains(&year) {
            return Err(Field::Year);
        }
        if !(1..=12).contains(&month) {
            return Err(Field::Month);
        }
        if date == 0 || date > days_in_month(year, month) {
            return Err(Field::Date);
        }
        if hour > 23 {
            return Err(Field::Hour);
        }
        if minute > 59 {
            return Err(Field::Minute);
        }
        if second > 59 {
            return Err(Field::Second);
        }

        Ok(Self {
            year,
            month,
            week: weekday_from_days(days_from_civil(year, month, date)),
            date,
            hour,
            minute,
            second,
            format: HourFormat::H24,
            am_pm: AmPm::Am,
        })
    }

    /// Local time for a Unix timestamp in a zone `zone_hours` east of UTC.
    ///
    /// # Errors
    ///
    /// `Field::TimeZone` for an offset outside -12..=14, `Field::Timestamp`
    /// if the local date falls outside the years the chip can hold.
    pub fn from_unix_timestamp(timestamp: i64, zone_hours: i8) -> Result<Self, Field> {
        check_time_zone(zone_hours)?;
        let local = timestamp
            .checked_add(i64::from(zone_hours) * SECONDS_PER_HOUR)
            .ok_or(Field::Timestamp)?;
        let days = local.div_euclid(SECONDS_PER_DAY);
        let secs = local.rem_euclid(SECONDS_PER_DAY);

        let (year, month, date) = civil_from_days(days);
        let year = u16::try_from(year)
            .ok()
            .filter(|y| (YEAR_MIN..=YEAR_MAX).contains(y))
            .ok_or(Field::Timestamp)?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (hour, minute, second) = (
            (secs / SECONDS_PER_HOUR) as u8,
            ((secs % SECONDS_PER_HOUR) / 60) as u8,
            (secs % 60) as u8,
        );

        Ok(Self {
            year,
            month,
            week: weekday_from_days(days),
            date,
            hour,
            minute,
            second,
            format: HourFormat::H24,
            am_pm: AmPm::Am,
        })
    }

    /// Unix timestamp of this local time in a zone `zone_hours` east of UTC.
    ///
    /// The stored weekday is ignored; 12 h values are normalised first.
    ///
    /// # Errors
    ///
    /// `Field::TimeZone` for an offset outside -12..=14.
    pub fn to_unix_timestamp(&self, zone_hours: i8) -> Result<i64, Field> {
        check_time_zone(zone_hours)?;
        let days = days_from_civil(self.year, self.month, self.date);
        Ok(days * SECONDS_PER_DAY
            + i64::from(self.hour_24()) * SECONDS_PER_HOUR
            + i64::from(self.minute) * 60
            + i64::from(self.second)
            - i64::from(zone_hours) * SECONDS_PER_HOUR)
    }

    /// Hour of day in 0..=23 regardless of format.
    #[must_use]
    pub const fn hour_24(&self) -> u8 {
        match (self.format, self.am_pm) {
            (HourFormat::H24, _) => self.hour,
            (HourFormat::H12, AmPm::Am) => self.hour % 12,
            (HourFormat::H12, AmPm::Pm) => self.hour % 12 + 12,
        }
    }

    /// Same instant in 24 h format.
    #[must_use]
    pub const fn to_24h(self) -> Self {
        Self {
            hour: self.hour_24(),
            format: HourFormat::H24,
            am_pm: AmPm::Am,
            ..self
        }
    }
}
