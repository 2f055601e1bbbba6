// Licensed under the Apache-2.0 license

//! Shared types for the DS3231 driver: time values, alarm modes, pin
//! functions, chip information and the driver error.

use core::fmt;

/// 7-bit I2C address of the DS3231 (0xD0 in 8-bit write notation).
pub const DS3231_ADDRESS: u8 = 0x68;

/// Earliest year representable by the year register plus century bit.
pub const YEAR_MIN: u16 = 2000;
/// Latest year representable by the year register plus century bit.
pub const YEAR_MAX: u16 = 2199;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Alarm {
    Alarm1 = 0,
    Alarm2 = 1,
}

impl Alarm {
    /// Bit position of this alarm in the control (AxIE) and status (AxF) registers.
    #[must_use]
    pub const fn bit(self) -> u8 {
        self as u8
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum AmPm {
    #[default]
    Am = 0,
    Pm = 1,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum HourFormat {
    #[default]
    H24 = 0,
    H12 = 1,
}

/// Function routed to the shared INT/SQW pin.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Pin {
    SquareWave = 0,
    Interrupt = 1,
}

/// Square-wave output rate selected by RS2:RS1.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SquareWaveFrequency {
    Hz1 = 0,
    Hz1024 = 1,
    Hz4096 = 2,
    Hz8192 = 3,
}

impl SquareWaveFrequency {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Hz1,
            1 => Self::Hz1024,
            2 => Self::Hz4096,
            _ => Self::Hz8192,
        }
    }

    #[must_use]
    pub const fn hertz(self) -> u32 {
        match self {
            Self::Hz1 => 1,
            Self::Hz1024 => 1_024,
            Self::Hz4096 => 4_096,
            Self::Hz8192 => 8_192,
        }
    }
}

/// Alarm 1 match granularity.
///
/// The discriminant is the register layout: bits 0..=3 are the A1M1..A1M4
/// mask bits, bit 4 is DY/DT.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Alarm1Mode {
    OnceASecond = 0x0F,
    SecondMatch = 0x0E,
    MinuteSecondMatch = 0x0C,
    HourMinuteSecondMatch = 0x08,
    DateHourMinuteSecondMatch = 0x00,
    WeekHourMinuteSecondMatch = 0x10,
}

impl Alarm1Mode {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0x0F => Some(Self::OnceASecond),
            0x0E => Some(Self::SecondMatch),
            0x0C => Some(Self::MinuteSecondMatch),
            0x08 => Some(Self::HourMinuteSecondMatch),
            0x00 => Some(Self::DateHourMinuteSecondMatch),
            0x10 => Some(Self::WeekHourMinuteSecondMatch),
            _ => None,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// Alarm 2 match granularity.
///
/// Bits 0..=2 are the A2M2..A2M4 mask bits, bit 4 is DY/DT. Alarm 2 has no
/// seconds register.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Alarm2Mode {
    OnceAMinute = 0x07,
    MinuteMatch = 0x06,
    HourMinuteMatch = 0x04,
    DateHourMinuteMatch = 0x00,
    WeekHourMinuteMatch = 0x10,
}

impl Alarm2Mode {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0x07 => Some(Self::OnceAMinute),
            0x06 => Some(Self::MinuteMatch),
            0x04 => Some(Self::HourMinuteMatch),
            0x00 => Some(Self::DateHourMinuteMatch),
            0x10 => Some(Self::WeekHourMinuteMatch),
            _ => None,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// Wall-clock time as held by the timekeeping registers.
///
/// `year` is the full calendar year, `week` the day of week (1 = Monday,
/// 7 = Sunday). In 12 h format `hour` is 1..=12 and `am_pm` selects the half
/// of the day; in 24 h format `hour` is 0..=23 and `am_pm` must be `Am`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Time {
    pub year: u16,
    pub month: u8,
    pub week: u8,
    pub date: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub format: HourFormat,
    pub am_pm: AmPm,
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format {
            HourFormat::H24 => write!(
                f,
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02} {}",
                self.year, self.month, self.date, self.hour, self.minute, self.second, self.week
            ),
            HourFormat::H12 => write!(
                f,
                "{:04}-{:02}-{:02} {} {:02}:{:02}:{:02} {}",
                self.year,
                self.month,
                self.date,
                match self.am_pm {
                    AmPm::Am => "AM",
                    AmPm::Pm => "PM",
                },
                self.hour,
                self.minute,
                self.second,
                self.week
            ),
        }
    }
}

/// Match time for one of the two alarms.
///
/// Only the fields selected by the alarm mode take part in the match; the
/// others are written as zero and read back as zero. `week` is used by the
/// week modes, `date` by the date modes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AlarmTime {
    pub week: u8,
    pub date: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub format: HourFormat,
    pub am_pm: AmPm,
}

impl AlarmTime {
    /// 24 h hour/minute/second match value with no day field.
    #[must_use]
    pub const fn hms(hour: u8, minute: u8, second: u8) -> Self {
        Self {
            week: 0,
            date: 0,
            hour,
            minute,
            second,
            format: HourFormat::H24,
            am_pm: AmPm::Am,
        }
    }
}

/// Field that failed validation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Field {
    Year,
    Month,
    Week,
    Date,
    Hour,
    Minute,
    Second,
    AmPm,
    AgingOffset,
    TimeZone,
    Timestamp,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Year => "year",
            Field::Month => "month",
            Field::Week => "week",
            Field::Date => "date",
            Field::Hour => "hour",
            Field::Minute => "minute",
            Field::Second => "second",
            Field::AmPm => "am/pm",
            Field::AgingOffset => "aging offset",
            Field::TimeZone => "time zone",
            Field::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// Driver error, generic over the bus error `E`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// Operation issued before `init` (or after `deinit`).
    NotInitialized,
    /// `init` called on a handle that is already initialised.
    AlreadyInitialized,
    /// Input rejected before any bus transaction.
    InvalidParameter(Field),
    /// The transport reported a failure.
    Io(E),
    /// `init` called without an alarm handler installed.
    HandlerNotSet,
    /// Temperature conversion did not finish in time.
    Timeout,
    /// Alarm registers hold a mask-bit combination the datasheet does not define.
    UnknownAlarmMode(u8),
}

impl<E> From<Field> for Error<E> {
    fn from(field: Field) -> Self {
        Error::InvalidParameter(field)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotInitialized => write!(f, "driver not initialized"),
            Error::AlreadyInitialized => write!(f, "driver already initialized"),
            Error::InvalidParameter(field) => write!(f, "invalid {field}"),
            Error::Io(e) => write!(f, "bus error: {e:?}"),
            Error::HandlerNotSet => write!(f, "alarm handler not set"),
            Error::Timeout => write!(f, "temperature conversion timeout"),
            Error::UnknownAlarmMode(bits) => write!(f, "unknown alarm mode bits 0x{bits:02X}"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for Error<E> {}

/// Static chip and driver description.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Info {
    pub chip_name: &'static str,
    pub manufacturer_name: &'static str,
    pub interface: &'static str,
    pub supply_voltage_min_v: f32,
    pub supply_voltage_max_v: f32,
    pub max_current_ma: f32,
    pub temperature_min: f32,
    pub temperature_max: f32,
    pub driver_version: u32,
}

impl Info {
    /// Major part of `driver_version` (2000 -> 2).
    #[must_use]
    pub const fn version_major(&self) -> u32 {
        self.driver_version / 1000
    }

    /// Minor part of `driver_version` (2000 -> 0).
    #[must_use]
    pub const fn version_minor(&self) -> u32 {
        (self.driver_version % 1000) / 100
    }
}

pub const INFO: Info = Info {
    chip_name: "Maxim Integrated DS3231",
    manufacturer_name: "Maxim Integrated",
    interface: "IIC",
    supply_voltage_min_v: 2.3,
    supply_voltage_max_v: 5.5,
    max_current_ma: 0.65,
    temperature_min: -40.0,
    temperature_max: 85.0,
    driver_version: 2000,
};

/// Chip information. Needs no handle.
#[must_use]
pub const fn info() -> Info {
    INFO
}

/// Die temperature in quarter degrees Celsius.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Temperature {
    raw: i16,
}

impl Temperature {
    /// Decode the MSB/LSB temperature register pair (0x11, 0x12).
    #[must_use]
    pub const fn from_registers(msb: u8, lsb: u8) -> Self {
        // MSB is the signed integer part, LSB bits 7:6 the fraction.
        Self {
            raw: ((msb as i8 as i16) << 2) | ((lsb >> 6) as i16),
        }
    }

    /// Build from a raw 10-bit quarter-degree count.
    #[must_use]
    pub const fn from_raw(raw: i16) -> Self {
        Self { raw }
    }

    /// Signed count of 0.25 °C steps.
    #[must_use]
    pub const fn raw(self) -> i16 {
        self.raw
    }

    /// Integer part, rounded toward negative infinity.
    #[must_use]
    pub const fn integer(self) -> i8 {
        (self.raw >> 2) as i8
    }

    /// Fraction in quarter degrees (0..=3) to add to [`Self::integer`].
    #[must_use]
    pub const fn quarters(self) -> u8 {
        (self.raw & 0x03) as u8
    }

    #[must_use]
    pub fn celsius(self) -> f32 {
        f32::from(self.raw) * 0.25
    }
}
