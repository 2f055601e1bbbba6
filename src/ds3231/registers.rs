// Licensed under the Apache-2.0 license

//! DS3231 register map and codec.
//!
//! Everything in here is pure: it turns typed values into register images
//! and back without touching the bus. Validation happens on encode and
//! reports the first offending [`Field`].

use super::common::{
    Alarm, Alarm1Mode, Alarm2Mode, AlarmTime, AmPm, Field, HourFormat, Pin, SquareWaveFrequency,
    Time, YEAR_MAX, YEAR_MIN,
};

pub const REG_SECONDS: u8 = 0x00;
pub const REG_MINUTES: u8 = 0x01;
pub const REG_HOURS: u8 = 0x02;
pub const REG_WEEK: u8 = 0x03;
pub const REG_DATE: u8 = 0x04;
pub const REG_MONTH: u8 = 0x05;
pub const REG_YEAR: u8 = 0x06;
pub const REG_ALARM1_SECONDS: u8 = 0x07;
pub const REG_ALARM2_MINUTES: u8 = 0x0B;
pub const REG_CONTROL: u8 = 0x0E;
pub const REG_STATUS: u8 = 0x0F;
pub const REG_AGING_OFFSET: u8 = 0x10;
pub const REG_TEMPERATURE_MSB: u8 = 0x11;
pub const REG_TEMPERATURE_LSB: u8 = 0x12;

/// Number of addressable registers.
pub const REG_COUNT: usize = 0x13;

const HOUR_12H: u8 = 1 << 6;
const HOUR_PM: u8 = 1 << 5;
const MONTH_CENTURY: u8 = 1 << 7;
const ALARM_MASK: u8 = 1 << 7;
const ALARM_DY: u8 = 1 << 6;

/// Aging offset step in ppm per LSB.
pub const AGING_PPM_PER_LSB: f32 = 0.12;

#[must_use]
pub const fn to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

#[must_use]
pub const fn from_bcd(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0F)
}

/// Generates a getter and a `with_` setter per named bit.
macro_rules! register_bits {
    ($reg:ident { $($name:ident: $bit:expr),* $(,)? }) => {
        paste::paste! {
            impl $reg {
                $(
                    #[must_use]
                    pub const fn $name(self) -> bool {
                        self.0 & (1 << $bit) != 0
                    }

                    #[must_use]
                    pub const fn [<with_ $name>](self, set: bool) -> Self {
                        if set {
                            Self(self.0 | (1 << $bit))
                        } else {
                            Self(self.0 & !(1 << $bit))
                        }
                    }
                )*
            }
        }
    };
}

/// Control register (0x0E).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Control(pub u8);

register_bits!(Control {
    eosc: 7,
    bbsqw: 6,
    conv: 5,
    rs2: 4,
    rs1: 3,
    intcn: 2,
    a2ie: 1,
    a1ie: 0,
});

impl Control {
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn alarm_interrupt(self, alarm: Alarm) -> bool {
        self.0 & (1 << alarm.bit()) != 0
    }

    #[must_use]
    pub const fn with_alarm_interrupt(self, alarm: Alarm, enable: bool) -> Self {
        match alarm {
            Alarm::Alarm1 => self.with_a1ie(enable),
            Alarm::Alarm2 => self.with_a2ie(enable),
        }
    }

    /// Oscillator running on battery. EOSC is active low.
    #[must_use]
    pub const fn oscillator(self) -> bool {
        !self.eosc()
    }

    #[must_use]
    pub const fn with_oscillator(self, enable: bool) -> Self {
        self.with_eosc(!enable)
    }

    #[must_use]
    pub const fn pin(self) -> Pin {
        if self.intcn() {
            Pin::Interrupt
        } else {
            Pin::SquareWave
        }
    }

    #[must_use]
    pub const fn with_pin(self, pin: Pin) -> Self {
        self.with_intcn(matches!(pin, Pin::Interrupt))
    }

    #[must_use]
    pub const fn rate(self) -> SquareWaveFrequency {
        SquareWaveFrequency::from_bits(self.0 >> 3)
    }

    #[must_use]
    pub const fn with_rate(self, rate: SquareWaveFrequency) -> Self {
        let bits = rate as u8;
        self.with_rs1(bits & 0x01 != 0).with_rs2(bits & 0x02 != 0)
    }
}

/// Status register (0x0F).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Status(pub u8);

register_bits!(Status {
    osf: 7,
    en32khz: 3,
    bsy: 2,
    a2f: 1,
    a1f: 0,
});

impl Status {
    /// Bits the chip only lets software clear; writing 1 leaves them as they are.
    pub const FLAGS: u8 = (1 << 7) | (1 << 1) | 1;

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn is_flagged(self, alarm: Alarm) -> bool {
        self.0 & (1 << alarm.bit()) != 0
    }

    /// Value to write back that leaves every flag untouched.
    #[must_use]
    pub const fn preserving_flags(self) -> Self {
        Self(self.0 | Self::FLAGS)
    }

    /// Value to write back that clears `alarm`'s flag and nothing else.
    #[must_use]
    pub const fn clearing_alarm(self, alarm: Alarm) -> Self {
        Self(self.preserving_flags().0 & !(1 << alarm.bit()))
    }

    /// Value to write back that clears the oscillator-stop flag and nothing else.
    #[must_use]
    pub const fn clearing_osf(self) -> Self {
        self.preserving_flags().with_osf(false)
    }
}

fn check(ok: bool, field: Field) -> Result<(), Field> {
    if ok {
        Ok(())
    } else {
        Err(field)
    }
}

fn encode_hour(hour: u8, format: HourFormat, am_pm: AmPm) -> Result<u8, Field> {
    match format {
        HourFormat::H24 => {
            check(am_pm == AmPm::Am, Field::AmPm)?;
            check(hour <= 23, Field::Hour)?;
            Ok(to_bcd(hour))
        }
        HourFormat::H12 => {
            check((1..=12).contains(&hour), Field::Hour)?;
            let pm = if am_pm == AmPm::Pm { HOUR_PM } else { 0 };
            Ok(HOUR_12H | pm | to_bcd(hour))
        }
    }
}

fn decode_hour(reg: u8) -> (u8, HourFormat, AmPm) {
    if reg & HOUR_12H != 0 {
        let am_pm = if reg & HOUR_PM != 0 { AmPm::Pm } else { AmPm::Am };
        (from_bcd(reg & 0x1F), HourFormat::H12, am_pm)
    } else {
        (from_bcd(reg & 0x3F), HourFormat::H24, AmPm::Am)
    }
}

/// Encode `time` into the seven timekeeping registers starting at 0x00.
pub fn time_to_registers(time: &Time) -> Result<[u8; 7], Field> {
    check((YEAR_MIN..=YEAR_MAX).contains(&time.year), Field::Year)?;
    check((1..=12).contains(&time.month), Field::Month)?;
    check((1..=7).contains(&time.week), Field::Week)?;
    check((1..=31).contains(&time.date), Field::Date)?;
    check(time.minute <= 59, Field::Minute)?;
    check(time.second <= 59, Field::Second)?;
    let hour = encode_hour(time.hour, time.format, time.am_pm)?;

    let offset = time.year - YEAR_MIN;
    let century = if offset >= 100 { MONTH_CENTURY } else { 0 };
    // offset < 200 after the year check
    let year = (offset % 100) as u8;

    Ok([
        to_bcd(time.second),
        to_bcd(time.minute),
        hour,
        time.week,
        to_bcd(time.date),
        century | to_bcd(time.month),
        to_bcd(year),
    ])
}

/// Decode the seven timekeeping registers.
#[must_use]
pub fn registers_to_time(regs: &[u8; 7]) -> Time {
    let [second, minute, hour, week, date, month, year] = *regs;
    let (hour, format, am_pm) = decode_hour(hour);
    let century = if month & MONTH_CENTURY != 0 { 100 } else { 0 };

    Time {
        year: YEAR_MIN + century + u16::from(from_bcd(year)),
        month: from_bcd(month & 0x1F),
        week: week & 0x07,
        date: from_bcd(date & 0x3F),
        hour,
        minute: from_bcd(minute & 0x7F),
        second: from_bcd(second & 0x7F),
        format,
        am_pm,
    }
}

const fn mask_bit(masked: bool) -> u8 {
    if masked {
        ALARM_MASK
    } else {
        0
    }
}

fn encode_minute_second(value: u8, active: bool, field: Field) -> Result<u8, Field> {
    if active {
        check(value <= 59, field)?;
        Ok(to_bcd(value))
    } else {
        Ok(0)
    }
}

fn encode_alarm_hour(alarm: &AlarmTime, active: bool) -> Result<u8, Field> {
    if active {
        encode_hour(alarm.hour, alarm.format, alarm.am_pm)
    } else {
        Ok(0)
    }
}

fn encode_alarm_day(alarm: &AlarmTime, active: bool, by_week: bool) -> Result<u8, Field> {
    match (active, by_week) {
        (false, _) => Ok(0),
        (true, true) => {
            check((1..=7).contains(&alarm.week), Field::Week)?;
            Ok(ALARM_DY | alarm.week)
        }
        (true, false) => {
            check((1..=31).contains(&alarm.date), Field::Date)?;
            Ok(to_bcd(alarm.date))
        }
    }
}

fn decode_alarm_fields(
    minute_second: Option<(u8, u8)>,
    hour: u8,
    day: u8,
    hour_active: bool,
    day_active: bool,
    by_week: bool,
) -> AlarmTime {
    let mut alarm = AlarmTime::default();
    if let Some((minute, second)) = minute_second {
        alarm.minute = minute;
        alarm.second = second;
    }
    if hour_active {
        let (h, format, am_pm) = decode_hour(hour & !ALARM_MASK);
        alarm.hour = h;
        alarm.format = format;
        alarm.am_pm = am_pm;
    }
    if day_active {
        if by_week {
            alarm.week = day & 0x0F;
        } else {
            alarm.date = from_bcd(day & 0x3F);
        }
    }
    alarm
}

/// Mode bits from the mask bits of `regs` (bit 7 of each) and DY/DT.
///
/// DY/DT is a don't-care once the day register itself is masked, so it only
/// contributes while the day takes part in the match.
fn alarm_mode_bits(regs: &[u8], day: u8) -> u8 {
    let masks = regs
        .iter()
        .enumerate()
        .fold(0u8, |acc, (i, reg)| acc | ((reg >> 7) << i));
    let day_masked = day & ALARM_MASK != 0;
    if !day_masked && day & ALARM_DY != 0 {
        masks | 0x10
    } else {
        masks
    }
}

/// Encode alarm 1 (registers 0x07..=0x0A).
pub fn alarm1_to_registers(mode: Alarm1Mode, alarm: &AlarmTime) -> Result<[u8; 4], Field> {
    let bits = mode.bits();
    let second_active = bits & 0x01 == 0;
    let minute_active = bits & 0x02 == 0;
    let hour_active = bits & 0x04 == 0;
    let day_active = bits & 0x08 == 0;
    let by_week = bits & 0x10 != 0;

    let second = encode_minute_second(alarm.second, second_active, Field::Second)?;
    let minute = encode_minute_second(alarm.minute, minute_active, Field::Minute)?;
    let hour = encode_alarm_hour(alarm, hour_active)?;
    let day = encode_alarm_day(alarm, day_active, by_week)?;

    Ok([
        mask_bit(!second_active) | second,
        mask_bit(!minute_active) | minute,
        mask_bit(!hour_active) | hour,
        mask_bit(!day_active) | day,
    ])
}

/// Decode alarm 1. An undefined mask combination is returned as its raw bits.
pub fn registers_to_alarm1(regs: &[u8; 4]) -> Result<(Alarm1Mode, AlarmTime), u8> {
    let [second, minute, hour, day] = *regs;
    let bits = alarm_mode_bits(regs, day);
    let mode = Alarm1Mode::from_bits(bits).ok_or(bits)?;

    let second = if bits & 0x01 == 0 { from_bcd(second & 0x7F) } else { 0 };
    let minute = if bits & 0x02 == 0 { from_bcd(minute & 0x7F) } else { 0 };
    let alarm = decode_alarm_fields(
        Some((minute, second)),
        hour,
        day,
        bits & 0x04 == 0,
        bits & 0x08 == 0,
        bits & 0x10 != 0,
    );
    Ok((mode, alarm))
}

/// Encode alarm 2 (registers 0x0B..=0x0D). The `second` field is ignored.
pub fn alarm2_to_registers(mode: Alarm2Mode, alarm: &AlarmTime) -> Result<[u8; 3], Field> {
    let bits = mode.bits();
    let minute_active = bits & 0x01 == 0;
    let hour_active = bits & 0x02 == 0;
    let day_active = bits & 0x04 == 0;
    let by_week = bits & 0x10 != 0;

    let minute = encode_minute_second(alarm.minute, minute_active, Field::Minute)?;
    let hour = encode_alarm_hour(alarm, hour_active)?;
    let day = encode_alarm_day(alarm, day_active, by_week)?;

    Ok([
        mask_bit(!minute_active) | minute,
        mask_bit(!hour_active) | hour,
        mask_bit(!day_active) | day,
    ])
}

/// Decode alarm 2. An undefined mask combination is returned as its raw bits.
pub fn registers_to_alarm2(regs: &[u8; 3]) -> Result<(Alarm2Mode, AlarmTime), u8> {
    let [minute, hour, day] = *regs;
    let bits = alarm_mode_bits(regs, day);
    let mode = Alarm2Mode::from_bits(bits).ok_or(bits)?;

    let minute = if bits & 0x01 == 0 { from_bcd(minute & 0x7F) } else { 0 };
    let alarm = decode_alarm_fields(
        Some((minute, 0)),
        hour,
        day,
        bits & 0x02 == 0,
        bits & 0x04 == 0,
        bits & 0x10 != 0,
    );
    Ok((mode, alarm))
}

/// Convert a frequency offset in ppm to the nearest aging register value.
pub fn aging_offset_convert_to_register(ppm: f32) -> Result<i8, Field> {
    check(ppm.is_finite(), Field::AgingOffset)?;
    let steps = ppm / AGING_PPM_PER_LSB;
    // core has no f32::round
    let rounded = if steps >= 0.0 { steps + 0.5 } else { steps - 0.5 };
    check(
        rounded > f32::from(i8::MIN) - 1.0 && rounded < f32::from(i8::MAX) + 1.0,
        Field::AgingOffset,
    )?;
    #[allow(clippy::cast_possible_truncation)]
    let value = rounded as i8;
    Ok(value)
}

/// Convert an aging register value to ppm.
#[must_use]
pub fn aging_offset_convert_to_data(reg: i8) -> f32 {
    f32::from(reg) * AGING_PPM_PER_LSB
}
