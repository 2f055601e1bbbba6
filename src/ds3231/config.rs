// Licensed under the Apache-2.0 license

//! Start-up configuration profiles.
//!
//! A [`Ds3231Config`] lists the settings to program after `init`. Fields left
//! as `None` keep whatever the chip holds, which matters on a battery-backed
//! RTC that may already be configured.

use embedded_hal::delay::DelayNs;

use super::common::{Alarm, Error, Pin, SquareWaveFrequency};
use super::driver::Ds3231;
use super::traits::{AlarmHandler, RegisterBus};
use crate::common::Logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ds3231Config {
    pub oscillator: Option<bool>,
    pub alarm1_interrupt: Option<bool>,
    pub alarm2_interrupt: Option<bool>,
    pub pin: Option<Pin>,
    pub square_wave: Option<bool>,
    pub square_wave_frequency: Option<SquareWaveFrequency>,
    pub output_32khz: Option<bool>,
    /// Raw aging register value.
    pub aging_offset: Option<i8>,
    pub time_zone: Option<i8>,
}

impl Ds3231Config {
    /// Plain timekeeping: alarms and both clock outputs off.
    #[must_use]
    pub fn basic() -> Self {
        Ds3231ConfigBuilder::new()
            .oscillator(true)
            .alarm_interrupt(Alarm::Alarm1, false)
            .alarm_interrupt(Alarm::Alarm2, false)
            .pin(Pin::SquareWave)
            .square_wave(false)
            .output_32khz(false)
            .aging_offset(0)
            .build()
    }

    /// INT/SQW pin routed to the alarm interrupt. The alarms themselves are
    /// armed later with `enable_alarm`.
    #[must_use]
    pub fn alarm() -> Self {
        Ds3231ConfigBuilder::new()
            .oscillator(true)
            .pin(Pin::Interrupt)
            .square_wave(false)
            .output_32khz(false)
            .aging_offset(0)
            .build()
    }

    /// Square-wave and 32 kHz outputs; their enables are left to the application.
    #[must_use]
    pub fn output() -> Self {
        Ds3231ConfigBuilder::new()
            .oscillator(true)
            .alarm_interrupt(Alarm::Alarm1, false)
            .alarm_interrupt(Alarm::Alarm2, false)
            .pin(Pin::SquareWave)
            .aging_offset(0)
            .build()
    }
}

pub struct Ds3231ConfigBuilder {
    config: Ds3231Config,
}

impl Default for Ds3231ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Ds3231ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Ds3231Config::default(),
        }
    }
    #[must_use]
    pub fn oscillator(mut self, enable: bool) -> Self {
        self.config.oscillator = Some(enable);
        self
    }
    #[must_use]
    pub fn alarm_interrupt(mut self, alarm: Alarm, enable: bool) -> Self {
        match alarm {
            Alarm::Alarm1 => self.config.alarm1_interrupt = Some(enable),
            Alarm::Alarm2 => self.config.alarm2_interrupt = Some(enable),
        }
        self
    }
    #[must_use]
    pub fn pin(mut self, pin: Pin) -> Self {
        self.config.pin = Some(pin);
        self
    }
    #[must_use]
    pub fn square_wave(mut self, enable: bool) -> Self {
        self.config.square_wave = Some(enable);
        self
    }
    #[must_use]
    pub fn square_wave_frequency(mut self, frequency: SquareWaveFrequency) -> Self {
        self.config.square_wave_frequency = Some(frequency);
        self
    }
    #[must_use]
    pub fn output_32khz(mut self, enable: bool) -> Self {
        self.config.output_32khz = Some(enable);
        self
    }
    #[must_use]
    pub fn aging_offset(mut self, offset: i8) -> Self {
        self.config.aging_offset = Some(offset);
        self
    }
    #[must_use]
    pub fn time_zone(mut self, zone_hours: i8) -> Self {
        self.config.time_zone = Some(zone_hours);
        self
    }
    #[must_use]
    pub fn build(self) -> Ds3231Config {
        self.config
    }
}

impl<B, D, H, L> Ds3231<B, D, H, L>
where
    B: RegisterBus,
    D: DelayNs,
    H: AlarmHandler,
    L: Logger,
{
    /// Program every setting present in `config`.
    pub fn apply_config(&mut self, config: &Ds3231Config) -> Result<(), Error<B::Error>> {
        if let Some(zone) = config.time_zone {
            self.set_timestamp_time_zone(zone)?;
        }
        if let Some(enable) = config.oscillator {
            self.set_oscillator(enable)?;
        }
        if let Some(enable) = config.alarm1_interrupt {
            self.set_alarm_interrupt(Alarm::Alarm1, enable)?;
        }
        if let Some(enable) = config.alarm2_interrupt {
            self.set_alarm_interrupt(Alarm::Alarm2, enable)?;
        }
        if let Some(pin) = config.pin {
            self.set_pin(pin)?;
        }
        if let Some(enable) = config.square_wave {
            self.set_square_wave(enable)?;
        }
        if let Some(frequency) = config.square_wave_frequency {
            self.set_square_wave_frequency(frequency)?;
        }
        if let Some(enable) = config.output_32khz {
            self.set_32khz_output(enable)?;
        }
        if let Some(offset) = config.aging_offset {
            self.set_aging_offset(offset)?;
        }
        Ok(())
    }

    /// `init` followed by [`Ds3231::apply_config`]. A failed step leaves the
    /// handle deinitialised.
    pub fn init_with_config(&mut self, config: &Ds3231Config) -> Result<(), Error<B::Error>> {
        self.init()?;
        if let Err(e) = self.apply_config(config) {
            let _ = self.deinit();
            return Err(e);
        }
        Ok(())
    }
}
