// Licensed under the Apache-2.0 license

use core::fmt::Write as _;

use embedded_hal::delay::DelayNs;
use fugit::MillisDurationU32;

use super::common::{
    Alarm, Alarm1Mode, Alarm2Mode, AlarmTime, Error, Field, Pin, SquareWaveFrequency,
    Temperature, Time, DS3231_ADDRESS,
};
use super::calendar::check_time_zone;
use super::registers::{
    self, Control, Status, REG_AGING_OFFSET, REG_ALARM1_SECONDS, REG_ALARM2_MINUTES, REG_CONTROL,
    REG_SECONDS, REG_STATUS, REG_TEMPERATURE_MSB,
};
use super::traits::{AlarmHandler, RegisterBus};
use crate::common::{Logger, NoOpLogger};

/// Interval between BSY polls while a temperature conversion runs.
pub const TEMPERATURE_POLL_INTERVAL: MillisDurationU32 = MillisDurationU32::millis(10);
/// Longest wait for a temperature conversion.
pub const TEMPERATURE_TIMEOUT: MillisDurationU32 = MillisDurationU32::millis(5_000);

/// Capacity of the string returned by [`Ds3231::get_ascii_time`].
pub const ASCII_TIME_LEN: usize = 32;

/// DS3231 driver handle.
///
/// Owns the register bus, a delay provider, the alarm handler and a logger.
/// Every operation except construction and [`Ds3231::init`] requires an
/// initialised handle and fails with [`Error::NotInitialized`] before
/// touching the bus otherwise.
///
/// ```rust,no_run
/// # use ds3231_ddk::ds3231::{Ds3231, I2cTransport, Alarm};
/// # fn demo<I: embedded_hal::i2c::I2c, D: embedded_hal::delay::DelayNs>(i2c: I, delay: D) {
/// let mut rtc = Ds3231::new(I2cTransport::new(i2c), delay)
///     .with_alarm_handler(|alarm: Alarm| { let _ = alarm; });
/// if rtc.init().is_ok() {
///     let _now = rtc.get_time();
/// }
/// # }
/// ```
pub struct Ds3231<B, D, H = fn(Alarm), L: Logger = NoOpLogger> {
    bus: B,
    delay: D,
    handler: Option<H>,
    logger: L,
    inited: bool,
    time_zone: i8,
}

impl<B: RegisterBus, D: DelayNs> Ds3231<B, D> {
    pub fn new(bus: B, delay: D) -> Self {
        Self {
            bus,
            delay,
            handler: None,
            logger: NoOpLogger,
            inited: false,
            time_zone: 0,
        }
    }
}

impl<B, D, H, L: Logger> Ds3231<B, D, H, L> {
    /// Install the handler [`Ds3231::irq_handler`] reports alarms to.
    pub fn with_alarm_handler<H2: AlarmHandler>(self, handler: H2) -> Ds3231<B, D, H2, L> {
        Ds3231 {
            bus: self.bus,
            delay: self.delay,
            handler: Some(handler),
            logger: self.logger,
            inited: self.inited,
            time_zone: self.time_zone,
        }
    }

    pub fn with_logger<L2: Logger>(self, logger: L2) -> Ds3231<B, D, H, L2> {
        Ds3231 {
            bus: self.bus,
            delay: self.delay,
            handler: self.handler,
            logger,
            inited: self.inited,
            time_zone: self.time_zone,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.inited
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn handler_mut(&mut self) -> Option<&mut H> {
        self.handler.as_mut()
    }

    pub fn logger_mut(&mut self) -> &mut L {
        &mut self.logger
    }

    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }

    /// Give back the bus and delay. Does not close the link; call `deinit` first.
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }
}

impl<B, D, H, L> Ds3231<B, D, H, L>
where
    B: RegisterBus,
    D: DelayNs,
    H: AlarmHandler,
    L: Logger,
{
    // ---- bus helpers -------------------------------------------------------

    fn ensure_init(&self) -> Result<(), Error<B::Error>> {
        if self.inited {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    fn read(&mut self, reg: u8, buf: &mut [u8], what: &str) -> Result<(), Error<B::Error>> {
        match self.bus.read_registers(DS3231_ADDRESS, reg, buf) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.logger.error(what);
                Err(Error::Io(e))
            }
        }
    }

    fn write(&mut self, reg: u8, bytes: &[u8], what: &str) -> Result<(), Error<B::Error>> {
        match self.bus.write_registers(DS3231_ADDRESS, reg, bytes) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.logger.error(what);
                Err(Error::Io(e))
            }
        }
    }

    fn read_u8(&mut self, reg: u8, what: &str) -> Result<u8, Error<B::Error>> {
        let mut buf = [0u8; 1];
        self.read(reg, &mut buf, what)?;
        Ok(buf[0])
    }

    fn read_control(&mut self) -> Result<Control, Error<B::Error>> {
        self.read_u8(REG_CONTROL, "read control failed").map(Control)
    }

    fn update_control(
        &mut self,
        f: impl FnOnce(Control) -> Control,
    ) -> Result<(), Error<B::Error>> {
        let control = f(self.read_control()?);
        self.write(REG_CONTROL, &[control.bits()], "write control failed")
    }

    fn read_status(&mut self) -> Result<Status, Error<B::Error>> {
        self.read_u8(REG_STATUS, "read status failed").map(Status)
    }

    fn write_status(&mut self, status: Status) -> Result<(), Error<B::Error>> {
        self.write(REG_STATUS, &[status.bits()], "write status failed")
    }

    fn invalid(&mut self, field: Field) -> Error<B::Error> {
        self.logger.error("invalid parameter");
        Error::InvalidParameter(field)
    }

    // ---- lifecycle ---------------------------------------------------------

    /// Open the link and clear the oscillator-stop flag.
    ///
    /// # Errors
    ///
    /// - `AlreadyInitialized` if called twice without `deinit`
    /// - `HandlerNotSet` if no alarm handler was installed
    /// - `Io` if the link cannot be opened or the status register cannot be
    ///   updated; the link is closed again in the latter case
    pub fn init(&mut self) -> Result<(), Error<B::Error>> {
        if self.inited {
            return Err(Error::AlreadyInitialized);
        }
        if self.handler.is_none() {
            self.logger.error("alarm handler is not set");
            return Err(Error::HandlerNotSet);
        }
        if let Err(e) = self.bus.init() {
            self.logger.error("bus init failed");
            return Err(Error::Io(e));
        }

        let cleared = self
            .read_status()
            .and_then(|status| self.write_status(status.clearing_osf()));
        if let Err(e) = cleared {
            // report the status failure, not a close failure
            let _ = self.bus.deinit();
            return Err(e);
        }

        self.inited = true;
        self.logger.debug("initialized");
        Ok(())
    }

    /// Close the link. The handle can be initialised again afterwards.
    pub fn deinit(&mut self) -> Result<(), Error<B::Error>> {
        self.ensure_init()?;
        if let Err(e) = self.bus.deinit() {
            self.logger.error("bus deinit failed");
            return Err(Error::Io(e));
        }
        self.inited = false;
        Ok(())
    }

    // ---- time --------------------------------------------------------------

    /// Write all seven timekeeping registers in one transaction.
    pub fn set_time(&mut self, time: &Time) -> Result<(), Error<B::Error>> {
        self.ensure_init()?;
        let regs = registers::time_to_registers(time).map_err(|f| self.invalid(f))?;
        self.write(REG_SECONDS, &regs, "write time failed")
    }

    pub fn get_time(&mut self) -> Result<Time, Error<B::Error>> {
        self.ensure_init()?;
        let mut regs = [0u8; 7];
        self.read(REG_SECONDS, &mut regs, "read time failed")?;
        Ok(registers::registers_to_time(&regs))
    }

    // ---- alarms ------------------------------------------------------------

    pub fn set_alarm1(&mut self, mode: Alarm1Mode, alarm: &AlarmTime) -> Result<(), Error<B::Error>> {
        self.ensure_init()?;
        let regs = registers::alarm1_to_registers(mode, alarm).map_err(|f| self.invalid(f))?;
        self.write(REG_ALARM1_SECONDS, &regs, "write alarm1 failed")
    }

    /// Read back alarm 1. Fields the mode does not match on read as zero.
    pub fn get_alarm1(&mut self) -> Result<(Alarm1Mode, AlarmTime), Error<B::Error>> {
        self.ensure_init()?;
        let mut regs = [0u8; 4];
        self.read(REG_ALARM1_SECONDS, &mut regs, "read alarm1 failed")?;
        registers::registers_to_alarm1(&regs).map_err(|bits| {
            self.logger.error("alarm1 mode is invalid");
            Error::UnknownAlarmMode(bits)
        })
    }

    /// Program alarm 2. It has no seconds register; `alarm.second` is ignored.
    pub fn set_alarm2(&mut self, mode: Alarm2Mode, alarm: &AlarmTime) -> Result<(), Error<B::Error>> {
        self.ensure_init()?;
        let regs = registers::alarm2_to_registers(mode, alarm).map_err(|f| self.invalid(f))?;
        self.write(REG_ALARM2_MINUTES, &regs, "write alarm2 failed")
    }

    pub fn get_alarm2(&mut self) -> Result<(Alarm2Mode, AlarmTime), Error<B::Error>> {
        self.ensure_init()?;
        let mut regs = [0u8; 3];
        self.read(REG_ALARM2_MINUTES, &mut regs, "read alarm2 failed")?;
        registers::registers_to_alarm2(&regs).map_err(|bits| {
            self.logger.error("alarm2 mode is invalid");
            Error::UnknownAlarmMode(bits)
        })
    }

    pub fn set_alarm_interrupt(&mut self, alarm: Alarm, enable: bool) -> Result<(), Error<B::Error>> {
        self.ensure_init()?;
        self.update_control(|c| c.with_alarm_interrupt(alarm, enable))
    }

    pub fn get_alarm_interrupt(&mut self, alarm: Alarm) -> Result<bool, Error<B::Error>> {
        self.ensure_init()?;
        Ok(self.read_control()?.alarm_interrupt(alarm))
    }

    /// Clear `alarm`'s flag. Other flags are written back as 1, which the chip
    /// ignores, so a flag raised after the status read survives.
    pub fn alarm_clear(&mut self, alarm: Alarm) -> Result<(), Error<B::Error>> {
        self.ensure_init()?;
        let status = self.read_status()?;
        self.write_status(status.clearing_alarm(alarm))
    }

    /// Clear the flag, then enable the interrupt, so a stale match does not fire.
    pub fn enable_alarm(&mut self, alarm: Alarm) -> Result<(), Error<B::Error>> {
        self.alarm_clear(alarm)?;
        self.set_alarm_interrupt(alarm, true)
    }

    pub fn disable_alarm(&mut self, alarm: Alarm) -> Result<(), Error<B::Error>> {
        self.set_alarm_interrupt(alarm, false)
    }

    pub fn get_status(&mut self) -> Result<Status, Error<B::Error>> {
        self.ensure_init()?;
        self.read_status()
    }

    /// Dispatch raised alarm flags to the handler, alarm 1 first.
    ///
    /// Call from the INT/SQW pin interrupt. Flags are not cleared; the
    /// application acknowledges each alarm with [`Ds3231::alarm_clear`].
    pub fn irq_handler(&mut self) -> Result<Status, Error<B::Error>> {
        self.ensure_init()?;
        let status = self.read_status()?;
        if let Some(handler) = self.handler.as_mut() {
            for alarm in [Alarm::Alarm1, Alarm::Alarm2] {
                if status.is_flagged(alarm) {
                    handler.on_alarm(alarm);
                }
            }
        }
        Ok(status)
    }

    // ---- oscillator and outputs --------------------------------------------

    /// Keep the oscillator running on battery power (clears EOSC).
    pub fn set_oscillator(&mut self, enable: bool) -> Result<(), Error<B::Error>> {
        self.ensure_init()?;
        self.update_control(|c| c.with_oscillator(enable))
    }

    pub fn get_oscillator(&mut self) -> Result<bool, Error<B::Error>> {
        self.ensure_init()?;
        Ok(self.read_control()?.oscillator())
    }

    pub fn set_32khz_output(&mut self, enable: bool) -> Result<(), Error<B::Error>> {
        self.ensure_init()?;
        let status = self.read_status()?;
        self.write_status(status.with_en32khz(enable).preserving_flags())
    }

    pub fn get_32khz_output(&mut self) -> Result<bool, Error<B::Error>> {
        self.ensure_init()?;
        Ok(self.read_status()?.en32khz())
    }

    /// Keep the square wave running on battery power (BBSQW).
    pub fn set_square_wave(&mut self, enable: bool) -> Result<(), Error<B::Error>> {
        self.ensure_init()?;
        self.update_control(|c| c.with_bbsqw(enable))
    }

    pub fn get_square_wave(&mut self) -> Result<bool, Error<B::Error>> {
        self.ensure_init()?;
        Ok(self.read_control()?.bbsqw())
    }

    pub fn set_square_wave_frequency(
        &mut self,
        frequency: SquareWaveFrequency,
    ) -> Result<(), Error<B::Error>> {
        self.ensure_init()?;
        self.update_control(|c| c.with_rate(frequency))
    }

    pub fn get_square_wave_frequency(&mut self) -> Result<SquareWaveFrequency, Error<B::Error>> {
        self.ensure_init()?;
        Ok(self.read_control()?.rate())
    }

    /// Route the INT/SQW pin to the square wave or to the alarm interrupt.
    pub fn set_pin(&mut self, pin: Pin) -> Result<(), Error<B::Error>> {
        self.ensure_init()?;
        self.update_control(|c| c.with_pin(pin))
    }

    pub fn get_pin(&mut self) -> Result<Pin, Error<B::Error>> {
        self.ensure_init()?;
        Ok(self.read_control()?.pin())
    }

    // ---- temperature -------------------------------------------------------

    /// Set CONV to start a temperature conversion. Pair with [`Ds3231::poll_temperature`].
    pub fn start_temperature_conversion(&mut self) -> Result<(), Error<B::Error>> {
        self.ensure_init()?;
        self.update_control(|c| c.with_conv(true))
    }

    /// Non-blocking check for a finished conversion.
    ///
    /// Returns `WouldBlock` while BSY is set, otherwise reads the result.
    pub fn poll_temperature(&mut self) -> nb::Result<Temperature, Error<B::Error>> {
        self.ensure_init()?;
        if self.read_status()?.bsy() {
            return Err(nb::Error::WouldBlock);
        }
        let mut regs = [0u8; 2];
        self.read(REG_TEMPERATURE_MSB, &mut regs, "read temperature failed")?;
        Ok(Temperature::from_registers(regs[0], regs[1]))
    }

    /// Run a conversion and wait for it, polling every 10 ms for up to 5 s.
    pub fn get_temperature(&mut self) -> Result<Temperature, Error<B::Error>> {
        self.start_temperature_conversion()?;
        let tries = TEMPERATURE_TIMEOUT.ticks() / TEMPERATURE_POLL_INTERVAL.ticks();
        for _ in 0..tries {
            match self.poll_temperature() {
                Ok(temperature) => return Ok(temperature),
                Err(nb::Error::WouldBlock) => {
                    self.delay.delay_ms(TEMPERATURE_POLL_INTERVAL.ticks());
                }
                Err(nb::Error::Other(e)) => return Err(e),
            }
        }
        self.logger.error("temperature conversion timeout");
        Err(Error::Timeout)
    }

    // ---- aging offset ------------------------------------------------------

    /// Write the raw aging register (0.12 ppm per LSB, see
    /// [`registers::aging_offset_convert_to_register`]).
    pub fn set_aging_offset(&mut self, offset: i8) -> Result<(), Error<B::Error>> {
        self.ensure_init()?;
        self.write(REG_AGING_OFFSET, &offset.to_be_bytes(), "write aging offset failed")
    }

    pub fn get_aging_offset(&mut self) -> Result<i8, Error<B::Error>> {
        self.ensure_init()?;
        let reg = self.read_u8(REG_AGING_OFFSET, "read aging offset failed")?;
        Ok(i8::from_be_bytes([reg]))
    }

    // ---- raw access --------------------------------------------------------

    /// Read consecutive registers starting at `reg` without interpretation.
    pub fn get_reg(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Error<B::Error>> {
        self.ensure_init()?;
        self.read(reg, buf, "read register failed")
    }

    /// Write consecutive registers starting at `reg` without validation.
    pub fn set_reg(&mut self, reg: u8, bytes: &[u8]) -> Result<(), Error<B::Error>> {
        self.ensure_init()?;
        self.write(reg, bytes, "write register failed")
    }

    // ---- timestamps --------------------------------------------------------

    /// Offset in hours east of UTC used by the timestamp helpers.
    ///
    /// Local handle state only; does not need `init`.
    pub fn set_timestamp_time_zone(&mut self, zone_hours: i8) -> Result<(), Error<B::Error>> {
        check_time_zone(zone_hours).map_err(|f| self.invalid(f))?;
        self.time_zone = zone_hours;
        Ok(())
    }

    pub fn get_timestamp_time_zone(&self) -> i8 {
        self.time_zone
    }

    /// Set the clock from a Unix timestamp, converted to local time.
    pub fn set_timestamp(&mut self, timestamp: i64) -> Result<(), Error<B::Error>> {
        self.ensure_init()?;
        let time =
            Time::from_unix_timestamp(timestamp, self.time_zone).map_err(|f| self.invalid(f))?;
        self.set_time(&time)
    }

    /// Read the clock as a Unix timestamp, treating it as local time.
    pub fn get_timestamp(&mut self) -> Result<i64, Error<B::Error>> {
        let time = self.get_time()?;
        time.to_unix_timestamp(self.time_zone)
            .map_err(|f| self.invalid(f))
    }

    /// Current time as `YYYY-MM-DD hh:mm:ss w`, with `AM|PM` before the time
    /// in 12 h format.
    pub fn get_ascii_time(&mut self) -> Result<heapless::String<ASCII_TIME_LEN>, Error<B::Error>> {
        let time = self.get_time()?;
        let mut text = heapless::String::new();
        // at most 24 characters for any decodable register image
        let _ = write!(text, "{time}");
        Ok(text)
    }
}
