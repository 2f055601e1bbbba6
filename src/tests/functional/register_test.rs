// Licensed under the Apache-2.0 license

use embedded_hal::delay::DelayNs;
use embedded_io::Write;

use super::{ensure, step, TestResult};
use crate::common::Logger;
use crate::ds3231::registers::{
    aging_offset_convert_to_data, aging_offset_convert_to_register, REG_AGING_OFFSET, REG_CONTROL,
};
use crate::ds3231::{
    info, Alarm, AlarmHandler, Ds3231, Pin, RegisterBus, SquareWaveFrequency,
};

/// Exercise every register accessor, restoring control and aging offset afterwards.
pub fn run_register_tests<B, D, H, L, W>(rtc: &mut Ds3231<B, D, H, L>, uart: &mut W) -> TestResult<B::Error>
where
    B: RegisterBus,
    D: DelayNs,
    H: AlarmHandler,
    L: Logger,
    W: Write,
{
    let _ = writeln!(uart, "\r\n=== DS3231 Register Tests ===\r");

    let mut control = [0u8; 1];
    let mut aging = [0u8; 1];
    rtc.get_reg(REG_CONTROL, &mut control)?;
    rtc.get_reg(REG_AGING_OFFSET, &mut aging)?;

    let result = run_steps(rtc, uart);

    rtc.set_reg(REG_CONTROL, &control)?;
    rtc.set_reg(REG_AGING_OFFSET, &aging)?;
    result?;

    let _ = writeln!(uart, "\r\n=== All Register Tests Passed ===\r");
    Ok(())
}

fn run_steps<B, D, H, L, W>(rtc: &mut Ds3231<B, D, H, L>, uart: &mut W) -> TestResult<B::Error>
where
    B: RegisterBus,
    D: DelayNs,
    H: AlarmHandler,
    L: Logger,
    W: Write,
{
    step(uart, "chip info", |uart| test_info::<W, B::Error>(uart))?;
    step(uart, "oscillator", |_| test_oscillator(rtc))?;
    step(uart, "alarm interrupt enables", |_| test_alarm_interrupts(rtc))?;
    step(uart, "pin function", |_| test_pin(rtc))?;
    step(uart, "square wave", |_| test_square_wave(rtc))?;
    step(uart, "32kHz output", |_| test_32khz_output(rtc))?;
    step(uart, "aging offset", |_| test_aging_offset(rtc))?;
    step(uart, "status", |uart| test_status(rtc, uart))?;
    step(uart, "temperature", |uart| test_temperature(rtc, uart))?;
    step(uart, "time zone", |_| test_time_zone(rtc))
}

fn test_info<W: Write, E>(uart: &mut W) -> TestResult<E> {
    let info = info();
    let _ = write!(
        uart,
        "[{} by {}, {} V..{} V] ",
        info.chip_name, info.manufacturer_name, info.supply_voltage_min_v, info.supply_voltage_max_v
    );
    ensure(info.interface == "IIC", "interface")?;
    ensure(info.temperature_min < info.temperature_max, "temperature range")?;
    Ok(())
}

fn test_oscillator<B, D, H, L>(rtc: &mut Ds3231<B, D, H, L>) -> TestResult<B::Error>
where
    B: RegisterBus,
    D: DelayNs,
    H: AlarmHandler,
    L: Logger,
{
    for enable in [false, true] {
        rtc.set_oscillator(enable)?;
        ensure(rtc.get_oscillator()? == enable, "oscillator")?;
    }
    Ok(())
}

fn test_alarm_interrupts<B, D, H, L>(rtc: &mut Ds3231<B, D, H, L>) -> TestResult<B::Error>
where
    B: RegisterBus,
    D: DelayNs,
    H: AlarmHandler,
    L: Logger,
{
    for (alarm, other) in [(Alarm::Alarm1, Alarm::Alarm2), (Alarm::Alarm2, Alarm::Alarm1)] {
        let other_before = rtc.get_alarm_interrupt(other)?;
        for enable in [true, false] {
            rtc.set_alarm_interrupt(alarm, enable)?;
            ensure(rtc.get_alarm_interrupt(alarm)? == enable, "alarm interrupt")?;
            ensure(rtc.get_alarm_interrupt(other)? == other_before, "other alarm interrupt")?;
        }
    }
    Ok(())
}

fn test_pin<B, D, H, L>(rtc: &mut Ds3231<B, D, H, L>) -> TestResult<B::Error>
where
    B: RegisterBus,
    D: DelayNs,
    H: AlarmHandler,
    L: Logger,
{
    for pin in [Pin::Interrupt, Pin::SquareWave] {
        rtc.set_pin(pin)?;
        ensure(rtc.get_pin()? == pin, "pin")?;
    }
    Ok(())
}

fn test_square_wave<B, D, H, L>(rtc: &mut Ds3231<B, D, H, L>) -> TestResult<B::Error>
where
    B: RegisterBus,
    D: DelayNs,
    H: AlarmHandler,
    L: Logger,
{
    for enable in [true, false] {
        rtc.set_square_wave(enable)?;
        ensure(rtc.get_square_wave()? == enable, "square wave")?;
    }
    for rate in [
        SquareWaveFrequency::Hz1,
        SquareWaveFrequency::Hz1024,
        SquareWaveFrequency::Hz4096,
        SquareWaveFrequency::Hz8192,
    ] {
        rtc.set_square_wave_frequency(rate)?;
        ensure(rtc.get_square_wave_frequency()? == rate, "square wave rate")?;
    }
    Ok(())
}

fn test_32khz_output<B, D, H, L>(rtc: &mut Ds3231<B, D, H, L>) -> TestResult<B::Error>
where
    B: RegisterBus,
    D: DelayNs,
    H: AlarmHandler,
    L: Logger,
{
    let before = rtc.get_32khz_output()?;
    for enable in [!before, before] {
        rtc.set_32khz_output(enable)?;
        ensure(rtc.get_32khz_output()? == enable, "32kHz output")?;
    }
    Ok(())
}

fn test_aging_offset<B, D, H, L>(rtc: &mut Ds3231<B, D, H, L>) -> TestResult<B::Error>
where
    B: RegisterBus,
    D: DelayNs,
    H: AlarmHandler,
    L: Logger,
{
    for offset in [i8::MIN, -37, -1, 0, 1, 64, i8::MAX] {
        rtc.set_aging_offset(offset)?;
        let read = rtc.get_aging_offset()?;
        ensure(read == offset, "aging offset")?;
        let ppm = aging_offset_convert_to_data(read);
        ensure(
            aging_offset_convert_to_register(ppm) == Ok(offset),
            "aging offset conversion",
        )?;
    }
    Ok(())
}

fn test_status<B, D, H, L, W>(rtc: &mut Ds3231<B, D, H, L>, uart: &mut W) -> TestResult<B::Error>
where
    B: RegisterBus,
    D: DelayNs,
    H: AlarmHandler,
    L: Logger,
    W: Write,
{
    let status = rtc.get_status()?;
    let _ = write!(uart, "[status 0x{:02X}] ", status.bits());
    // cleared by init, only set again by an oscillator stop
    ensure(!status.osf(), "oscillator stop flag")?;
    Ok(())
}

fn test_temperature<B, D, H, L, W>(rtc: &mut Ds3231<B, D, H, L>, uart: &mut W) -> TestResult<B::Error>
where
    B: RegisterBus,
    D: DelayNs,
    H: AlarmHandler,
    L: Logger,
    W: Write,
{
    let temperature = rtc.get_temperature()?;
    let _ = write!(uart, "[{} C] ", temperature.celsius());
    let info = info();
    ensure(
        (info.temperature_min..=info.temperature_max).contains(&temperature.celsius()),
        "temperature",
    )?;
    Ok(())
}

fn test_time_zone<B, D, H, L>(rtc: &mut Ds3231<B, D, H, L>) -> TestResult<B::Error>
where
    B: RegisterBus,
    D: DelayNs,
    H: AlarmHandler,
    L: Logger,
{
    let before = rtc.get_timestamp_time_zone();
    for zone in [-12, 0, 8, 14] {
        rtc.set_timestamp_time_zone(zone)?;
        ensure(rtc.get_timestamp_time_zone() == zone, "time zone")?;
    }
    ensure(rtc.set_timestamp_time_zone(15).is_err(), "time zone range")?;
    rtc.set_timestamp_time_zone(before)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ds3231::mock::MockError;
    use crate::ds3231::Error;
    use crate::tests::functional::support::{ready_rtc, VecWriter};
    use crate::tests::functional::TestError;

    #[test]
    fn test_register_suite_passes_and_restores() {
        let mut rtc = ready_rtc();
        let control = rtc.bus().control();
        let aging = rtc.bus().reg(REG_AGING_OFFSET);
        let mut out = VecWriter::new();

        assert_eq!(run_register_tests(&mut rtc, &mut out), Ok(()));

        let text = out.text();
        assert!(text.contains("Testing oscillator... PASSED"));
        assert!(text.contains("[25.25 C]"));
        assert!(text.contains("All Register Tests Passed"));
        assert!(!text.contains("FAILED"));
        assert_eq!(rtc.bus().control(), control);
        assert_eq!(rtc.bus().reg(REG_AGING_OFFSET), aging);
    }

    #[test]
    fn test_register_suite_reports_bus_failure() {
        let mut rtc = ready_rtc();
        let mut out = VecWriter::new();
        rtc.bus_mut().conversion_reads = None;

        assert_eq!(
            run_register_tests(&mut rtc, &mut out),
            Err(TestError::Driver(Error::Timeout))
        );
        assert!(out.text().contains("Testing temperature... FAILED"));

        rtc.bus_mut().fail_reads = true;
        assert_eq!(
            run_register_tests(&mut rtc, &mut out),
            Err(TestError::Driver(Error::Io(MockError::Nack)))
        );
    }
}
