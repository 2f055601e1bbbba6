// Licensed under the Apache-2.0 license

use embedded_hal::delay::DelayNs;
use embedded_io::Write;
use fugit::MillisDurationU32;

use super::{ensure, step, TestResult};
use crate::common::Logger;
use crate::ds3231::registers::REG_CONTROL;
use crate::ds3231::{AlarmHandler, Ds3231, Pin, RegisterBus, SquareWaveFrequency};

/// How long each output setting is held so it can be checked with a scope.
const HOLD: MillisDurationU32 = MillisDurationU32::millis(500);

/// Drive the INT/SQW pin through every square-wave rate and toggle the
/// 32 kHz output. Control and the 32 kHz enable are restored afterwards.
pub fn run_output_tests<B, D, H, L, W>(rtc: &mut Ds3231<B, D, H, L>, uart: &mut W) -> TestResult<B::Error>
where
    B: RegisterBus,
    D: DelayNs,
    H: AlarmHandler,
    L: Logger,
    W: Write,
{
    let _ = writeln!(uart, "\r\n=== DS3231 Output Tests ===\r");

    let mut control = [0u8; 1];
    rtc.get_reg(REG_CONTROL, &mut control)?;
    let output_32khz = rtc.get_32khz_output()?;

    let result = run_steps(rtc, uart);

    rtc.set_reg(REG_CONTROL, &control)?;
    rtc.set_32khz_output(output_32khz)?;
    result?;

    let _ = writeln!(uart, "\r\n=== All Output Tests Passed ===\r");
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
    step(uart, "square wave rates", |uart| test_square_wave(rtc, uart))?;
    step(uart, "32kHz output", |_| test_32khz(rtc))
}

fn test_square_wave<B, D, H, L, W>(rtc: &mut Ds3231<B, D, H, L>, uart: &mut W) -> TestResult<B::Error>
where
    B: RegisterBus,
    D: DelayNs,
    H: AlarmHandler,
    L: Logger,
    W: Write,
{
    rtc.set_pin(Pin::SquareWave)?;
    rtc.set_square_wave(true)?;
    for rate in [
        SquareWaveFrequency::Hz1,
        SquareWaveFrequency::Hz1024,
        SquareWaveFrequency::Hz4096,
        SquareWaveFrequency::Hz8192,
    ] {
        rtc.set_square_wave_frequency(rate)?;
        ensure(rtc.get_square_wave_frequency()? == rate, "square wave rate")?;
        ensure(rtc.get_pin()? == Pin::SquareWave, "pin")?;
        let _ = write!(uart, "[{} Hz] ", rate.hertz());
        rtc.delay_mut().delay_ms(HOLD.ticks());
    }
    rtc.set_square_wave(false)?;
    ensure(!rtc.get_square_wave()?, "square wave")?;
    Ok(())
}

fn test_32khz<B, D, H, L>(rtc: &mut Ds3231<B, D, H, L>) -> TestResult<B::Error>
where
    B: RegisterBus,
    D: DelayNs,
    H: AlarmHandler,
    L: Logger,
{
    for enable in [true, false] {
        rtc.set_32khz_output(enable)?;
        ensure(rtc.get_32khz_output()? == enable, "32kHz output")?;
        rtc.delay_mut().delay_ms(HOLD.ticks());
    }
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
    fn test_output_suite_passes_and_restores() {
        let mut rtc = ready_rtc();
        let control = rtc.bus().control();
        let mut out = VecWriter::new();

        assert_eq!(run_output_tests(&mut rtc, &mut out), Ok(()));

        let text = out.text();
        assert!(text.contains("[1 Hz] [1024 Hz] [4096 Hz] [8192 Hz] PASSED"));
        assert!(text.contains("Testing 32kHz output... PASSED"));
        assert_eq!(rtc.bus().control(), control);
        assert!(rtc.bus().status().en32khz());

        let (_, delay) = rtc.release();
        assert_eq!(delay.calls, 6);
        assert_eq!(delay.total_ns, 3_000_000_000);
    }

    #[test]
    fn test_output_suite_keeps_alarm_flags() {
        let mut rtc = ready_rtc();
        rtc.bus_mut().raise(crate::ds3231::Alarm::Alarm2);
        let mut out = VecWriter::new();

        assert_eq!(run_output_tests(&mut rtc, &mut out), Ok(()));
        assert!(rtc.bus().status().a2f());
    }

    #[test]
    fn test_output_suite_reports_read_failure() {
        let mut rtc = ready_rtc();
        rtc.bus_mut().fail_reads = true;
        let mut out = VecWriter::new();

        assert_eq!(
            run_output_tests(&mut rtc, &mut out),
            Err(TestError::Driver(Error::Io(MockError::Nack)))
        );
        // nothing ran, so no step verdict was printed
        assert!(!out.text().contains("Testing"));
    }
}
