// Licensed under the Apache-2.0 license

//! # DS3231 Driver Seams
//!
//! The driver talks to the outside world through two small traits:
//!
//! - [`RegisterBus`]: opens and closes the link and moves register blocks
//!   between the host and the chip.
//! - [`AlarmHandler`]: receives one notification per raised alarm flag when
//!   the interrupt handler runs.
//!
//! Delays come from `embedded_hal::delay::DelayNs` and diagnostics from
//! [`crate::common::Logger`], so neither needs a trait of its own here.
//!
//! ```text
//! Ds3231<B, D, H, L>
//!     ├── B: RegisterBus   (I2cTransport over any embedded_hal::i2c::I2c)
//!     ├── D: DelayNs       (temperature conversion polling)
//!     ├── H: AlarmHandler  (closure, fn pointer or AlarmQueue)
//!     └── L: Logger        (NoOpLogger unless a sink is wired in)
//! ```

use heapless::spsc::Producer;

use super::common::Alarm;

/// Register-level access to a device on a shared bus.
///
/// Implementations perform each call as a single bus transaction: the
/// register pointer is written and the data block follows without releasing
/// the bus, so the chip's auto-incrementing pointer covers the whole block.
///
/// # Examples
///
/// ```rust,no_run
/// use ds3231_ddk::ds3231::RegisterBus;
///
/// fn read_status<B: RegisterBus>(bus: &mut B) -> Result<u8, B::Error> {
///     let mut status = [0u8; 1];
///     bus.read_registers(0x68, 0x0F, &mut status)?;
///     Ok(status[0])
/// }
/// ```
pub trait RegisterBus {
    /// Transport error reported back through `Error::Io`.
    type Error: core::fmt::Debug;

    /// Bring the link up. Called once by `Ds3231::init`.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the link cannot be opened.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Tear the link down. Called by `Ds3231::deinit` and after a failed `init`.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the link cannot be closed.
    fn deinit(&mut self) -> Result<(), Self::Error>;

    /// Read `buf.len()` consecutive registers starting at `reg`.
    ///
    /// # Arguments
    ///
    /// * `address` - 7-bit device address
    /// * `reg` - first register to read
    /// * `buf` - destination, filled in register order
    ///
    /// # Errors
    ///
    /// Returns the transport error on NACK, arbitration loss or bus fault.
    fn read_registers(&mut self, address: u8, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write `bytes` to consecutive registers starting at `reg`.
    ///
    /// # Errors
    ///
    /// Returns the transport error on NACK, arbitration loss or bus fault.
    fn write_registers(&mut self, address: u8, reg: u8, bytes: &[u8]) -> Result<(), Self::Error>;
}

impl<T: RegisterBus + ?Sized> RegisterBus for &mut T {
    type Error = T::Error;

    fn init(&mut self) -> Result<(), Self::Error> {
        (**self).init()
    }

    fn deinit(&mut self) -> Result<(), Self::Error> {
        (**self).deinit()
    }

    fn read_registers(&mut self, address: u8, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read_registers(address, reg, buf)
    }

    fn write_registers(&mut self, address: u8, reg: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).write_registers(address, reg, bytes)
    }
}

/// Receiver for alarm events reported by `Ds3231::irq_handler`.
///
/// # Interrupt context
///
/// `on_alarm` runs wherever `irq_handler` is called, usually the GPIO
/// interrupt wired to the INT/SQW pin. It must not touch the DS3231 bus;
/// defer work (and the `alarm_clear` call) to task context, for example
/// through an [`AlarmQueue`].
pub trait AlarmHandler {
    fn on_alarm(&mut self, alarm: Alarm);
}

impl<F: FnMut(Alarm)> AlarmHandler for F {
    fn on_alarm(&mut self, alarm: Alarm) {
        self(alarm);
    }
}

/// Alarm handler that pushes events into a `heapless` single-producer queue.
///
/// Events that do not fit are counted and dropped; the alarm flag stays set
/// in the chip until cleared, so nothing is lost permanently.
///
/// ```rust,no_run
/// use heapless::spsc::Queue;
/// use ds3231_ddk::ds3231::{Alarm, AlarmQueue};
///
/// let mut queue: Queue<Alarm, 4> = Queue::new();
/// let (producer, mut consumer) = queue.split();
/// let handler = AlarmQueue::new(producer);
/// # let _ = (handler, consumer.dequeue());
/// ```
pub struct AlarmQueue<'a, const N: usize> {
    producer: Producer<'a, Alarm, N>,
    dropped: u32,
}

impl<'a, const N: usize> AlarmQueue<'a, N> {
    pub fn new(producer: Producer<'a, Alarm, N>) -> Self {
        Self {
            producer,
            dropped: 0,
        }
    }

    /// Events discarded because the queue was full.
    #[must_use]
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn into_inner(self) -> Producer<'a, Alarm, N> {
        self.producer
    }
}

impl<const N: usize> AlarmHandler for AlarmQueue<'_, N> {
    fn on_alarm(&mut self, alarm: Alarm) {
        if self.producer.enqueue(alarm).is_err() {
            self.dropped = self.dropped.saturating_add(1);
        }
    }
}
