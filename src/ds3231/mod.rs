// Licensed under the Apache-2.0 license

//! Maxim DS3231 real-time clock driver.
//!
//! The driver talks to the chip through a [`RegisterBus`], normally an
//! [`I2cTransport`] over an `embedded_hal::i2c::I2c` controller, and is
//! written for bare-metal and `no_std` environments. It covers timekeeping
//! in 12 h and 24 h formats, both alarms with interrupt dispatch, the
//! square-wave and 32 kHz outputs, temperature conversion, the aging offset
//! and Unix timestamps in a fixed time zone.

pub mod calendar;
pub mod common;
pub mod config;
pub mod driver;
pub mod registers;
pub mod traits;
pub mod transport;

pub use common::*;
pub use config::{Ds3231Config, Ds3231ConfigBuilder};
pub use driver::{Ds3231, ASCII_TIME_LEN, TEMPERATURE_POLL_INTERVAL, TEMPERATURE_TIMEOUT};
pub use registers::{Control, Status};
pub use traits::{AlarmHandler, AlarmQueue, RegisterBus};
pub use transport::I2cTransport;
