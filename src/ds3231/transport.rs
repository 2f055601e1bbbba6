// Licensed under the Apache-2.0 license

//! `RegisterBus` over any `embedded_hal::i2c::I2c` master.

use embedded_hal::i2c::{I2c, Operation, SevenBitAddress};

use super::traits::RegisterBus;

/// Adapter turning an embedded-hal I2C master into a [`RegisterBus`].
///
/// Reads are a write of the register pointer followed by a repeated-start
/// read. Writes send the pointer and the payload as two adjacent write
/// operations, which embedded-hal merges into one bus write.
pub struct I2cTransport<I2C> {
    i2c: I2C,
}

impl<I2C> I2cTransport<I2C>
where
    I2C: I2c<SevenBitAddress>,
{
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    pub fn inner(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> RegisterBus for I2cTransport<I2C>
where
    I2C: I2c<SevenBitAddress>,
{
    type Error = I2C::Error;

    // The controller is brought up by the board before it is handed over.
    fn init(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn read_registers(&mut self, address: u8, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write_read(address, &[reg], buf)
    }

    fn write_registers(&mut self, address: u8, reg: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.i2c.transaction(
            address,
            &mut [Operation::Write(&[reg]), Operation::Write(bytes)],
        )
    }
}
