//! Adapter from `embedded-hal` I2C implementations to this crate's [`Bus`] and [`AsyncBus`] traits.
//!
//! Any HAL I2C peripheral (or a shared-bus device handle from
//! [embedded-hal-bus] / [embassy-embedded-hal]) can be wrapped in
//! [`I2cDeviceAdapter`] to drive an [`Eeprom`](crate::Eeprom) or
//! [`AsyncEeprom`](crate::AsyncEeprom).
//!
//! [embedded-hal-bus]: https://crates.io/crates/embedded-hal-bus
//! [embassy-embedded-hal]: https://crates.io/crates/embassy-embedded-hal
//!
//! # Example (embassy-embedded-hal shared I2C)
//!
//! ```ignore
//! use embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice;
//! use embassy_sync::mutex::Mutex;
//! use at24cxx::{i2c_device::I2cDeviceAdapter, AsyncEeprom, Chip};
//!
//! static I2C_BUS: StaticCell<Mutex<NoopRawMutex, embassy_stm32::i2c::I2c<...>>> = StaticCell::new();
//! let i2c_bus = I2C_BUS.init(Mutex::new(i2c));
//! let adapter = I2cDeviceAdapter::new(I2cDevice::new(i2c_bus));
//! let mut eeprom = AsyncEeprom::new(adapter, embassy_time::Delay, 0, Chip::C24C256);
//! ```

use crate::{AsyncBus, Bus, Error, Operation};

/// Wraps an I2C implementation and implements [`Bus`] (for
/// [`embedded_hal::i2c::I2c`]) and [`AsyncBus`] (for
/// [`embedded_hal_async::i2c::I2c`]).
///
/// Every underlying error, a missing acknowledge included, maps to [`Error::Bus`].
#[derive(Debug)]
pub struct I2cDeviceAdapter<D> {
    device: D,
}

impl<D> I2cDeviceAdapter<D> {
    pub fn new(device: D) -> Self {
        Self { device }
    }

    /// Unwrap and return the underlying I2C device.
    pub fn into_inner(self) -> D {
        self.device
    }
}

impl<D> Bus for I2cDeviceAdapter<D>
where
    D: embedded_hal::i2c::I2c,
{
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Error> {
        self.device
            .transaction(address, operations)
            .map_err(|_| Error::Bus)
    }
}

impl<D> AsyncBus for I2cDeviceAdapter<D>
where
    D: embedded_hal_async::i2c::I2c,
{
    async fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Error> {
        self.device
            .transaction(address, operations)
            .await
            .map_err(|_| Error::Bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Chip, Eeprom, NoDelay};
    use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource};
    use std::vec::Vec;

    /// Bare I2C peripheral: 8-bit word addresses into 256 bytes, acknowledging
    /// only `address`.
    struct FakeI2c {
        address: u8,
        memory: [u8; 256],
        pointer: u8,
        transactions: Vec<(u8, usize)>,
    }

    impl FakeI2c {
        fn new(address: u8) -> Self {
            Self {
                address,
                memory: [0; 256],
                pointer: 0,
                transactions: Vec::new(),
            }
        }

        fn run(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
            self.transactions.push((address, operations.len()));
            if address != self.address {
                return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
            }
            for operation in operations {
                match operation {
                    Operation::Write(bytes) => {
                        if let Some((&word, data)) = bytes.split_first() {
                            self.pointer = word;
                            for &byte in data {
                                self.memory[usize::from(self.pointer)] = byte;
                                self.pointer = self.pointer.wrapping_add(1);
                            }
                        }
                    }
                    Operation::Read(buffer) => {
                        for byte in buffer.iter_mut() {
                            *byte = self.memory[usize::from(self.pointer)];
                            self.pointer = self.pointer.wrapping_add(1);
                        }
                    }
                }
            }
            Ok(())
        }
    }

    impl ErrorType for FakeI2c {
        type Error = ErrorKind;
    }

    impl embedded_hal::i2c::I2c for FakeI2c {
        fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
            self.run(address, operations)
        }
    }

    impl embedded_hal_async::i2c::I2c for FakeI2c {
        async fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
            self.run(address, operations)
        }
    }

    #[test]
    fn blocking_adapter_forwards_transactions() {
        let adapter = I2cDeviceAdapter::new(FakeI2c::new(0x51));
        let mut eeprom = Eeprom::new(adapter, NoDelay, 1, Chip::C24C02);
        eeprom.write_short(0x20, 0x1234).unwrap();
        assert_eq!(eeprom.read_short(0x20), Ok(0x1234));

        let (adapter, _) = eeprom.release();
        let fake = adapter.into_inner();
        assert_eq!(fake.memory[0x20..0x22], [0x34, 0x12]);
        // write, ready poll, write + read
        assert_eq!(fake.transactions, [(0x51, 1), (0x51, 1), (0x51, 2)]);
    }

    #[test]
    fn nack_maps_to_bus_error() {
        let adapter = I2cDeviceAdapter::new(FakeI2c::new(0x57));
        let mut eeprom = Eeprom::new(adapter, NoDelay, 0, Chip::C24C02);
        assert_eq!(eeprom.read_byte(0), Err(Error::Bus));
    }

    #[test]
    fn async_adapter_forwards_transactions() {
        let mut adapter = I2cDeviceAdapter::new(FakeI2c::new(0x50));
        futures::executor::block_on(AsyncBus::transaction(
            &mut adapter,
            0x50,
            &mut [Operation::Write(&[0x10, 0xAA])],
        ))
        .unwrap();
        assert_eq!(adapter.into_inner().memory[0x10], 0xAA);
    }
}
