//! Async driver, for executors such as embassy.
//!
//! Same engine and semantics as [`crate::blocking`]: each call runs to
//! completion, or to its first failure, before its future resolves.

use core::num::NonZeroU32;

#[cfg(feature = "defmt")]
use defmt::{debug, trace};
use embedded_hal_async::delay::DelayNs;

use crate::chip::Chip;
use crate::error::Error;
use crate::state::{DriverState, Frame};
use crate::{AsyncBus, Operation, POLL_INTERVAL_US};

/// Async 24Cxx EEPROM driver, generic over any [`AsyncBus`] implementation and delay provider.
pub struct AsyncEeprom<B: AsyncBus, D: DelayNs> {
    bus: B,
    delay: D,
    state: DriverState,
}

impl<B: AsyncBus, D: DelayNs> AsyncEeprom<B, D> {
    /// Create a new driver. See [`Eeprom::new`](crate::Eeprom::new).
    pub fn new(bus: B, delay: D, chip_select: u8, chip: Chip) -> Self {
        Self {
            bus,
            delay,
            state: DriverState::new(chip, chip_select),
        }
    }

    pub fn set_poll_limit(&mut self, limit: Option<NonZeroU32>) {
        self.state.poll_limit = limit;
    }

    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }

    pub fn chip(&self) -> Chip {
        self.state.chip
    }

    pub fn chip_select(&self) -> u8 {
        self.state.chip_select
    }

    pub fn size(&self) -> u32 {
        self.state.profile.size
    }

    pub fn name(&self) -> &'static str {
        self.state.profile.name
    }

    pub fn error(&self) -> Option<Error> {
        self.state.errors.get()
    }

    pub fn error_code(&self) -> u8 {
        self.error().map_or(0, Error::code)
    }

    pub fn error_message(&self) -> &'static str {
        self.error().map_or("", Error::message)
    }

    pub fn take_error(&mut self) -> Option<Error> {
        self.state.errors.take()
    }

    /// Wait until the chip acknowledges its address again after a write.
    ///
    /// # Errors
    ///
    /// - The pending error, if any.
    /// - [`Error::DeviceNotReady`] if a poll limit is set and exhausted.
    pub async fn wait_ready(&mut self) -> Result<(), Error> {
        self.state.guard()?;
        let address = self.state.base_address();
        let mut attempts = 0;
        while self
            .bus
            .transaction(address, &mut [Operation::Write(&[])])
            .await
            .is_err()
        {
            self.state.poll_failed(&mut attempts)?;
            self.delay.delay_us(POLL_INTERVAL_US).await;
        }
        Ok(())
    }

    /// Writes `data` starting at `address`, one page-write transaction per page touched.
    ///
    /// # Errors
    ///
    /// - [`Error::OutOfRange`] if the run does not fit, before any bus traffic.
    /// - [`Error::Bus`] if a page write is not acknowledged; earlier pages stay written.
    pub async fn write_bytes(&mut self, address: u32, data: &[u8]) -> Result<(), Error> {
        self.state.guard()?;
        if data.is_empty() {
            return Ok(());
        }
        self.state.check_range(address, data.len())?;

        let mut frame = Frame::new();
        for chunk in self.state.write_chunks(address, data.len()) {
            let translation = self.state.translate(chunk.address);
            let bytes = frame.fill(&translation.word_address, &data[chunk.span.clone()]);
            let result = self
                .bus
                .transaction(translation.device_address, &mut [Operation::Write(bytes)])
                .await;
            self.state.bus_result(result)?;
            #[cfg(feature = "defmt")]
            trace!("Wrote {} bytes at 0x{:05x}", chunk.len(), chunk.address);
            self.wait_ready().await?;
        }
        Ok(())
    }

    pub async fn write_raw(&mut self, address: u32, data: impl AsRef<[u8]>) -> Result<(), Error> {
        self.write_bytes(address, data.as_ref()).await
    }

    pub async fn write_byte(&mut self, address: u32, value: u8) -> Result<(), Error> {
        self.write_bytes(address, &[value]).await
    }

    pub async fn write_short(&mut self, address: u32, value: i16) -> Result<(), Error> {
        self.write_value(address, value.to_le_bytes()).await
    }

    pub async fn write_long(&mut self, address: u32, value: i32) -> Result<(), Error> {
        self.write_value(address, value.to_le_bytes()).await
    }

    pub async fn write_float(&mut self, address: u32, value: f32) -> Result<(), Error> {
        self.write_value(address, value.to_le_bytes()).await
    }

    async fn write_value<const N: usize>(&mut self, address: u32, bytes: [u8; N]) -> Result<(), Error> {
        self.state.check_range(address, N)?;
        self.write_bytes(address, &bytes).await
    }

    /// Fills the whole chip with zeros, four bytes per write.
    ///
    /// # Errors
    ///
    /// The first failure of the underlying writes.
    pub async fn clear(&mut self) -> Result<(), Error> {
        self.state.guard()?;
        for word in 0..self.size().div_ceil(4) {
            self.write_long(word * 4, 0).await?;
        }
        #[cfg(feature = "defmt")]
        debug!("Cleared {}", self.name());
        Ok(())
    }

    /// Reads `buffer.len()` bytes starting at `address`.
    ///
    /// # Errors
    ///
    /// - [`Error::OutOfRange`] if the run does not fit, before any bus traffic.
    /// - [`Error::Bus`] if the transaction fails; `buffer` is then unspecified.
    pub async fn read_bytes(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), Error> {
        self.state.guard()?;
        if buffer.is_empty() {
            return Ok(());
        }
        self.state.check_range(address, buffer.len())?;

        for chunk in self.state.read_chunks(address, buffer.len()) {
            let translation = self.state.translate(chunk.address);
            let result = self
                .bus
                .transaction(
                    translation.device_address,
                    &mut [
                        Operation::Write(translation.word_address.as_bytes()),
                        Operation::Read(&mut buffer[chunk.span.clone()]),
                    ],
                )
                .await;
            self.state.bus_result(result)?;
        }
        Ok(())
    }

    #[cfg(feature = "alloc")]
    pub async fn read_raw(&mut self, address: u32, len: usize) -> Result<alloc::vec::Vec<u8>, Error> {
        self.state.check_range(address, len)?;
        let mut buffer = alloc::vec::Vec::new();
        if buffer.try_reserve_exact(len).is_err() {
            return Err(self.state.errors.record(Error::Allocation));
        }
        buffer.resize(len, 0);
        self.read_bytes(address, &mut buffer).await?;
        Ok(buffer)
    }

    pub async fn read_byte(&mut self, address: u32) -> Result<u8, Error> {
        let [value] = self.read_value::<1>(address).await?;
        Ok(value)
    }

    pub async fn read_short(&mut self, address: u32) -> Result<i16, Error> {
        self.read_value(address).await.map(i16::from_le_bytes)
    }

    pub async fn read_long(&mut self, address: u32) -> Result<i32, Error> {
        self.read_value(address).await.map(i32::from_le_bytes)
    }

    pub async fn read_float(&mut self, address: u32) -> Result<f32, Error> {
        self.read_value(address).await.map(f32::from_le_bytes)
    }

    async fn read_value<const N: usize>(&mut self, address: u32) -> Result<[u8; N], Error> {
        let mut bytes = [0u8; N];
        self.read_bytes(address, &mut bytes).await?;
        Ok(bytes)
    }

    /// Reads one byte at the chip's internal address counter. Not range-checked.
    ///
    /// # Errors
    ///
    /// [`Error::Bus`] if the transaction fails.
    pub async fn read_current(&mut self) -> Result<u8, Error> {
        self.state.guard()?;
        let mut byte = [0u8; 1];
        let address = self.state.base_address();
        let result = self
            .bus
            .transaction(address, &mut [Operation::Read(&mut byte)])
            .await;
        self.state.bus_result(result)?;
        Ok(byte[0])
    }
}
