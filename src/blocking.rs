//! Blocking driver.

use core::num::NonZeroU32;

#[cfg(feature = "defmt")]
use defmt::{debug, trace};
use embedded_hal::delay::DelayNs;

use crate::chip::Chip;
use crate::error::Error;
use crate::state::{DriverState, Frame};
use crate::{Bus, Operation, POLL_INTERVAL_US};

/// 24Cxx EEPROM driver, generic over any [`Bus`] implementation and delay provider.
///
/// Every call runs to completion on the caller's thread. A failure is returned
/// and also kept in the error slot; while it is pending every call returns it
/// again without bus activity, until [`take_error`](Self::take_error).
pub struct Eeprom<B: Bus, D: DelayNs> {
    bus: B,
    delay: D,
    state: DriverState,
}

impl<B: Bus, D: DelayNs> Eeprom<B, D> {
    /// Create a new driver for `chip`, with `chip_select` matching the A2..A0 pins.
    ///
    /// No bus traffic happens here. A chip-select value the chip type cannot
    /// address leaves [`Error::BadChipSelect`] in the error slot.
    pub fn new(bus: B, delay: D, chip_select: u8, chip: Chip) -> Self {
        Self {
            bus,
            delay,
            state: DriverState::new(chip, chip_select),
        }
    }

    /// Bound the ready-wait to `limit` polls. `None` (the default) polls until
    /// the chip answers.
    pub fn set_poll_limit(&mut self, limit: Option<NonZeroU32>) {
        self.state.poll_limit = limit;
    }

    /// Return the bus and delay handles.
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }

    pub fn chip(&self) -> Chip {
        self.state.chip
    }

    pub fn chip_select(&self) -> u8 {
        self.state.chip_select
    }

    /// Usable size in bytes.
    pub fn size(&self) -> u32 {
        self.state.profile.size
    }

    /// Part name, e.g. `"24C64"`.
    pub fn name(&self) -> &'static str {
        self.state.profile.name
    }

    /// Pending error, left in place.
    pub fn error(&self) -> Option<Error> {
        self.state.errors.get()
    }

    /// Numeric code of the pending error, `0` if none.
    pub fn error_code(&self) -> u8 {
        self.error().map_or(0, Error::code)
    }

    /// Message of the pending error, empty if none.
    pub fn error_message(&self) -> &'static str {
        self.error().map_or("", Error::message)
    }

    /// Pending error, clearing the slot so the driver accepts calls again.
    pub fn take_error(&mut self) -> Option<Error> {
        self.state.errors.take()
    }

    /// Block until the chip acknowledges its address, i.e. its internal write
    /// cycle is over.
    ///
    /// # Errors
    ///
    /// - The pending error, if any.
    /// - [`Error::DeviceNotReady`] if a poll limit is set and exhausted.
    pub fn wait_ready(&mut self) -> Result<(), Error> {
        self.state.guard()?;
        let address = self.state.base_address();
        let mut attempts = 0;
        while self.bus.transaction(address, &mut [Operation::Write(&[])]).is_err() {
            self.state.poll_failed(&mut attempts)?;
            self.delay.delay_us(POLL_INTERVAL_US);
        }
        Ok(())
    }

    /// Writes `data` starting at `address`, one page-write transaction per page touched.
    ///
    /// Each page write is followed by a ready-wait. A failure aborts the
    /// remaining pages; pages already written stay written.
    ///
    /// # Errors
    ///
    /// - [`Error::OutOfRange`] if the run does not fit, before any bus traffic.
    /// - [`Error::Bus`] if a page write is not acknowledged.
    pub fn write_bytes(&mut self, address: u32, data: &[u8]) -> Result<(), Error> {
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
                .transaction(translation.device_address, &mut [Operation::Write(bytes)]);
            self.state.bus_result(result)?;
            #[cfg(feature = "defmt")]
            trace!(
                "Wrote {} bytes at 0x{:05x} (device 0x{:02x})",
                chunk.len(),
                chunk.address,
                translation.device_address
            );
            self.wait_ready()?;
        }
        Ok(())
    }

    /// Writes any byte representation, e.g. an array or a serialized record.
    ///
    /// # Errors
    ///
    /// Same as [`write_bytes`](Self::write_bytes).
    pub fn write_raw(&mut self, address: u32, data: impl AsRef<[u8]>) -> Result<(), Error> {
        self.write_bytes(address, data.as_ref())
    }

    /// # Errors
    ///
    /// Same as [`write_bytes`](Self::write_bytes).
    pub fn write_byte(&mut self, address: u32, value: u8) -> Result<(), Error> {
        self.write_bytes(address, &[value])
    }

    /// Writes `value` little-endian.
    ///
    /// # Errors
    ///
    /// Same as [`write_bytes`](Self::write_bytes).
    pub fn write_short(&mut self, address: u32, value: i16) -> Result<(), Error> {
        self.write_value(address, value.to_le_bytes())
    }

    /// Writes `value` little-endian.
    ///
    /// # Errors
    ///
    /// Same as [`write_bytes`](Self::write_bytes).
    pub fn write_long(&mut self, address: u32, value: i32) -> Result<(), Error> {
        self.write_value(address, value.to_le_bytes())
    }

    /// Writes the IEEE 754 bits of `value` little-endian.
    ///
    /// # Errors
    ///
    /// Same as [`write_bytes`](Self::write_bytes).
    pub fn write_float(&mut self, address: u32, value: f32) -> Result<(), Error> {
        self.write_value(address, value.to_le_bytes())
    }

    fn write_value<const N: usize>(&mut self, address: u32, bytes: [u8; N]) -> Result<(), Error> {
        self.state.check_range(address, N)?;
        self.write_bytes(address, &bytes)
    }

    /// Fills the whole chip with zeros, four bytes per write.
    ///
    /// # Errors
    ///
    /// The first failure of the underlying writes; the rest of the chip is
    /// left untouched.
    pub fn clear(&mut self) -> Result<(), Error> {
        self.state.guard()?;
        for word in 0..self.size().div_ceil(4) {
            self.write_long(word * 4, 0)?;
        }
        #[cfg(feature = "defmt")]
        debug!("Cleared {}", self.name());
        Ok(())
    }

    /// Reads `buffer.len()` bytes starting at `address`.
    ///
    /// The word address is sent first and the data read after a repeated start,
    /// in one transaction. Reads are not limited to a page; only a run crossing
    /// the 64 KiB block boundary of a 128 KiB part takes a second transaction.
    ///
    /// # Errors
    ///
    /// - [`Error::OutOfRange`] if the run does not fit, before any bus traffic.
    /// - [`Error::Bus`] if the transaction fails; `buffer` is then unspecified.
    pub fn read_bytes(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), Error> {
        self.state.guard()?;
        if buffer.is_empty() {
            return Ok(());
        }
        self.state.check_range(address, buffer.len())?;

        for chunk in self.state.read_chunks(address, buffer.len()) {
            let translation = self.state.translate(chunk.address);
            let result = self.bus.transaction(
                translation.device_address,
                &mut [
                    Operation::Write(translation.word_address.as_bytes()),
                    Operation::Read(&mut buffer[chunk.span.clone()]),
                ],
            );
            self.state.bus_result(result)?;
        }
        #[cfg(feature = "defmt")]
        trace!("Read {} bytes at 0x{:05x}", buffer.len(), address);
        Ok(())
    }

    /// Reads `len` bytes into a freshly allocated buffer.
    ///
    /// # Errors
    ///
    /// - [`Error::Allocation`] if the buffer cannot be reserved.
    /// - Otherwise same as [`read_bytes`](Self::read_bytes).
    #[cfg(feature = "alloc")]
    pub fn read_raw(&mut self, address: u32, len: usize) -> Result<alloc::vec::Vec<u8>, Error> {
        self.state.check_range(address, len)?;
        let mut buffer = alloc::vec::Vec::new();
        if buffer.try_reserve_exact(len).is_err() {
            return Err(self.state.errors.record(Error::Allocation));
        }
        buffer.resize(len, 0);
        self.read_bytes(address, &mut buffer)?;
        Ok(buffer)
    }

    /// # Errors
    ///
    /// Same as [`read_bytes`](Self::read_bytes).
    pub fn read_byte(&mut self, address: u32) -> Result<u8, Error> {
        let [value] = self.read_value::<1>(address)?;
        Ok(value)
    }

    /// # Errors
    ///
    /// Same as [`read_bytes`](Self::read_bytes).
    pub fn read_short(&mut self, address: u32) -> Result<i16, Error> {
        self.read_value(address).map(i16::from_le_bytes)
    }

    /// # Errors
    ///
    /// Same as [`read_bytes`](Self::read_bytes).
    pub fn read_long(&mut self, address: u32) -> Result<i32, Error> {
        self.read_value(address).map(i32::from_le_bytes)
    }

    /// # Errors
    ///
    /// Same as [`read_bytes`](Self::read_bytes).
    pub fn read_float(&mut self, address: u32) -> Result<f32, Error> {
        self.read_value(address).map(f32::from_le_bytes)
    }

    fn read_value<const N: usize>(&mut self, address: u32) -> Result<[u8; N], Error> {
        let mut bytes = [0u8; N];
        self.read_bytes(address, &mut bytes)?;
        Ok(bytes)
    }

    /// Reads one byte at the chip's internal address counter, which points
    /// after the last byte read or written.
    ///
    /// The driver cannot range-check this read; the caller must know where
    /// the counter stands.
    ///
    /// # Errors
    ///
    /// [`Error::Bus`] if the transaction fails.
    pub fn read_current(&mut self) -> Result<u8, Error> {
        self.state.guard()?;
        let mut byte = [0u8; 1];
        let result = self
            .bus
            .transaction(self.state.base_address(), &mut [Operation::Read(&mut byte)]);
        self.state.bus_result(result)?;
        Ok(byte[0])
    }
}
