//! A `no_std` Rust driver for the 24Cxx family of two-wire serial EEPROMs, from the
//! 128-byte 24C01 up to the 128 KiB 24C1024/24C1025, built on
//! [`embedded-hal`](https://crates.io/crates/embedded-hal) and
//! [`embedded-hal-async`](https://crates.io/crates/embedded-hal-async) traits.
//!
//! Works with any platform that implements the [`Bus`] (or [`AsyncBus`]) trait;
//! [`i2c_device::I2cDeviceAdapter`] provides both for `embedded-hal` I2C drivers.
//!
//! # Features
//!
//! - Byte, `i16`, `i32`, `f32` and byte-run reads and writes over a linear address space
//! - Page writes split automatically at page boundaries (8 to 128 byte pages)
//! - Block-select bits folded into the device address for the 24C04/08/16 and 128 KiB parts
//! - Ready polling after every page write, with an optional poll limit
//! - Sticky error slot: after a failure every call is a no-op until the error is taken
//! - Blocking ([`Eeprom`]) and async ([`AsyncEeprom`]) drivers sharing the same engine
//! - Optional [`defmt`](https://crates.io/crates/defmt) logging via the `defmt` feature
//!
//! # Example
//!
//! ```rust,no_run
//! # use at24cxx::{Chip, Eeprom, NoDelay};
//! # fn example<B: at24cxx::Bus>(bus: B) -> Result<(), at24cxx::Error> {
//! // 24C64 with A2..A0 tied low
//! let mut eeprom = Eeprom::new(bus, NoDelay, 0, Chip::C24C64);
//!
//! // Runs longer than a page are split into several page writes
//! eeprom.write_bytes(0x001E, b"crosses a 32 byte page")?;
//!
//! let mut buf = [0u8; 22];
//! eeprom.read_bytes(0x001E, &mut buf)?;
//!
//! eeprom.write_float(0x0100, 1.5)?;
//! let value = eeprom.read_float(0x0100)?;
//!
//! // Failures stay pending until taken
//! if let Some(error) = eeprom.take_error() {
//!     // inspect error.message()
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error handling
//!
//! Every operation returns a [`Result`] and also records its failure in the
//! driver's error slot. While an error is pending, every operation returns it
//! again without touching the bus. [`Eeprom::take_error`] clears the slot.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod asynchronous;
pub mod blocking;
pub mod chip;
pub mod error;
pub mod i2c_device;
pub mod page;
mod state;

#[cfg(test)]
mod mock;

pub use asynchronous::AsyncEeprom;
pub use blocking::Eeprom;
pub use chip::{Chip, Profile, Translation, WordAddress};
pub use error::Error;

// Re-export Operation for convenience
pub use embedded_hal::i2c::Operation;

/// Pause between two ready polls, in microseconds.
pub const POLL_INTERVAL_US: u32 = 100;

/// Two-wire bus communication trait for the blocking driver.
pub trait Bus {
    /// Perform one transaction with the device at the 7-bit `address`.
    ///
    /// Consecutive operations are chained with repeated starts; a
    /// `[Write(&[])]` transaction is an address-only probe.
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Error>;
}

/// Two-wire bus communication trait for the async driver.
#[allow(async_fn_in_trait)]
pub trait AsyncBus {
    /// Perform one transaction with the device at the 7-bit `address`.
    async fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Error>;
}

/// Delay provider that returns immediately, turning the ready-wait into a pure busy poll.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl embedded_hal::delay::DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

impl embedded_hal_async::delay::DelayNs for NoDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}
