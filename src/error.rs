//! Error taxonomy and the sticky error slot shared by both drivers.

use core::fmt;
use core::fmt::Display;

/// Failures reported by the driver.
///
/// Every failure is also recorded in the driver's sticky slot. See
/// [`Eeprom::error`](crate::Eeprom::error) and [`Eeprom::take_error`](crate::Eeprom::take_error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The chip-select value does not fit the chosen chip type.
    BadChipSelect,
    /// The bus transaction was not acknowledged.
    Bus,
    /// Reserved.
    InvalidParameter,
    /// The address, or the end of the transfer, lies outside the chip.
    OutOfRange,
    /// A staging buffer for a raw transfer could not be allocated.
    Allocation,
    /// The chip did not acknowledge within the configured poll limit.
    DeviceNotReady,
}

impl Error {
    /// Numeric code of the error; `0` is reserved for "no error".
    pub const fn code(self) -> u8 {
        match self {
            Error::BadChipSelect => 1,
            Error::Bus => 2,
            Error::InvalidParameter => 3,
            Error::OutOfRange => 4,
            Error::Allocation => 5,
            Error::DeviceNotReady => 6,
        }
    }

    /// Human readable description.
    pub const fn message(self) -> &'static str {
        match self {
            Error::BadChipSelect => "Bad chip address",
            Error::Bus => "I2C error (nack)",
            Error::InvalidParameter => "Invalid parameter",
            Error::OutOfRange => "Data address out of range",
            Error::Allocation => "Memory allocation error",
            Error::DeviceNotReady => "Device not ready",
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EepromError: {}", self.message())
    }
}

impl core::error::Error for Error {}

/// Holds the first unresolved failure until the caller takes it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ErrorSlot(Option<Error>);

impl ErrorSlot {
    pub(crate) const fn new(initial: Option<Error>) -> Self {
        Self(initial)
    }

    /// Fails with the stored error if one is pending.
    pub(crate) fn guard(&self) -> Result<(), Error> {
        match self.0 {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Records `error` unless an earlier one is still pending, and hands it back
    /// so callers can write `return Err(self.errors.record(..))`.
    pub(crate) fn record(&mut self, error: Error) -> Error {
        *self.0.get_or_insert(error)
    }

    /// Mirrors the failure of `result` into the slot.
    pub(crate) fn track<T>(&mut self, result: Result<T, Error>) -> Result<T, Error> {
        result.map_err(|error| self.record(error))
    }

    pub(crate) const fn get(&self) -> Option<Error> {
        self.0
    }

    pub(crate) fn take(&mut self) -> Option<Error> {
        self.0.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_message_table() {
        assert_eq!(Error::BadChipSelect.code(), 1);
        assert_eq!(Error::Bus.code(), 2);
        assert_eq!(Error::InvalidParameter.code(), 3);
        assert_eq!(Error::OutOfRange.code(), 4);
        assert_eq!(Error::Allocation.code(), 5);
        assert_eq!(Error::Bus.message(), "I2C error (nack)");
    }

    #[test]
    fn display_includes_message() {
        let text = std::format!("{}", Error::OutOfRange);
        assert_eq!(text, "EepromError: Data address out of range");
    }

    #[test]
    fn slot_keeps_first_error() {
        let mut slot = ErrorSlot::default();
        assert_eq!(slot.guard(), Ok(()));
        assert_eq!(slot.record(Error::OutOfRange), Error::OutOfRange);
        assert_eq!(slot.record(Error::Bus), Error::OutOfRange);
        assert_eq!(slot.guard(), Err(Error::OutOfRange));
        assert_eq!(slot.take(), Some(Error::OutOfRange));
        assert_eq!(slot.get(), None);
    }

    #[test]
    fn track_mirrors_failures_only() {
        let mut slot = ErrorSlot::default();
        assert_eq!(slot.track(Ok::<u8, Error>(3)), Ok(3));
        assert_eq!(slot.get(), None);
        assert_eq!(slot.track::<()>(Err(Error::Bus)), Err(Error::Bus));
        assert_eq!(slot.get(), Some(Error::Bus));
    }
}
