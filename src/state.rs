//! Bookkeeping shared by the blocking and async drivers.

use core::num::NonZeroU32;

#[cfg(feature = "defmt")]
use defmt::{debug, trace};

use crate::chip::{Chip, MAX_PAGE_SIZE, MAX_WORD_ADDRESS_LEN, Profile, Translation, WordAddress};
use crate::error::{Error, ErrorSlot};
use crate::page::PageChunks;

/// Size of the word address plus one full page of data.
const FRAME_LEN: usize = MAX_WORD_ADDRESS_LEN + MAX_PAGE_SIZE;

/// Everything about a driver instance except the bus and delay handles.
#[derive(Debug)]
pub(crate) struct DriverState {
    pub(crate) chip: Chip,
    pub(crate) profile: &'static Profile,
    pub(crate) chip_select: u8,
    chip_select_bits: u8,
    pub(crate) errors: ErrorSlot,
    pub(crate) poll_limit: Option<NonZeroU32>,
}

impl DriverState {
    pub(crate) fn new(chip: Chip, chip_select: u8) -> Self {
        let profile = chip.profile();
        let initial = if profile.accepts_chip_select(chip_select) {
            None
        } else {
            #[cfg(feature = "defmt")]
            debug!(
                "Chip select {} out of range for {} (max {})",
                chip_select, profile.name, profile.chip_select_max
            );
            Some(Error::BadChipSelect)
        };
        Self {
            chip,
            profile,
            chip_select,
            chip_select_bits: profile.chip_select_bits(chip_select),
            errors: ErrorSlot::new(initial),
            poll_limit: None,
        }
    }

    pub(crate) fn guard(&self) -> Result<(), Error> {
        self.errors.guard()
    }

    /// Fails with the pending error, or records `OutOfRange` when
    /// `address..address + len` leaves the chip.
    pub(crate) fn check_range(&mut self, address: u32, len: usize) -> Result<(), Error> {
        self.guard()?;
        if self.profile.check_range(address, len) {
            Ok(())
        } else {
            #[cfg(feature = "defmt")]
            trace!("Range 0x{:05x}+{} outside {}", address, len, self.profile.name);
            Err(self.errors.record(Error::OutOfRange))
        }
    }

    pub(crate) fn translate(&self, address: u32) -> Translation {
        self.profile.translate(self.chip_select_bits, address)
    }

    /// Bus address used by the ready poll and the current-address read.
    pub(crate) fn base_address(&self) -> u8 {
        self.profile.base_device_address(self.chip_select_bits)
    }

    pub(crate) fn write_chunks(&self, address: u32, len: usize) -> PageChunks {
        PageChunks::new(u32::from(self.profile.page_size), address, len)
    }

    /// Sequential reads follow the chip's address counter, which only rolls
    /// over at the end of the array on single-byte-address parts but at the
    /// end of each 64 KiB block on the 128 KiB parts.
    pub(crate) fn read_chunks(&self, address: u32, len: usize) -> PageChunks {
        let boundary = if self.profile.address_width == 2 && self.profile.block_count > 1 {
            1 << 16
        } else {
            self.profile.nominal_size.next_power_of_two()
        };
        PageChunks::new(boundary, address, len)
    }

    /// Counts one failed ready poll; fails once the configured limit is reached.
    pub(crate) fn poll_failed(&mut self, attempts: &mut u32) -> Result<(), Error> {
        *attempts = attempts.saturating_add(1);
        match self.poll_limit {
            Some(limit) if *attempts >= limit.get() => {
                #[cfg(feature = "defmt")]
                debug!("Device not ready after {} polls", *attempts);
                Err(self.errors.record(Error::DeviceNotReady))
            }
            _ => Ok(()),
        }
    }

    /// Mirrors a transport failure into the slot as [`Error::Bus`].
    pub(crate) fn bus_result(&mut self, result: Result<(), Error>) -> Result<(), Error> {
        if result.is_err() {
            #[cfg(feature = "defmt")]
            debug!("Bus transaction not acknowledged");
        }
        self.errors.track(result.map_err(|_| Error::Bus))
    }
}

/// Transaction buffer laid out as `[word address][data]`.
pub(crate) struct Frame {
    buf: [u8; FRAME_LEN],
}

impl Frame {
    pub(crate) const fn new() -> Self {
        Self { buf: [0; FRAME_LEN] }
    }

    /// `data` must fit in one page.
    pub(crate) fn fill(&mut self, word_address: &WordAddress, data: &[u8]) -> &[u8] {
        let word = word_address.as_bytes();
        let len = word.len() + data.len();
        self.buf[..word.len()].copy_from_slice(word);
        self.buf[word.len()..len].copy_from_slice(data);
        &self.buf[..len]
    }
}
