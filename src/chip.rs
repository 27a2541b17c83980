//! Chip family table and logical-to-bus address translation.

/// 7-bit bus address shared by the whole 24Cxx family (`0xA0` as a write byte).
pub const BASE_ADDRESS: u8 = 0x50;

/// Largest page of any supported chip.
pub const MAX_PAGE_SIZE: usize = 128;

/// Longest word address sent in front of a transfer.
pub const MAX_WORD_ADDRESS_LEN: usize = 2;

/// Supported chip types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Chip {
    C24C01,
    C24C02,
    C24C04,
    C24C08,
    C24C16,
    C24C32,
    C24C64,
    C24C128,
    C24C256,
    C24C512,
    C24C1024,
    /// 128 KiB part whose top byte is not addressable.
    C24C1025,
}

impl Chip {
    /// Every chip type, smallest first.
    pub const ALL: [Chip; 12] = [
        Chip::C24C01,
        Chip::C24C02,
        Chip::C24C04,
        Chip::C24C08,
        Chip::C24C16,
        Chip::C24C32,
        Chip::C24C64,
        Chip::C24C128,
        Chip::C24C256,
        Chip::C24C512,
        Chip::C24C1024,
        Chip::C24C1025,
    ];

    /// Immutable constants of this chip type.
    pub fn profile(self) -> &'static Profile {
        match self {
            Chip::C24C01 => &PROFILES[0],
            Chip::C24C02 => &PROFILES[1],
            Chip::C24C04 => &PROFILES[2],
            Chip::C24C08 => &PROFILES[3],
            Chip::C24C16 => &PROFILES[4],
            Chip::C24C32 => &PROFILES[5],
            Chip::C24C64 => &PROFILES[6],
            Chip::C24C128 => &PROFILES[7],
            Chip::C24C256 => &PROFILES[8],
            Chip::C24C512 => &PROFILES[9],
            Chip::C24C1024 => &PROFILES[10],
            Chip::C24C1025 => &PROFILES[11],
        }
    }

    pub fn name(self) -> &'static str {
        self.profile().name
    }
}

/// Per-type constants, looked up once at construction.
#[derive(Debug, PartialEq, Eq)]
pub struct Profile {
    pub name: &'static str,
    /// Capacity constant used by the bounds check. For the 24C1025 this is one
    /// more than the usable size.
    pub nominal_size: u32,
    /// Size reported to callers.
    pub size: u32,
    /// Bytes accepted by one page-write transaction.
    pub page_size: u16,
    /// Number of address blocks selected through the device-select byte.
    pub block_count: u8,
    /// Width of the word address sent on the bus, 1 or 2 bytes.
    pub address_width: u8,
    /// Highest chip-select value accepted at construction.
    pub chip_select_max: u8,
    /// Chip-select bits that survive block folding.
    pub chip_select_mask: u8,
    /// Bit of the 7-bit bus address receiving the block number.
    pub block_shift: u8,
    /// Top byte of the nominal range cannot be accessed.
    pub reserved_top_byte: bool,
}

const fn small(name: &'static str, size: u32, page_size: u16, block_count: u8, mask: u8) -> Profile {
    Profile {
        name,
        nominal_size: size,
        size,
        page_size,
        block_count,
        address_width: 1,
        chip_select_max: if mask == 0 { 0 } else { 7 },
        chip_select_mask: mask,
        block_shift: 0,
        reserved_top_byte: false,
    }
}

const fn large(name: &'static str, size: u32, page_size: u16, chip_select_max: u8) -> Profile {
    Profile {
        name,
        nominal_size: size,
        size,
        page_size,
        block_count: 1,
        address_width: 2,
        chip_select_max,
        chip_select_mask: chip_select_max,
        block_shift: 0,
        reserved_top_byte: false,
    }
}

static PROFILES: [Profile; 12] = [
    small("24C01", 128, 8, 1, 0b111),
    small("24C02", 256, 8, 1, 0b111),
    small("24C04", 512, 16, 2, 0b110),
    small("24C08", 1024, 16, 4, 0b100),
    small("24C16", 2048, 16, 8, 0),
    large("24C32", 4096, 32, 7),
    large("24C64", 8192, 32, 7),
    large("24C128", 16384, 64, 3),
    large("24C256", 32768, 64, 3),
    large("24C512", 65536, 128, 3),
    Profile {
        name: "24C1024",
        nominal_size: 131_072,
        size: 131_072,
        page_size: 128,
        block_count: 2,
        address_width: 2,
        chip_select_max: 7,
        chip_select_mask: 0b110,
        block_shift: 0,
        reserved_top_byte: false,
    },
    Profile {
        name: "24C1025",
        nominal_size: 131_073,
        size: 131_072,
        page_size: 128,
        block_count: 2,
        address_width: 2,
        chip_select_max: 3,
        chip_select_mask: 0b011,
        block_shift: 2,
        reserved_top_byte: true,
    },
];

impl Profile {
    /// Whether the chip-select value is addressable for this chip type.
    pub const fn accepts_chip_select(&self, chip_select: u8) -> bool {
        chip_select <= self.chip_select_max
    }

    /// Chip-select bits as they appear in the 7-bit bus address.
    pub const fn chip_select_bits(&self, chip_select: u8) -> u8 {
        chip_select & self.chip_select_mask
    }

    /// One past the last accessible address.
    pub const fn end(&self) -> u32 {
        if self.reserved_top_byte {
            self.nominal_size - 1
        } else {
            self.nominal_size
        }
    }

    /// Whether `address` can be accessed.
    pub const fn check_address(&self, address: u32) -> bool {
        address < self.end()
    }

    /// Whether the run `address..address + len` is accessible. Empty runs only
    /// need a valid start.
    pub fn check_range(&self, address: u32, len: usize) -> bool {
        let Ok(len) = u32::try_from(len) else {
            return false;
        };
        match len.checked_sub(1) {
            None => self.check_address(address),
            Some(span) => address
                .checked_add(span)
                .is_some_and(|last| self.check_address(last)),
        }
    }

    /// Splits `address` into the device address and word address presented on
    /// the bus. `chip_select_bits` comes from [`Self::chip_select_bits`].
    ///
    /// Total over every address below the nominal size; bounds are the
    /// caller's concern.
    #[allow(clippy::cast_possible_truncation)] // block numbers fit in three bits
    pub const fn translate(&self, chip_select_bits: u8, address: u32) -> Translation {
        let word_bits = 8 * self.address_width as u32;
        let block = (address >> word_bits) as u8;
        let device_address = BASE_ADDRESS | chip_select_bits | (block << self.block_shift);
        let word_address = if self.address_width == 1 {
            WordAddress::One(address as u8)
        } else {
            WordAddress::Two([(address >> 8) as u8, address as u8])
        };
        Translation {
            device_address,
            block,
            word_address,
        }
    }

    /// Bus address polled by the ready-wait: chip-select only, no block bits.
    pub const fn base_device_address(&self, chip_select_bits: u8) -> u8 {
        BASE_ADDRESS | chip_select_bits
    }
}

/// Result of translating one logical address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation {
    /// 7-bit address to present on the bus.
    pub device_address: u8,
    /// Address block folded into the device address.
    pub block: u8,
    pub word_address: WordAddress,
}

impl Translation {
    /// Device-select byte for a write (`device_address << 1`).
    pub const fn device_select(&self) -> u8 {
        self.device_address << 1
    }
}

/// Word address, MSB first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordAddress {
    One(u8),
    Two([u8; 2]),
}

impl WordAddress {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            WordAddress::One(byte) => core::slice::from_ref(byte),
            WordAddress::Two(bytes) => bytes,
        }
    }
}
