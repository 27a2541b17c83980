//! Simulated 24Cxx chip used by the driver tests.

use std::vec;
use std::vec::Vec;

use crate::chip::{BASE_ADDRESS, Chip, Profile};
use crate::{AsyncBus, Bus, Error, Operation};

/// One transaction as seen on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub address: u8,
    /// Bytes of the write phase, word address included.
    pub written: Vec<u8>,
    /// Length of the read phase.
    pub read: usize,
}

impl Record {
    /// Address-only write issued by the ready poll.
    pub fn is_poll(&self) -> bool {
        self.written.is_empty() && self.read == 0
    }
}

#[derive(Debug)]
pub struct MockBus {
    profile: &'static Profile,
    chip_select_bits: u8,
    pub memory: Vec<u8>,
    pointer: u32,
    /// Polls answered with a nack after each page write.
    pub busy_polls: u32,
    busy_left: u32,
    /// Never acknowledge a poll.
    pub stuck: bool,
    /// Nack the data transaction with this index (polls not counted).
    pub nack_at: Option<usize>,
    data_transactions: usize,
    pub log: Vec<Record>,
}

impl MockBus {
    pub fn new(chip: Chip, chip_select: u8) -> Self {
        let profile = chip.profile();
        Self {
            profile,
            chip_select_bits: profile.chip_select_bits(chip_select),
            memory: vec![0; profile.size as usize],
            pointer: 0,
            busy_polls: 0,
            busy_left: 0,
            stuck: false,
            nack_at: None,
            data_transactions: 0,
            log: Vec::new(),
        }
    }

    /// Transactions that moved data, in order.
    pub fn data_log(&self) -> Vec<&Record> {
        self.log.iter().filter(|record| !record.is_poll()).collect()
    }

    pub fn polls(&self) -> usize {
        self.log.iter().filter(|record| record.is_poll()).count()
    }

    /// Block number encoded in `address`, or `None` if this chip does not answer.
    fn decode(&self, address: u8) -> Option<u32> {
        let block_mask = (self.profile.block_count - 1) << self.profile.block_shift;
        if (address & !block_mask) != (BASE_ADDRESS | self.chip_select_bits) {
            return None;
        }
        Some(u32::from((address & block_mask) >> self.profile.block_shift))
    }

    fn page_write(&mut self, start: u32, data: &[u8]) {
        let page = u32::from(self.profile.page_size);
        let page_start = start & !(page - 1);
        let mut offset = start - page_start;
        for &byte in data {
            self.memory[(page_start + offset) as usize] = byte;
            offset = (offset + 1) % page;
        }
        self.pointer = page_start + offset;
    }

    fn sequential_read(&mut self, buffer: &mut [u8]) {
        for byte in buffer {
            *byte = self.memory[self.pointer as usize];
            self.pointer = (self.pointer + 1) % self.profile.size;
        }
    }

    fn run(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Error> {
        let mut record = Record {
            address,
            written: Vec::new(),
            read: 0,
        };
        for operation in operations.iter() {
            match operation {
                Operation::Write(bytes) => record.written.extend_from_slice(bytes),
                Operation::Read(buffer) => record.read += buffer.len(),
            }
        }
        let is_poll = record.is_poll();
        self.log.push(record);

        let block = self.decode(address).ok_or(Error::Bus)?;
        if is_poll {
            if self.stuck {
                return Err(Error::Bus);
            }
            if self.busy_left > 0 {
                self.busy_left -= 1;
                return Err(Error::Bus);
            }
            return Ok(());
        }
        if self.busy_left > 0 {
            // Chip ignores traffic during its write cycle.
            return Err(Error::Bus);
        }
        let index = self.data_transactions;
        self.data_transactions += 1;
        if self.nack_at == Some(index) {
            return Err(Error::Bus);
        }

        let width = usize::from(self.profile.address_width);
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    let (word, data) = bytes.split_at(width);
                    let word = word.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
                    let start = (block << (8 * width)) | word;
                    self.pointer = start;
                    if !data.is_empty() {
                        self.page_write(start, data);
                        self.busy_left = self.busy_polls;
                    }
                }
                Operation::Read(buffer) => self.sequential_read(buffer),
            }
        }
        Ok(())
    }
}

impl Bus for MockBus {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Error> {
        self.run(address, operations)
    }
}

impl AsyncBus for MockBus {
    async fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Error> {
        self.run(address, operations)
    }
}
