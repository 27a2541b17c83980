//! Splits a byte run into page-bounded write chunks.

use core::ops::Range;

/// One page-bounded piece of a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Logical address of the first byte.
    pub address: u32,
    /// Slice of the caller's buffer carried by this chunk.
    pub span: Range<usize>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.span.len()
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }
}

/// Iterator over the chunks of `len` bytes written from `address`.
///
/// The first chunk ends at the next page boundary, interior chunks are full
/// pages and the last one ends with the run.
#[derive(Debug, Clone)]
pub struct PageChunks {
    page_size: u32,
    address: u32,
    offset: usize,
    len: usize,
}

impl PageChunks {
    /// `page_size` must be a power of two.
    pub fn new(page_size: u32, address: u32, len: usize) -> Self {
        debug_assert!(page_size.is_power_of_two());
        Self {
            page_size,
            address,
            offset: 0,
            len,
        }
    }
}

impl Iterator for PageChunks {
    type Item = Chunk;

    #[allow(clippy::cast_possible_truncation)] // a chunk never exceeds one page
    fn next(&mut self) -> Option<Chunk> {
        let remaining = self.len - self.offset;
        if remaining == 0 {
            return None;
        }
        let to_boundary = (self.page_size - (self.address & (self.page_size - 1))) as usize;
        let take = to_boundary.min(remaining);
        let chunk = Chunk {
            address: self.address,
            span: self.offset..self.offset + take,
        };
        self.offset += take;
        self.address += take as u32;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.offset;
        if remaining == 0 {
            return (0, Some(0));
        }
        let page = self.page_size as usize;
        let lead = (self.address & (self.page_size - 1)) as usize;
        let count = (lead + remaining).div_ceil(page);
        (count, Some(count))
    }
}

impl ExactSizeIterator for PageChunks {}
