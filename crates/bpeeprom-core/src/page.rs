//! Page-write planning
//!
//! A page write is buffered inside the device and committed in one internal
//! write cycle. The device's page pointer wraps inside the current row, so a
//! page that runs past the end of a row would silently overwrite the start
//! of that row. [`Page::new`] refuses to build such a page and [`PagePlan`]
//! never asks it to.

use crate::address::MemoryAddress;
use crate::error::{Error, Result};

/// Largest page write the device buffers
pub const MAX_PAGE_SIZE: usize = 128;

/// Bytes for one page-write transaction, tagged with their start address
///
/// Invariant: `1 <= len <= 128` and `start.low + len <= 256`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page<'a> {
    start: MemoryAddress,
    data: &'a [u8],
}

impl<'a> Page<'a> {
    /// Build a page, rejecting any that would wrap inside a row
    pub fn new(start: MemoryAddress, data: &'a [u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::PageEmpty);
        }
        if data.len() > MAX_PAGE_SIZE {
            return Err(Error::PageTooLong { len: data.len() });
        }
        if data.len() > start.row_remaining() {
            return Err(Error::PageCrossesRow {
                start,
                len: data.len(),
            });
        }
        Ok(Self { start, data })
    }

    /// First address written
    pub fn start(&self) -> MemoryAddress {
        self.start
    }

    /// Payload bytes
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Payload length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a constructed page
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Splits a buffer into row-bounded pages starting at a given address
///
/// Each chunk is at most [`MAX_PAGE_SIZE`] bytes and ends no later than the
/// end of its row. Once the cursor leaves the address space the iterator
/// yields a single [`Error::AddressSpaceExhausted`] carrying the number of
/// bytes left over, then stops.
#[derive(Clone, Debug)]
pub struct PagePlan<'a> {
    cursor: Option<MemoryAddress>,
    remaining: &'a [u8],
    page_size: usize,
}

impl<'a> PagePlan<'a> {
    /// Plan pages of the maximum size
    pub fn new(start: MemoryAddress, data: &'a [u8]) -> Self {
        Self::with_page_size(start, data, MAX_PAGE_SIZE)
    }

    /// Plan pages no larger than `page_size` (clamped to 1..=128)
    fn with_page_size(start: MemoryAddress, data: &'a [u8], page_size: usize) -> Self {
        Self {
            cursor: Some(start),
            remaining: data,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

impl<'a> Iterator for PagePlan<'a> {
    type Item = Result<Page<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }

        let Some(cursor) = self.cursor else {
            let dropped = self.remaining.len();
            self.remaining = &[];
            return Some(Err(Error::AddressSpaceExhausted { dropped }));
        };

        let len = self
            .page_size
            .min(cursor.row_remaining())
            .min(self.remaining.len());
        let (chunk, rest) = self.remaining.split_at(len);
        self.remaining = rest;
        self.cursor = cursor.advance(len);

        Some(Page::new(cursor, chunk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts_and_lens(plan: PagePlan<'_>) -> ([(u8, u8, usize); 8], usize) {
        let mut out = [(0u8, 0u8, 0usize); 8];
        let mut n = 0;
        for page in plan {
            let page = page.unwrap();
            out[n] = (page.start().high, page.start().low, page.len());
            n += 1;
        }
        (out, n)
    }

    #[test]
    fn test_page_rejects_row_crossing() {
        let data = [0u8; 2];
        let start = MemoryAddress::new(0x00, 0xFF);
        assert_eq!(
            Page::new(start, &data),
            Err(Error::PageCrossesRow { start, len: 2 })
        );
        assert!(Page::new(MemoryAddress::new(0x00, 0xFE), &data).is_ok());
    }

    #[test]
    fn test_page_rejects_bad_lengths() {
        assert_eq!(Page::new(MemoryAddress::ZERO, &[]), Err(Error::PageEmpty));
        let big = [0u8; 129];
        assert_eq!(
            Page::new(MemoryAddress::ZERO, &big),
            Err(Error::PageTooLong { len: 129 })
        );
    }

    #[test]
    fn test_plan_splits_at_row_end() {
        let data = [0xAAu8; 2];
        let (pages, n) = starts_and_lens(PagePlan::new(MemoryAddress::new(0x00, 0xFF), &data));
        assert_eq!(n, 2);
        assert_eq!(pages[0], (0x00, 0xFF, 1));
        assert_eq!(pages[1], (0x01, 0x00, 1));
    }

    #[test]
    fn test_plan_full_rows() {
        let data = [0u8; 600];
        let (pages, n) = starts_and_lens(PagePlan::new(MemoryAddress::new(0x02, 0x40), &data));
        assert_eq!(n, 6);
        assert_eq!(pages[0], (0x02, 0x40, 128));
        assert_eq!(pages[1], (0x02, 0xC0, 64));
        assert_eq!(pages[2], (0x03, 0x00, 128));
        assert_eq!(pages[3], (0x03, 0x80, 128));
        assert_eq!(pages[4], (0x04, 0x00, 128));
        assert_eq!(pages[5], (0x04, 0x80, 24));
    }

    #[test]
    fn test_plan_every_page_fits_its_row() {
        let data = [0u8; 1000];
        for low in [0u8, 1, 63, 127, 128, 200, 255] {
            for page in PagePlan::new(MemoryAddress::new(0x10, low), &data) {
                let page = page.unwrap();
                assert!(page.start().low as usize + page.len() <= 256);
                assert!(page.len() <= MAX_PAGE_SIZE);
            }
        }
    }

    #[test]
    fn test_plan_reports_exhaustion_once() {
        let data = [0u8; 300];
        let mut plan = PagePlan::new(MemoryAddress::new(0xFF, 0x00), &data);
        assert_eq!(plan.next().unwrap().unwrap().len(), 128);
        assert_eq!(plan.next().unwrap().unwrap().len(), 128);
        assert_eq!(
            plan.next().unwrap(),
            Err(Error::AddressSpaceExhausted { dropped: 44 })
        );
        assert!(plan.next().is_none());
    }

    #[test]
    fn test_plan_exact_fit_is_not_exhaustion() {
        let data = [0u8; 256];
        let plan = PagePlan::new(MemoryAddress::new(0xFF, 0x00), &data);
        assert!(plan.map(|p| p.unwrap()).all(|p| p.len() == 128));
    }

    #[test]
    fn test_plan_small_page_size() {
        let data = [0u8; 40];
        let (pages, n) = starts_and_lens(PagePlan::with_page_size(
            MemoryAddress::new(0x00, 0xF0),
            &data,
            16,
        ));
        assert_eq!(n, 3);
        assert_eq!(pages[0], (0x00, 0xF0, 16));
        assert_eq!(pages[1], (0x01, 0x00, 16));
        assert_eq!(pages[2], (0x01, 0x10, 8));
    }
}
