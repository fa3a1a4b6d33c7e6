//! Page-bounded writes
//!
//! Input is split by [`PagePlan`] into pages that never cross a 256-byte
//! row. Each page goes out as one transaction; the device then spends its
//! internal write cycle busy without any ready/busy signal on the bus, so
//! the writer sleeps for the configured settle time before the next page.

use bpeeprom_core::address::MemoryAddress;
use bpeeprom_core::page::{Page, PagePlan};
use bpeeprom_core::protocol::EEPROM_CAPACITY;
use bpeeprom_core::transaction::{Primitive, Step, Transaction};
use bpeeprom_core::transport::Transport;
use bpeeprom_core::Error as CoreError;

use crate::config::{pause, Timing};
use crate::encoder::TransactionEncoder;
use crate::error::{BusPirateError, Result};
use crate::progress::{NoProgress, TransferProgress};

/// A planned page that was refused instead of transmitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectedPage {
    /// Index of the chunk in the write plan
    pub chunk: usize,
    /// Why it was refused
    pub reason: CoreError,
}

/// Outcome of a multi-page write
///
/// Partial success is a normal outcome: pages may be rejected and the
/// address space may run out before the input does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    /// First address of the write
    pub start: MemoryAddress,
    /// Bytes the caller asked to write
    pub requested: usize,
    /// Bytes committed to the device
    pub committed: usize,
    /// Page transactions issued
    pub pages: usize,
    /// Pages refused before transmission
    pub rejected: Vec<RejectedPage>,
    /// Bytes left over when the address space ran out
    pub dropped: usize,
}

impl WriteReport {
    fn new(start: MemoryAddress, requested: usize) -> Self {
        Self {
            start,
            requested,
            committed: 0,
            pages: 0,
            rejected: Vec::new(),
            dropped: 0,
        }
    }

    /// Every requested byte was committed
    pub fn is_complete(&self) -> bool {
        self.committed == self.requested
    }

    /// Turn any partial outcome into an error, else return the byte count
    pub fn into_result(self) -> Result<usize> {
        if let Some(rejected) = self.rejected.first() {
            return Err(BusPirateError::PageBoundary {
                chunk: rejected.chunk,
                source: rejected.reason,
            });
        }
        if self.dropped > 0 {
            return Err(BusPirateError::AddressSpaceExhausted {
                committed: self.committed,
                dropped: self.dropped,
            });
        }
        Ok(self.committed)
    }
}

/// Writes buffers page by page
pub struct PageWriter<'a, T: Transport + ?Sized> {
    encoder: TransactionEncoder<'a, T>,
    timing: &'a Timing,
}

impl<'a, T: Transport + ?Sized> PageWriter<'a, T> {
    /// Create a writer over a borrowed channel
    pub fn new(transport: &'a mut T, timing: &'a Timing) -> Self {
        Self {
            encoder: TransactionEncoder::new(transport, timing),
            timing,
        }
    }

    /// Write `data` starting at `start`
    pub fn write_pages(&mut self, data: &[u8], start: MemoryAddress) -> Result<WriteReport> {
        self.write_pages_with_progress(data, start, &mut NoProgress)
    }

    /// Write `data` starting at `start`, reporting committed bytes
    ///
    /// Fails before any bus traffic with [`BusPirateError::SourceTooLarge`]
    /// if `data` is larger than the device. Otherwise behaves like
    /// [`write_plan`](Self::write_plan) over the row-bounded pages of `data`.
    pub fn write_pages_with_progress<P: TransferProgress + ?Sized>(
        &mut self,
        data: &[u8],
        start: MemoryAddress,
        progress: &mut P,
    ) -> Result<WriteReport> {
        if data.len() > EEPROM_CAPACITY {
            return Err(BusPirateError::SourceTooLarge {
                len: data.len(),
                capacity: EEPROM_CAPACITY,
            });
        }

        self.write_plan(start, data.len(), PagePlan::new(start, data), progress)
    }

    /// Write a sequence of planned pages covering `requested` bytes
    ///
    /// Rejected pages are skipped and recorded; running out of address
    /// space stops the write and records the dropped byte count. A page the
    /// target refuses, or a channel failure, aborts the batch with
    /// [`BusPirateError::PageWrite`], which names the failed page so the
    /// write can be resumed by hand.
    pub fn write_plan<'d, I, P>(
        &mut self,
        start: MemoryAddress,
        requested: usize,
        plan: I,
        progress: &mut P,
    ) -> Result<WriteReport>
    where
        I: IntoIterator<Item = core::result::Result<Page<'d>, CoreError>>,
        P: TransferProgress + ?Sized,
    {
        let mut report = WriteReport::new(start, requested);
        progress.started(requested);

        for (chunk, planned) in plan.into_iter().enumerate() {
            let page = match planned {
                Ok(page) => page,
                Err(CoreError::AddressSpaceExhausted { dropped }) => {
                    log::warn!(
                        "Address space exhausted after {} byte(s), dropping the remaining {}",
                        report.committed,
                        dropped
                    );
                    report.dropped = dropped;
                    break;
                }
                Err(reason) => {
                    log::warn!("Skipping page {}: {}", chunk, reason);
                    report.rejected.push(RejectedPage { chunk, reason });
                    continue;
                }
            };

            if let Err(source) = self.write_page(&page) {
                progress.finished(report.committed);
                return Err(BusPirateError::PageWrite {
                    chunk,
                    address: page.start(),
                    committed: report.committed,
                    source,
                });
            }

            report.committed += page.len();
            report.pages += 1;
            progress.advanced(report.committed);
        }

        progress.finished(report.committed);
        Ok(report)
    }

    /// Write a single page and wait out its write cycle
    ///
    /// Every primitive's answer is consumed before the next one goes out.
    /// If the target refuses a byte the bus is released with a STOP and the
    /// page counts as not written.
    pub fn write_page(&mut self, page: &Page<'_>) -> core::result::Result<(), CoreError> {
        let tx = Transaction::page_write(page);
        tx.validate()?;
        log::debug!("Writing {} byte(s) at {}", page.len(), page.start());

        let mut in_payload = false;
        for step in tx.steps() {
            match *step {
                Step::Drain => {
                    self.encoder.drain()?;
                    in_payload = true;
                }
                Step::Bus(primitive) => {
                    self.encoder.emit(primitive)?;
                    if let Err(e) = self.encoder.acknowledge(primitive) {
                        if matches!(e, CoreError::WriteNacked { .. }) {
                            self.release_bus();
                        }
                        return Err(e);
                    }
                    if in_payload && matches!(primitive, Primitive::Write(_)) {
                        pause(self.timing.byte_delay());
                    }
                }
            }
        }

        pause(self.timing.page_settle());
        Ok(())
    }

    fn release_bus(&mut self) {
        let stopped = self
            .encoder
            .emit(Primitive::Stop)
            .and_then(|()| self.encoder.acknowledge(Primitive::Stop));
        if let Err(e) = stopped {
            log::warn!("Failed to release the bus: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bpeeprom_dummy::EmulatedPirate;

    fn ready_pirate() -> EmulatedPirate {
        let mut pirate = EmulatedPirate::new_default();
        pirate.write(&[0x00, 0x02, 0x4C]).unwrap();
        let mut banner = [0u8; 10];
        pirate.read(&mut banner).unwrap();
        pirate.clear_log();
        pirate
    }

    #[test]
    fn test_rejected_page_is_skipped() {
        let mut pirate = ready_pirate();
        let timing = Timing::immediate();
        let straddling = [0x33u8; 32];
        let plan = vec![
            Page::new(MemoryAddress::new(0x00, 0x00), &[0x11, 0x22]),
            Page::new(MemoryAddress::new(0x00, 0xF0), &straddling),
            Page::new(MemoryAddress::new(0x01, 0x00), &[0x44]),
        ];

        let report = PageWriter::new(&mut pirate, &timing)
            .write_plan(MemoryAddress::ZERO, 35, plan, &mut NoProgress)
            .unwrap();
        assert_eq!(report.pages, 2);
        assert_eq!(report.committed, 3);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].chunk, 1);
        assert!(!report.is_complete());

        let memory = pirate.eeprom().memory();
        assert_eq!(&memory[..2], &[0x11, 0x22]);
        assert!(memory[0xF0..0x100].iter().all(|&b| b == 0xFF));
        assert_eq!(memory[0x100], 0x44);
        assert_eq!(pirate.eeprom().commits().len(), 2);

        assert!(matches!(
            report.into_result(),
            Err(BusPirateError::PageBoundary {
                chunk: 1,
                source: CoreError::PageCrossesRow { len: 32, .. },
            })
        ));
    }
}
