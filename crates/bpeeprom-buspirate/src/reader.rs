//! Sequential reads
//!
//! A random read sets the device's address pointer with a write-mode
//! address phase, then switches to read mode with a repeated START and
//! clocks out bytes, acknowledging all but the last.
//!
//! The adapter answers every read primitive with two bytes: the data byte,
//! then the answer to the ACK/NACK command. Only every other byte of the
//! answer stream is data.

use bpeeprom_core::address::MemoryAddress;
use bpeeprom_core::transaction::{Primitive, Step, Transaction};
use bpeeprom_core::transport::Transport;
use bpeeprom_core::Error as CoreError;

use crate::config::Timing;
use crate::encoder::TransactionEncoder;
use crate::error::{BusPirateError, Result};
use crate::progress::{NoProgress, TransferProgress};

/// Channel bytes produced per data byte read
const BYTES_PER_READ: usize = 2;

/// Keep the data byte of every (data, handshake) pair
pub fn deinterleave(raw: &[u8]) -> impl Iterator<Item = u8> + '_ {
    raw.chunks_exact(BYTES_PER_READ).map(|pair| pair[0])
}

/// Reads runs of bytes
pub struct BulkReader<'a, T: Transport + ?Sized> {
    encoder: TransactionEncoder<'a, T>,
    batch: usize,
}

impl<'a, T: Transport + ?Sized> BulkReader<'a, T> {
    /// Create a reader over a borrowed channel
    pub fn new(transport: &'a mut T, timing: &Timing) -> Self {
        Self {
            encoder: TransactionEncoder::new(transport, timing),
            batch: timing.read_batch.max(1),
        }
    }

    /// Read `len` bytes starting at `start`
    pub fn read_bytes(&mut self, start: MemoryAddress, len: usize) -> Result<Vec<u8>> {
        self.read_bytes_with_progress(start, len, &mut NoProgress)
    }

    /// Read `len` bytes starting at `start`, reporting received bytes
    ///
    /// A zero-length read puts nothing on the bus. Reads that would run
    /// past the end of the device are refused up front instead of letting
    /// the device's pointer wrap to address zero. A channel timeout aborts
    /// the read with [`BusPirateError::Read`]; the session is out of step
    /// with the adapter afterwards.
    pub fn read_bytes_with_progress<P: TransferProgress + ?Sized>(
        &mut self,
        start: MemoryAddress,
        len: usize,
        progress: &mut P,
    ) -> Result<Vec<u8>> {
        if len > start.remaining() {
            let last = (start.offset() as usize).saturating_add(len - 1);
            return Err(CoreError::AddressOutOfRange {
                offset: u32::try_from(last).unwrap_or(u32::MAX),
            }
            .into());
        }

        let Some(tx) = Transaction::random_read(start, len) else {
            return Ok(Vec::new());
        };
        tx.validate()?;
        log::debug!("Reading {} byte(s) at {}", len, start);

        progress.started(len);
        let mut data = Vec::with_capacity(len);
        let result = self.run(&tx, &mut data, progress);
        progress.finished(data.len());

        result.map_err(|source| BusPirateError::Read {
            address: start,
            len,
            source,
        })?;
        Ok(data)
    }

    fn run<P: TransferProgress + ?Sized>(
        &mut self,
        tx: &Transaction,
        data: &mut Vec<u8>,
        progress: &mut P,
    ) -> core::result::Result<(), CoreError> {
        let mut raw = vec![0u8; self.batch * BYTES_PER_READ];
        let mut pending = 0usize;

        for step in tx.steps() {
            match *step {
                Step::Drain => {
                    self.encoder.drain()?;
                }
                Step::Bus(primitive) => {
                    self.encoder.emit(primitive)?;
                    if matches!(primitive, Primitive::ReadAck | Primitive::ReadNack) {
                        pending += 1;
                    }
                }
            }

            // Answers are collected in batches; STOP's own answer is left
            // for the final drain.
            let last_read = matches!(step, Step::Bus(Primitive::ReadNack));
            if pending == self.batch || (last_read && pending > 0) {
                let answers = &mut raw[..pending * BYTES_PER_READ];
                self.encoder.collect(answers)?;
                data.extend(deinterleave(answers));
                pending = 0;
                progress.advanced(data.len());
            }
        }

        self.encoder.drain()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deinterleave_keeps_even_bytes() {
        let raw = [0x11, 0x01, 0x22, 0x01, 0x33, 0x01];
        assert_eq!(deinterleave(&raw).collect::<Vec<_>>(), vec![0x11, 0x22, 0x33]);
    }

    #[test]
    fn test_deinterleave_data_equal_to_handshake() {
        let raw = [0x01, 0x01, 0x00, 0x01];
        assert_eq!(deinterleave(&raw).collect::<Vec<_>>(), vec![0x01, 0x00]);
    }
}
