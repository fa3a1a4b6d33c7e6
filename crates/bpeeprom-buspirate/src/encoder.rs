//! Primitive bus operations
//!
//! The adapter consumes its command stream byte by byte and has no framing
//! of its own, so every primitive is written and flushed before the next
//! one. The encoder keeps no state between calls and never retries.

use bpeeprom_core::protocol::opcodes::WRITE_NACKED;
use bpeeprom_core::protocol::BusCommand;
use bpeeprom_core::transaction::Primitive;
use bpeeprom_core::transport::Transport;
use bpeeprom_core::{Error, Result};

use crate::config::Timing;

/// Emits primitives onto a borrowed channel
pub struct TransactionEncoder<'a, T: Transport + ?Sized> {
    transport: &'a mut T,
    drain_timeout_ms: u32,
    drain_limit: usize,
}

impl<'a, T: Transport + ?Sized> TransactionEncoder<'a, T> {
    /// Borrow `transport` for the duration of one operation
    pub fn new(transport: &'a mut T, timing: &Timing) -> Self {
        Self {
            transport,
            drain_timeout_ms: timing.drain_timeout_ms,
            drain_limit: timing.drain_limit.max(1),
        }
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        log::trace!("encoder: -> {:02X?}", bytes);
        self.transport.write(bytes)?;
        self.transport.flush()
    }

    /// Start condition
    pub fn start(&mut self) -> Result<()> {
        self.emit(Primitive::Start)
    }

    /// Write one byte
    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.emit(Primitive::Write(byte))
    }

    /// Read one byte and acknowledge it
    pub fn read_ack(&mut self) -> Result<()> {
        self.emit(Primitive::ReadAck)
    }

    /// Read one byte and refuse it
    pub fn read_nack(&mut self) -> Result<()> {
        self.emit(Primitive::ReadNack)
    }

    /// Stop condition
    pub fn stop(&mut self) -> Result<()> {
        self.emit(Primitive::Stop)
    }

    /// Emit any primitive
    pub fn emit(&mut self, primitive: Primitive) -> Result<()> {
        let (bytes, len) = primitive.encode();
        self.send(&bytes[..len])
    }

    /// Send a raw adapter command outside any bus transaction
    pub fn command(&mut self, command: BusCommand) -> Result<()> {
        self.send(&[command.opcode()])
    }

    /// Discard handshake bytes until the channel stays quiet
    ///
    /// Returns the number of bytes thrown away.
    pub fn drain(&mut self) -> Result<usize> {
        let mut buf = [0u8; 64];
        let mut discarded = 0;
        for _ in 0..self.drain_limit {
            let n = self.transport.read_nonblock(&mut buf, self.drain_timeout_ms)?;
            if n == 0 {
                break;
            }
            log::trace!("encoder: drained {:02X?}", &buf[..n]);
            discarded += n;
        }
        Ok(discarded)
    }

    /// Read exactly `buf.len()` answer bytes
    pub fn collect(&mut self, buf: &mut [u8]) -> Result<()> {
        self.transport.read(buf)?;
        log::trace!("encoder: <- {} byte(s)", buf.len());
        Ok(())
    }

    /// Consume the adapter's answer to one primitive
    ///
    /// Fails with [`Error::WriteNacked`] when the target refused a written
    /// byte, and with [`Error::Timeout`] when the answer never arrives.
    pub fn acknowledge(&mut self, primitive: Primitive) -> Result<()> {
        let mut reply = [0u8; 2];
        let reply = &mut reply[..primitive.reply_len()];
        self.collect(reply)?;
        match (primitive, &*reply) {
            (Primitive::Write(byte), [_, WRITE_NACKED]) => {
                log::debug!("encoder: 0x{:02X} not acknowledged", byte);
                Err(Error::WriteNacked { byte })
            }
            _ => Ok(()),
        }
    }
}
