//! Two-wire transaction model
//!
//! A [`Transaction`] is the ordered list of bus primitives for one
//! high-level access, plus the points at which the caller drains stray
//! handshake bytes from the channel. [`Transaction::validate`] checks the
//! framing rules every transaction must obey before it is put on the wire:
//!
//! - it opens with START and ends with the only STOP
//! - further STARTs are repeated starts inside the same frame
//! - a read run of N bytes is N-1 READ_ACK followed by one READ_NACK

use alloc::vec::Vec;

use crate::address::MemoryAddress;
use crate::error::{Error, FramingFault, Result};
use crate::page::Page;
use crate::protocol::{BusCommand, ControlByte};

/// A single bus-level operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Start (or repeated start) condition
    Start,
    /// Write one byte
    Write(u8),
    /// Read one byte and acknowledge it
    ReadAck,
    /// Read one byte and refuse it
    ReadNack,
    /// Stop condition
    Stop,
}

impl Primitive {
    /// Adapter commands that put this primitive on the bus
    ///
    /// Returns the opcodes and how many of them are meaningful. A write is
    /// the write-one announcement followed by the payload byte; a read is
    /// the read-byte command followed by ACK or NACK.
    pub fn encode(self) -> ([u8; 2], usize) {
        match self {
            Self::Start => ([BusCommand::Start.opcode(), 0], 1),
            Self::Write(byte) => ([BusCommand::WRITE_ONE.opcode(), byte], 2),
            Self::ReadAck => ([BusCommand::ReadByte.opcode(), BusCommand::Ack.opcode()], 2),
            Self::ReadNack => ([BusCommand::ReadByte.opcode(), BusCommand::Nack.opcode()], 2),
            Self::Stop => ([BusCommand::Stop.opcode(), 0], 1),
        }
    }

    /// Bytes the adapter answers this primitive with
    ///
    /// START and STOP are acknowledged with a single byte. A write answers
    /// the announcement, then the target's ACK/NACK; a read answers the
    /// data byte, then the handshake command.
    pub fn reply_len(self) -> usize {
        match self {
            Self::Start | Self::Stop => 1,
            Self::Write(_) | Self::ReadAck | Self::ReadNack => 2,
        }
    }

    fn is_read(self) -> bool {
        matches!(self, Self::ReadAck | Self::ReadNack)
    }
}

/// One step of a transaction as executed against the channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    /// Put a primitive on the bus
    Bus(Primitive),
    /// Discard whatever handshake bytes the channel has buffered
    Drain,
}

/// Ordered primitives of one framed bus access
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transaction {
    steps: Vec<Step>,
}

impl Transaction {
    /// Create an empty transaction
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Build a transaction from bare primitives, without drain points
    pub fn from_primitives<I: IntoIterator<Item = Primitive>>(primitives: I) -> Self {
        Self {
            steps: primitives.into_iter().map(Step::Bus).collect(),
        }
    }

    /// Append a primitive
    pub fn push(&mut self, primitive: Primitive) -> &mut Self {
        self.steps.push(Step::Bus(primitive));
        self
    }

    /// Append a drain point
    pub fn drain(&mut self) -> &mut Self {
        self.steps.push(Step::Drain);
        self
    }

    /// Address phase: START, write-control, high byte, low byte
    ///
    /// Leaves the frame open; a page write continues with data, a random
    /// read with a repeated start.
    pub fn address_phase(&mut self, address: MemoryAddress) -> &mut Self {
        let [high, low] = address.to_bytes();
        self.push(Primitive::Start)
            .push(Primitive::Write(ControlByte::WRITE.byte()))
            .push(Primitive::Write(high))
            .push(Primitive::Write(low))
    }

    /// Full page write: address phase, drain, every data byte, STOP
    pub fn page_write(page: &Page<'_>) -> Self {
        let mut tx = Self::new();
        tx.address_phase(page.start()).drain();
        for &byte in page.data() {
            tx.push(Primitive::Write(byte));
        }
        tx.push(Primitive::Stop);
        tx
    }

    /// Random read of `len` bytes
    ///
    /// Pointer set, drain, repeated START with the read control byte,
    /// drain, `len - 1` READ_ACK, one READ_NACK, STOP. Returns `None` for
    /// `len == 0`: nothing is put on the bus.
    pub fn random_read(address: MemoryAddress, len: usize) -> Option<Self> {
        if len == 0 {
            return None;
        }
        let mut tx = Self::new();
        tx.address_phase(address)
            .drain()
            .push(Primitive::Start)
            .push(Primitive::Write(ControlByte::READ.byte()))
            .drain();
        tx.steps.reserve(len + 1);
        for _ in 1..len {
            tx.push(Primitive::ReadAck);
        }
        tx.push(Primitive::ReadNack).push(Primitive::Stop);
        Some(tx)
    }

    /// All steps in order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Bus primitives in order, drain points skipped
    pub fn primitives(&self) -> impl Iterator<Item = Primitive> + '_ {
        self.steps.iter().filter_map(|step| match step {
            Step::Bus(p) => Some(*p),
            Step::Drain => None,
        })
    }

    /// Number of acknowledged reads
    pub fn ack_count(&self) -> usize {
        self.primitives()
            .filter(|p| *p == Primitive::ReadAck)
            .count()
    }

    /// Number of refused reads
    pub fn nack_count(&self) -> usize {
        self.primitives()
            .filter(|p| *p == Primitive::ReadNack)
            .count()
    }

    /// Number of data bytes the channel will return for this transaction
    pub fn read_len(&self) -> usize {
        self.primitives().filter(|p| p.is_read()).count()
    }

    /// Check the framing rules
    pub fn validate(&self) -> Result<()> {
        let prims: Vec<Primitive> = self.primitives().collect();
        let fault = |f| Err(Error::Framing(f));

        match (prims.first(), prims.last()) {
            (None, _) => return fault(FramingFault::Empty),
            (Some(first), _) if *first != Primitive::Start => {
                return fault(FramingFault::MissingStart)
            }
            (_, Some(last)) if *last != Primitive::Stop => {
                return fault(FramingFault::Unterminated)
            }
            _ => {}
        }

        for pair in prims.windows(2) {
            let (cur, next) = (pair[0], pair[1]);
            match cur {
                Primitive::Stop => return fault(FramingFault::Unterminated),
                Primitive::ReadAck if !next.is_read() => {
                    return fault(FramingFault::AckNotFollowedByRead)
                }
                Primitive::ReadNack if next.is_read() => return fault(FramingFault::MissingNack),
                Primitive::ReadNack if matches!(next, Primitive::Write(_)) => {
                    return fault(FramingFault::WriteAfterNack)
                }
                _ => {}
            }
        }

        Ok(())
    }
}
