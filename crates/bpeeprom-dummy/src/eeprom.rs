//! Behavioral model of a 24xx512 on the two-wire bus

use alloc::vec;
use alloc::vec::Vec;

use bpeeprom_core::address::{ADDRESS_SPACE, ROW_SIZE};
use bpeeprom_core::protocol::{ControlByte, Direction};

/// Bus state of the target between START and STOP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BusState {
    /// Not addressed; ignores everything but START
    Idle,
    /// START seen, waiting for the control byte
    AwaitControl,
    /// Write-addressed, waiting for the high address byte
    AwaitHigh,
    /// High byte latched, waiting for the low address byte
    AwaitLow { high: u8 },
    /// Pointer set, buffering data bytes until STOP
    Writing,
    /// Read-addressed, shifting out bytes
    Reading,
}

/// A page write that reached the memory array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedWrite {
    /// Address of the first buffered byte
    pub start: u16,
    /// Bytes committed
    pub len: usize,
}

/// Emulated EEPROM
///
/// Writes are buffered and land in the array on STOP. Like the real part,
/// the write pointer wraps inside the current 256-byte row while the read
/// pointer runs on through the whole array and wraps at its end.
pub struct Eeprom {
    memory: Vec<u8>,
    pointer: u16,
    state: BusState,
    pending: Vec<(u16, u8)>,
    pending_start: u16,
    commits: Vec<CommittedWrite>,
}

impl Eeprom {
    /// Blank (all 0xFF) device
    pub fn new() -> Self {
        Self {
            memory: vec![0xFF; ADDRESS_SPACE],
            pointer: 0,
            state: BusState::Idle,
            pending: Vec::new(),
            pending_start: 0,
            commits: Vec::new(),
        }
    }

    /// Memory array contents
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Mutable memory array, for seeding test patterns
    pub fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    /// Current address pointer
    pub fn pointer(&self) -> u16 {
        self.pointer
    }

    /// Page writes committed so far, oldest first
    pub fn commits(&self) -> &[CommittedWrite] {
        &self.commits
    }

    /// START or repeated START
    pub fn start(&mut self) {
        if !self.pending.is_empty() {
            log::warn!(
                "eeprom: repeated start discards {} uncommitted byte(s)",
                self.pending.len()
            );
            self.pending.clear();
        }
        self.state = BusState::AwaitControl;
    }

    /// STOP; commits buffered write data
    pub fn stop(&mut self) {
        if self.state == BusState::Writing && !self.pending.is_empty() {
            for &(addr, byte) in &self.pending {
                self.memory[addr as usize] = byte;
            }
            log::trace!(
                "eeprom: committed {} byte(s) at 0x{:04X}",
                self.pending.len(),
                self.pending_start
            );
            self.commits.push(CommittedWrite {
                start: self.pending_start,
                len: self.pending.len(),
            });
            self.pending.clear();
        }
        self.state = BusState::Idle;
    }

    /// Byte clocked in from the controller; returns true if acknowledged
    pub fn write(&mut self, byte: u8) -> bool {
        match self.state {
            BusState::AwaitControl => match ControlByte::recognize(byte) {
                Some(control) => {
                    self.state = match control.direction() {
                        Direction::Write => BusState::AwaitHigh,
                        Direction::Read => BusState::Reading,
                    };
                    true
                }
                None => {
                    self.state = BusState::Idle;
                    false
                }
            },
            BusState::AwaitHigh => {
                self.state = BusState::AwaitLow { high: byte };
                true
            }
            BusState::AwaitLow { high } => {
                self.pointer = u16::from_be_bytes([high, byte]);
                self.pending_start = self.pointer;
                self.state = BusState::Writing;
                true
            }
            BusState::Writing => {
                self.pending.push((self.pointer, byte));
                let [high, low] = self.pointer.to_be_bytes();
                let low = ((low as usize + 1) % ROW_SIZE) as u8;
                self.pointer = u16::from_be_bytes([high, low]);
                true
            }
            BusState::Idle | BusState::Reading => false,
        }
    }

    /// Byte clocked out to the controller
    ///
    /// An unaddressed device leaves the bus released, which reads as 0xFF.
    pub fn read(&mut self) -> u8 {
        if self.state != BusState::Reading {
            return 0xFF;
        }
        let byte = self.memory[self.pointer as usize];
        self.pointer = self.pointer.wrapping_add(1);
        byte
    }
}

impl Default for Eeprom {
    fn default() -> Self {
        Self::new()
    }
}
