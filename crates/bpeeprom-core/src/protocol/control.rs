//! Control byte and geometry of the target EEPROM family
//!
//! The first byte of every two-wire transaction names the target and the
//! transfer direction. Only the 24xx512 family at its base address is
//! supported, so both control bytes are constants.

use crate::address::ADDRESS_SPACE;

/// Seven-bit bus address of the EEPROM family with A2..A0 tied low
pub const FAMILY_ADDRESS: u8 = 0x50;
/// Device capacity in bytes
pub const EEPROM_CAPACITY: usize = ADDRESS_SPACE;

/// Transfer direction encoded in the low bit of the control byte
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Controller writes to the target
    Write,
    /// Controller reads from the target
    Read,
}

/// First byte of a two-wire transaction
///
/// Always derived from [`FAMILY_ADDRESS`] and a [`Direction`]; there is no
/// constructor taking a raw byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ControlByte(u8);

impl ControlByte {
    /// Control byte that starts a write (or address-pointer set)
    pub const WRITE: Self = Self::new(Direction::Write);
    /// Control byte that starts a read
    pub const READ: Self = Self::new(Direction::Read);

    const fn new(direction: Direction) -> Self {
        let rw = match direction {
            Direction::Write => 0,
            Direction::Read => 1,
        };
        Self((FAMILY_ADDRESS << 1) | rw)
    }

    /// The byte put on the bus
    pub const fn byte(self) -> u8 {
        self.0
    }

    /// Direction encoded in this byte
    pub const fn direction(self) -> Direction {
        if self.0 & 1 == 0 {
            Direction::Write
        } else {
            Direction::Read
        }
    }

    /// Interpret a byte seen on the bus, if it addresses this family
    pub fn recognize(byte: u8) -> Option<Self> {
        if byte >> 1 == FAMILY_ADDRESS {
            Some(Self(byte))
        } else {
            None
        }
    }
}
