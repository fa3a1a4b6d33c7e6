//! 16-bit EEPROM byte addresses
//!
//! The device takes its address as two independent bytes. The low byte
//! selects a byte inside a 256-byte row; the high byte selects the row.

use core::fmt;

use crate::error::{Error, Result};

/// Bytes per row; a page write never crosses one
pub const ROW_SIZE: usize = 256;
/// Total addressable bytes
pub const ADDRESS_SPACE: usize = 65536;

/// A byte address split into row (`high`) and column (`low`)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemoryAddress {
    /// Row selector, sent first
    pub high: u8,
    /// Byte within the row
    pub low: u8,
}

impl MemoryAddress {
    /// First byte of the device
    pub const ZERO: Self = Self { high: 0, low: 0 };

    /// Create an address from its two bytes
    pub const fn new(high: u8, low: u8) -> Self {
        Self { high, low }
    }

    /// Create an address from a linear offset
    pub fn from_offset(offset: u32) -> Result<Self> {
        if offset as usize >= ADDRESS_SPACE {
            return Err(Error::AddressOutOfRange { offset });
        }
        Ok(Self {
            high: (offset >> 8) as u8,
            low: offset as u8,
        })
    }

    /// Linear offset of this address
    pub const fn offset(&self) -> u32 {
        ((self.high as u32) << 8) | self.low as u32
    }

    /// Bytes left in the current row, including this one
    pub const fn row_remaining(&self) -> usize {
        ROW_SIZE - self.low as usize
    }

    /// Bytes from this address to the end of the device, including this one
    pub const fn remaining(&self) -> usize {
        ADDRESS_SPACE - self.offset() as usize
    }

    /// Move the cursor forward by `len` bytes
    ///
    /// Returns `None` when the cursor would leave the address space. The
    /// address space is never wrapped back to zero.
    pub fn advance(&self, len: usize) -> Option<Self> {
        let next = self.offset() as usize + len;
        if next >= ADDRESS_SPACE {
            return None;
        }
        Some(Self {
            high: (next >> 8) as u8,
            low: next as u8,
        })
    }

    /// Encode as the two address bytes sent after the control byte
    pub const fn to_bytes(&self) -> [u8; 2] {
        [self.high, self.low]
    }

    /// Parse 1-4 hex digits, optionally prefixed with `0x`
    ///
    /// Four digits are read as `HHLL`, so `f8d0` is row `0xF8`, byte `0xD0`.
    pub fn parse_hex(s: &str) -> Result<Self> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.is_empty() || digits.len() > 4 {
            return Err(Error::InvalidAddress);
        }
        let offset = u32::from_str_radix(digits, 16).map_err(|_| Error::InvalidAddress)?;
        Self::from_offset(offset)
    }
}

impl fmt::Display for MemoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}{:02X}", self.high, self.low)
    }
}
