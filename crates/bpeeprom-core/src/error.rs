//! Error types for bpeeprom-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

use crate::address::MemoryAddress;

/// Reasons a primitive sequence does not form a well-framed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingFault {
    /// The sequence is empty
    Empty,
    /// A bus primitive was issued before any START
    MissingStart,
    /// STOP appeared before the last position, or START never got its STOP
    Unterminated,
    /// A READ_ACK was followed by something other than another read
    AckNotFollowedByRead,
    /// A read run did not end in exactly one READ_NACK
    MissingNack,
    /// A WRITE was issued after a READ_NACK without a new START
    WriteAfterNack,
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Page errors
    /// A page must carry at least one byte
    PageEmpty,
    /// A page carries more bytes than one page write accepts
    PageTooLong {
        /// Requested length
        len: usize,
    },
    /// A page would cross a 256-byte row and wrap inside the device
    PageCrossesRow {
        /// First address of the page
        start: MemoryAddress,
        /// Requested length
        len: usize,
    },

    // Address errors
    /// Linear offset is outside the 16-bit address space
    AddressOutOfRange {
        /// Offending offset
        offset: u32,
    },
    /// Address text is not 1-4 hexadecimal digits
    InvalidAddress,
    /// The address cursor would move past the last byte of the device
    AddressSpaceExhausted {
        /// Bytes that could not be placed
        dropped: usize,
    },

    // Transaction errors
    /// Primitive sequence is not a well-framed transaction
    Framing(FramingFault),

    // Verify errors
    /// Buffers to compare differ in length
    LengthMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },
    /// Buffers differ at `index`
    DataMismatch {
        /// Offset of the first difference
        index: usize,
        /// Expected byte
        expected: u8,
        /// Byte that was found
        actual: u8,
    },

    // Bus errors
    /// The target did not acknowledge a written byte
    WriteNacked {
        /// Byte that was refused
        byte: u8,
    },

    // Channel errors
    /// The channel did not deliver the expected bytes in time
    Timeout {
        /// Bytes the caller waited for
        expected: usize,
    },
    /// Read from the channel failed
    ReadError,
    /// Write to the channel failed
    WriteError,
    /// I/O error occurred
    IoError,
}

impl fmt::Display for FramingFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty transaction"),
            Self::MissingStart => write!(f, "primitive issued before START"),
            Self::Unterminated => write!(f, "START not matched by a final STOP"),
            Self::AckNotFollowedByRead => write!(f, "READ_ACK must be followed by another read"),
            Self::MissingNack => write!(f, "read run must end with exactly one READ_NACK"),
            Self::WriteAfterNack => write!(f, "WRITE after READ_NACK without repeated START"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageEmpty => write!(f, "page is empty"),
            Self::PageTooLong { len } => write!(f, "page of {} bytes exceeds 128 bytes", len),
            Self::PageCrossesRow { start, len } => write!(
                f,
                "page of {} bytes at {} crosses a 256-byte row boundary",
                len, start
            ),
            Self::AddressOutOfRange { offset } => {
                write!(f, "offset 0x{:X} is outside the 16-bit address space", offset)
            }
            Self::InvalidAddress => write!(f, "address must be 1-4 hexadecimal digits"),
            Self::AddressSpaceExhausted { dropped } => write!(
                f,
                "address space exhausted, {} byte(s) not written",
                dropped
            ),
            Self::Framing(fault) => write!(f, "malformed transaction: {}", fault),
            Self::LengthMismatch { expected, actual } => write!(
                f,
                "length mismatch: expected {} bytes, got {}",
                expected, actual
            ),
            Self::DataMismatch {
                index,
                expected,
                actual,
            } => write!(
                f,
                "mismatch at 0x{:04X}: expected 0x{:02X}, got 0x{:02X}",
                index, expected, actual
            ),
            Self::WriteNacked { byte } => {
                write!(f, "target did not acknowledge byte 0x{:02X}", byte)
            }
            Self::Timeout { expected } => {
                write!(f, "channel timed out waiting for {} byte(s)", expected)
            }
            Self::ReadError => write!(f, "read operation failed"),
            Self::WriteError => write!(f, "write operation failed"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
