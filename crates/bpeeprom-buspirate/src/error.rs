//! Error types for bridge-mode operations

use bpeeprom_core::address::MemoryAddress;
use bpeeprom_core::Error as CoreError;
use thiserror::Error;

/// Bridge-mode errors
#[derive(Debug, Error)]
pub enum BusPirateError {
    /// The bridge signature never showed up within the retry budget
    #[error("Failed to enter binary bridge mode after {attempts} attempt(s)")]
    ModeEntry {
        /// Resets that were sent
        attempts: u32,
    },

    /// The adapter's self-test did not pass
    #[error("Self-test reported {errors} error(s)")]
    SelfTest {
        /// Error count reported by the adapter
        errors: u8,
    },

    /// Input is larger than the device, nothing was sent
    #[error("Source of {len} bytes exceeds device capacity of {capacity} bytes")]
    SourceTooLarge {
        /// Input length
        len: usize,
        /// Device capacity
        capacity: usize,
    },

    /// A planned page was refused before transmission
    #[error("Page {chunk} rejected: {source}")]
    PageBoundary {
        /// Index of the chunk in the write plan
        chunk: usize,
        /// Why the page was refused
        source: CoreError,
    },

    /// The write ran off the end of the device
    #[error("Address space exhausted: {committed} byte(s) written, {dropped} byte(s) dropped")]
    AddressSpaceExhausted {
        /// Bytes committed before the end of the device
        committed: usize,
        /// Bytes that had no address left
        dropped: usize,
    },

    /// A page write was refused or failed on the channel; the batch was aborted
    #[error("Page {chunk} at {address} failed after {committed} committed byte(s): {source}")]
    PageWrite {
        /// Index of the chunk in the write plan
        chunk: usize,
        /// Start address of the failed page
        address: MemoryAddress,
        /// Bytes committed by earlier pages
        committed: usize,
        /// Refused byte or channel failure
        source: CoreError,
    },

    /// A bulk read failed on the channel
    #[error("Read of {len} byte(s) at {address} failed: {source}")]
    Read {
        /// Start address of the read
        address: MemoryAddress,
        /// Requested length
        len: usize,
        /// Channel failure
        source: CoreError,
    },

    /// Adapter answered something unexpected
    #[error("Unexpected response 0x{response:02X} to command 0x{command:02X}")]
    UnexpectedResponse {
        /// Command byte sent
        command: u8,
        /// Byte received
        response: u8,
    },

    /// Protocol-level failure
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Serial port error
    #[error("Serial port error: {0}")]
    SerialError(#[from] serialport::Error),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl BusPirateError {
    /// True when the channel stopped delivering bytes mid-operation
    ///
    /// The session is desynchronized afterwards and must be re-established.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Core(CoreError::Timeout { .. })
                | Self::PageWrite {
                    source: CoreError::Timeout { .. },
                    ..
                }
                | Self::Read {
                    source: CoreError::Timeout { .. },
                    ..
                }
        )
    }
}

/// Result type for bridge-mode operations
pub type Result<T> = core::result::Result<T, BusPirateError>;
