//! bpeeprom-buspirate - Binary bridge-mode driver
//!
//! This crate drives a serial bus bridge (a Bus Pirate style adapter) in its
//! raw binary mode to read and write a 24xx512-style EEPROM over the
//! two-wire bus.
//!
//! # Protocol Overview
//!
//! After reset the adapter runs a text terminal. Sending `0x00` repeatedly
//! switches it to raw bridge mode (answered by `BBIO1`), from which `0x02`
//! selects the two-wire sub-mode. In that mode every bus primitive is a
//! one-byte command: start, stop, write, read, ACK and NACK. The host has
//! to order them exactly as the EEPROM expects and pace page writes
//! against the device's internal write cycle.
//!
//! # Example
//!
//! ```no_run
//! use bpeeprom_buspirate::{open, Config, SerialTransport};
//! use bpeeprom_core::address::MemoryAddress;
//!
//! let config = Config::default();
//! let transport = SerialTransport::open("/dev/ttyUSB0", Some(115200), config.timing.io_timeout())?;
//! let mut session = open(transport, config)?;
//!
//! let report = session.write_pages(b"hello", MemoryAddress::new(0x00, 0x10))?;
//! assert!(report.is_complete());
//!
//! let data = session.read_bytes(MemoryAddress::new(0x00, 0x10), 5)?;
//! assert_eq!(data, b"hello");
//!
//! session.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod encoder;
pub mod error;
pub mod progress;
pub mod reader;
pub mod session;
pub mod transport;
pub mod writer;

// Re-exports
pub use config::{Config, Timing};
pub use encoder::TransactionEncoder;
pub use error::{BusPirateError, Result};
pub use progress::{NoProgress, TransferProgress};
pub use reader::BulkReader;
pub use session::{open, BridgeSession, BridgeEntered, BusModeSelected, Closed, Idle, Ready};
pub use transport::SerialTransport;
pub use writer::{PageWriter, RejectedPage, WriteReport};

