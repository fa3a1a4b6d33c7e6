//! bpeeprom-core - Protocol model for two-wire EEPROM access over a bus bridge
//!
//! This crate describes everything about talking to a 24xx512-style serial
//! EEPROM through a serial bus bridge that does not need an actual serial
//! port: the opcode tables, control bytes, 16-bit memory addresses, page
//! planning, the transaction model and the read-back verifier. It is
//! designed to be `no_std` compatible.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable heap allocation for [`transaction::Transaction`]
//!
//! # Example
//!
//! ```
//! use bpeeprom_core::address::MemoryAddress;
//! use bpeeprom_core::page::PagePlan;
//!
//! let data = [0u8; 300];
//! let start = MemoryAddress::new(0x00, 0xF0);
//! let pages: Vec<_> = PagePlan::new(start, &data).collect();
//!
//! // 16 bytes up to the end of row 0, then full 128-byte pages
//! assert_eq!(pages[0].as_ref().unwrap().len(), 16);
//! assert_eq!(pages[1].as_ref().unwrap().start(), MemoryAddress::new(0x01, 0x00));
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod address;
pub mod error;
pub mod page;
pub mod protocol;
pub mod retry;
#[cfg(feature = "alloc")]
pub mod transaction;
pub mod transport;
pub mod verify;

pub use error::{Error, Result};
