//! bpeeprom-dummy - In-memory bus bridge emulator for testing
//!
//! This crate provides an emulated bus bridge with a 24xx512 EEPROM on its
//! two-wire bus. It speaks the same binary bridging protocol as the real
//! adapter, so the whole driver stack can be exercised without hardware.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
mod eeprom;
#[cfg(feature = "alloc")]
mod pirate;

#[cfg(feature = "alloc")]
pub use eeprom::{CommittedWrite, Eeprom};
#[cfg(feature = "alloc")]
pub use pirate::{EmulatedPirate, EmulatorConfig};
