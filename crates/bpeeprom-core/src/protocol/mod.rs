//! Bus bridge command set and EEPROM device constants
//!
//! The adapter speaks two command sets: the raw bridge level used right after
//! reset, and the two-wire sub-mode selected from it. Both are closed
//! enumerations with an exhaustive opcode mapping.

pub mod control;
pub mod opcodes;

pub use control::{ControlByte, Direction, EEPROM_CAPACITY, FAMILY_ADDRESS};
pub use opcodes::{BridgeCommand, BusCommand, Peripherals, BRIDGE_SIGNATURE, BUS_MODE_SIGNATURE};
