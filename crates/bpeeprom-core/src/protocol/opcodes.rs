//! Bus bridge opcodes
//!
//! Values are bit-exact with the adapter's binary bridging mode.

use bitflags::bitflags;

/// Answer to [`BridgeCommand::ResetToBridge`] once bridge mode is active
pub const BRIDGE_SIGNATURE: &[u8; 5] = b"BBIO1";
/// First bytes announced after [`BridgeCommand::SelectTwoWire`]
pub const BUS_MODE_SIGNATURE: &[u8; 4] = b"I2C1";
/// Generic "command accepted" answer in two-wire mode
pub const RESPONSE_OK: u8 = 0x01;
/// Status byte returned for an acknowledged written byte
pub const WRITE_ACKED: u8 = 0x00;
/// Status byte returned for a byte the target refused
pub const WRITE_NACKED: u8 = 0x01;

/// Commands accepted in raw bridge mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BridgeCommand {
    /// Enter (or re-enter) raw bridge mode, answered by `BBIO1`
    ResetToBridge,
    /// Select binary SPI mode
    SelectSpi,
    /// Select binary two-wire (I2C) mode
    SelectTwoWire,
    /// Select binary UART mode
    SelectUart,
    /// Select binary one-wire mode
    SelectOneWire,
    /// Select binary raw-wire mode
    SelectRawWire,
    /// Reset the adapter back to its text terminal
    DeviceReset,
    /// Run the short self-test
    SelfTest,
}

impl BridgeCommand {
    /// Every bridge command, in opcode order
    pub const ALL: [BridgeCommand; 8] = [
        Self::ResetToBridge,
        Self::SelectSpi,
        Self::SelectTwoWire,
        Self::SelectUart,
        Self::SelectOneWire,
        Self::SelectRawWire,
        Self::DeviceReset,
        Self::SelfTest,
    ];

    /// Opcode byte for this command
    pub const fn opcode(self) -> u8 {
        match self {
            Self::ResetToBridge => 0x00,
            Self::SelectSpi => 0x01,
            Self::SelectTwoWire => 0x02,
            Self::SelectUart => 0x03,
            Self::SelectOneWire => 0x04,
            Self::SelectRawWire => 0x05,
            Self::DeviceReset => 0x0F,
            Self::SelfTest => 0x10,
        }
    }

    /// Decode an opcode byte
    pub fn decode(byte: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|cmd| cmd.opcode() == byte)
    }
}

bitflags! {
    /// Peripheral switches of the configure-peripherals command
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Peripherals: u8 {
        /// Supply power to the target
        const POWER   = 0x08;
        /// Enable the on-board pull-up resistors
        const PULLUPS = 0x04;
        /// Drive the auxiliary pin
        const AUX     = 0x02;
        /// Drive the chip-select pin
        const CS      = 0x01;
    }
}

/// Commands accepted once two-wire mode is selected
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BusCommand {
    /// Leave two-wire mode and return to raw bridge mode
    ExitToBridge,
    /// Generate a (repeated) start condition
    Start,
    /// Generate a stop condition
    Stop,
    /// Clock in one byte from the target
    ReadByte,
    /// Acknowledge the byte just read
    Ack,
    /// Refuse the byte just read, ending a sequential read
    Nack,
    /// Announce `count` (1-16) data bytes to write
    BulkWrite {
        /// Number of bytes that follow
        count: u8,
    },
    /// Set the peripheral switches
    Configure(Peripherals),
}

impl BusCommand {
    /// Announce a single data byte; the only bulk write the core issues
    pub const WRITE_ONE: Self = Self::BulkWrite { count: 1 };
    /// Power and pull-ups on, as needed for an unpowered EEPROM board
    pub const POWER_ON: Self = Self::Configure(Peripherals::POWER.union(Peripherals::PULLUPS));
    /// Every peripheral off
    pub const POWER_OFF: Self = Self::Configure(Peripherals::empty());

    /// Opcode byte for this command
    ///
    /// `BulkWrite` counts outside 1-16 are clamped.
    pub const fn opcode(self) -> u8 {
        match self {
            Self::ExitToBridge => 0x00,
            Self::Start => 0x02,
            Self::Stop => 0x03,
            Self::ReadByte => 0x04,
            Self::Ack => 0x06,
            Self::Nack => 0x07,
            Self::BulkWrite { count } => {
                let n = if count == 0 {
                    1
                } else if count > 16 {
                    16
                } else {
                    count
                };
                0x10 | (n - 1)
            }
            Self::Configure(flags) => 0x40 | flags.bits(),
        }
    }

    /// Decode an opcode byte
    pub fn decode(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::ExitToBridge),
            0x02 => Some(Self::Start),
            0x03 => Some(Self::Stop),
            0x04 => Some(Self::ReadByte),
            0x06 => Some(Self::Ack),
            0x07 => Some(Self::Nack),
            0x10..=0x1F => Some(Self::BulkWrite {
                count: (byte & 0x0F) + 1,
            }),
            0x40..=0x4F => Some(Self::Configure(Peripherals::from_bits_truncate(byte))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_opcodes_are_bit_exact() {
        let expected = [0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x0F, 0x10];
        for (cmd, op) in BridgeCommand::ALL.iter().zip(expected) {
            assert_eq!(cmd.opcode(), op);
            assert_eq!(BridgeCommand::decode(op), Some(*cmd));
        }
        assert_eq!(BridgeCommand::decode(0x06), None);
    }

    #[test]
    fn test_bus_opcodes_are_bit_exact() {
        assert_eq!(BusCommand::Start.opcode(), 0x02);
        assert_eq!(BusCommand::Stop.opcode(), 0x03);
        assert_eq!(BusCommand::ReadByte.opcode(), 0x04);
        assert_eq!(BusCommand::Ack.opcode(), 0x06);
        assert_eq!(BusCommand::Nack.opcode(), 0x07);
        assert_eq!(BusCommand::WRITE_ONE.opcode(), 0x10);
        assert_eq!(BusCommand::POWER_ON.opcode(), 0x4C);
        assert_eq!(BusCommand::POWER_OFF.opcode(), 0x40);
    }

    #[test]
    fn test_bulk_write_count() {
        assert_eq!(BusCommand::BulkWrite { count: 16 }.opcode(), 0x1F);
        assert_eq!(BusCommand::BulkWrite { count: 0 }.opcode(), 0x10);
        assert_eq!(
            BusCommand::decode(0x13),
            Some(BusCommand::BulkWrite { count: 4 })
        );
    }

    #[test]
    fn test_configure_decodes_flags() {
        assert_eq!(BusCommand::decode(0x4C), Some(BusCommand::POWER_ON));
        assert_eq!(BusCommand::decode(0x40), Some(BusCommand::POWER_OFF));
        assert_eq!(BusCommand::decode(0x05), None);
    }
}
