//! Emulated bus bridge in binary mode

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use bpeeprom_core::error::{Error, Result};
use bpeeprom_core::protocol::opcodes::{RESPONSE_OK, WRITE_ACKED, WRITE_NACKED};
use bpeeprom_core::protocol::{
    BridgeCommand, BusCommand, Peripherals, BRIDGE_SIGNATURE, BUS_MODE_SIGNATURE,
};
use bpeeprom_core::transaction::Primitive;
use bpeeprom_core::transport::Transport;

use crate::eeprom::Eeprom;

/// Emulator knobs
#[derive(Debug, Clone)]
pub struct EmulatorConfig {
    /// Reset bytes the text terminal swallows before answering `BBIO1`
    pub resets_to_bridge: u32,
    /// Error count reported by the self-test
    pub self_test_errors: u8,
    /// Stop answering after this many output bytes
    pub output_budget: Option<usize>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            resets_to_bridge: 1,
            self_test_errors: 0,
            output_budget: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Terminal { resets: u32 },
    Bridge,
    TwoWire,
    SelfTest,
}

/// In-memory adapter with an EEPROM on its two-wire bus
///
/// Implements [`Transport`], so it can stand in for a serial port. Answers
/// are queued as soon as a command byte is written; reading more than is
/// queued times out like a silent adapter would.
pub struct EmulatedPirate {
    config: EmulatorConfig,
    mode: Mode,
    outbox: VecDeque<u8>,
    bulk_remaining: u8,
    read_pending: bool,
    peripherals: Peripherals,
    eeprom: Eeprom,
    received: Vec<u8>,
    primitives: Vec<Primitive>,
    sent: usize,
}

impl EmulatedPirate {
    /// Create an emulator with the given configuration
    pub fn new(config: EmulatorConfig) -> Self {
        Self {
            config,
            mode: Mode::Terminal { resets: 0 },
            outbox: VecDeque::new(),
            bulk_remaining: 0,
            read_pending: false,
            peripherals: Peripherals::empty(),
            eeprom: Eeprom::new(),
            received: Vec::new(),
            primitives: Vec::new(),
            sent: 0,
        }
    }

    /// Create an emulator that enters bridge mode on the first reset
    pub fn new_default() -> Self {
        Self::new(EmulatorConfig::default())
    }

    /// Create an emulator whose EEPROM starts with `data` at address 0
    pub fn with_data(config: EmulatorConfig, data: &[u8]) -> Self {
        let mut pirate = Self::new(config);
        let memory = pirate.eeprom.memory_mut();
        let len = core::cmp::min(data.len(), memory.len());
        memory[..len].copy_from_slice(&data[..len]);
        pirate
    }

    /// The emulated EEPROM
    pub fn eeprom(&self) -> &Eeprom {
        &self.eeprom
    }

    /// Mutable access to the emulated EEPROM
    pub fn eeprom_mut(&mut self) -> &mut Eeprom {
        &mut self.eeprom
    }

    /// Every byte the host has written, in order
    pub fn received(&self) -> &[u8] {
        &self.received
    }

    /// Bus primitives the adapter has executed, in order
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Forget the recorded bytes and primitives
    pub fn clear_log(&mut self) {
        self.received.clear();
        self.primitives.clear();
    }

    /// Target power switched on
    pub fn is_powered(&self) -> bool {
        self.peripherals.contains(Peripherals::POWER)
    }

    /// Current peripheral switches
    pub fn peripherals(&self) -> Peripherals {
        self.peripherals
    }

    /// Adapter is back at its text terminal
    pub fn in_terminal(&self) -> bool {
        matches!(self.mode, Mode::Terminal { .. })
    }

    /// Adapter is in two-wire mode
    pub fn in_bus_mode(&self) -> bool {
        self.mode == Mode::TwoWire
    }

    fn answer(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if let Some(budget) = self.config.output_budget {
                if self.sent >= budget {
                    log::trace!("emulator: output budget spent, dropping 0x{:02X}", byte);
                    continue;
                }
            }
            self.sent += 1;
            self.outbox.push_back(byte);
        }
    }

    fn handle(&mut self, byte: u8) {
        match self.mode {
            Mode::Terminal { resets } => self.handle_terminal(byte, resets),
            Mode::Bridge => self.handle_bridge(byte),
            Mode::TwoWire => self.handle_two_wire(byte),
            Mode::SelfTest => {
                self.answer(&[RESPONSE_OK]);
                self.mode = Mode::Bridge;
            }
        }
    }

    fn handle_terminal(&mut self, byte: u8, resets: u32) {
        if byte != BridgeCommand::ResetToBridge.opcode() {
            return;
        }
        let resets = resets + 1;
        if resets >= self.config.resets_to_bridge {
            log::debug!("emulator: bridge mode after {} reset(s)", resets);
            self.mode = Mode::Bridge;
            self.answer(BRIDGE_SIGNATURE);
        } else {
            self.mode = Mode::Terminal { resets };
        }
    }

    fn handle_bridge(&mut self, byte: u8) {
        match BridgeCommand::decode(byte) {
            Some(BridgeCommand::ResetToBridge) => self.answer(BRIDGE_SIGNATURE),
            Some(BridgeCommand::SelectTwoWire) => {
                self.mode = Mode::TwoWire;
                self.answer(BUS_MODE_SIGNATURE);
            }
            Some(BridgeCommand::DeviceReset) => {
                self.answer(&[RESPONSE_OK]);
                self.mode = Mode::Terminal { resets: 0 };
            }
            Some(BridgeCommand::SelfTest) => {
                self.answer(&[self.config.self_test_errors]);
                self.mode = Mode::SelfTest;
            }
            Some(other) => log::warn!("emulator: unsupported bridge command {:?}", other),
            None => log::warn!("emulator: unknown bridge opcode 0x{:02X}", byte),
        }
    }

    fn handle_two_wire(&mut self, byte: u8) {
        if self.bulk_remaining > 0 {
            self.bulk_remaining -= 1;
            self.primitives.push(Primitive::Write(byte));
            let acked = self.is_powered() && self.eeprom.write(byte);
            self.answer(&[if acked { WRITE_ACKED } else { WRITE_NACKED }]);
            return;
        }

        match BusCommand::decode(byte) {
            Some(BusCommand::ExitToBridge) => {
                self.mode = Mode::Bridge;
                self.answer(BRIDGE_SIGNATURE);
            }
            Some(BusCommand::Start) => {
                self.primitives.push(Primitive::Start);
                self.eeprom.start();
                self.answer(&[RESPONSE_OK]);
            }
            Some(BusCommand::Stop) => {
                self.primitives.push(Primitive::Stop);
                self.eeprom.stop();
                self.answer(&[RESPONSE_OK]);
            }
            Some(BusCommand::ReadByte) => {
                let data = if self.is_powered() {
                    self.eeprom.read()
                } else {
                    0xFF
                };
                self.read_pending = true;
                self.answer(&[data]);
            }
            Some(handshake @ (BusCommand::Ack | BusCommand::Nack)) => {
                if self.read_pending {
                    self.primitives.push(if handshake == BusCommand::Ack {
                        Primitive::ReadAck
                    } else {
                        Primitive::ReadNack
                    });
                    self.read_pending = false;
                }
                self.answer(&[RESPONSE_OK]);
            }
            Some(BusCommand::BulkWrite { count }) => {
                self.bulk_remaining = count;
                self.answer(&[RESPONSE_OK]);
            }
            Some(BusCommand::Configure(flags)) => {
                log::debug!("emulator: peripherals {:?}", flags);
                self.peripherals = flags;
                self.answer(&[RESPONSE_OK]);
            }
            None => log::warn!("emulator: unknown bus opcode 0x{:02X}", byte),
        }
    }
}

impl Default for EmulatedPirate {
    fn default() -> Self {
        Self::new_default()
    }
}

impl Transport for EmulatedPirate {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        for &byte in data {
            self.received.push(byte);
            self.handle(byte);
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.outbox.len() < buf.len() {
            // a real port hands out what it has before timing out
            self.outbox.clear();
            return Err(Error::Timeout {
                expected: buf.len(),
            });
        }
        for slot in buf.iter_mut() {
            *slot = self.outbox.pop_front().unwrap_or(0xFF);
        }
        Ok(())
    }

    fn read_nonblock(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize> {
        let n = core::cmp::min(buf.len(), self.outbox.len());
        for (slot, byte) in buf.iter_mut().zip(self.outbox.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready() -> EmulatedPirate {
        let mut pirate = EmulatedPirate::new_default();
        pirate.write(&[0x00, 0x02, 0x4C]).unwrap();
        let mut banner = [0u8; 10];
        assert_eq!(pirate.read_nonblock(&mut banner, 0).unwrap(), 10);
        assert_eq!(&banner[..5], b"BBIO1");
        assert_eq!(&banner[5..9], b"I2C1");
        assert_eq!(banner[9], 0x01);
        pirate
    }

    #[test]
    fn test_terminal_needs_resets() {
        let mut pirate = EmulatedPirate::new(EmulatorConfig {
            resets_to_bridge: 3,
            ..EmulatorConfig::default()
        });
        let mut buf = [0u8; 5];
        pirate.write(&[0x00, 0x00]).unwrap();
        assert_eq!(pirate.read_nonblock(&mut buf, 0).unwrap(), 0);
        pirate.write(&[0x00]).unwrap();
        pirate.read(&mut buf).unwrap();
        assert_eq!(&buf, b"BBIO1");
    }

    #[test]
    fn test_write_then_read_through_bus() {
        let mut pirate = ready();
        pirate
            .write(&[0x02, 0x10, 0xA0, 0x10, 0x00, 0x10, 0x07, 0x10, 0x42, 0x03])
            .unwrap();
        let mut answers = [0u8; 10];
        pirate.read(&mut answers).unwrap();
        assert_eq!(answers, [1, 1, 0, 1, 0, 1, 0, 1, 0, 1]);
        assert_eq!(pirate.eeprom().memory()[0x0007], 0x42);

        pirate
            .write(&[0x02, 0x10, 0xA0, 0x10, 0x00, 0x10, 0x07, 0x02, 0x10, 0xA1])
            .unwrap();
        let mut discard = [0u8; 10];
        pirate.read(&mut discard).unwrap();
        pirate.write(&[0x04, 0x07, 0x03]).unwrap();
        let mut tail = [0u8; 3];
        pirate.read(&mut tail).unwrap();
        assert_eq!(tail, [0x42, 0x01, 0x01]);
        assert_eq!(pirate.primitives().last(), Some(&Primitive::Stop));
    }

    #[test]
    fn test_unpowered_target_nacks() {
        let mut pirate = ready();
        pirate.write(&[0x40, 0x02, 0x10, 0xA0]).unwrap();
        let mut answers = [0u8; 4];
        pirate.read(&mut answers).unwrap();
        assert_eq!(answers, [0x01, 0x01, 0x01, WRITE_NACKED]);
        assert!(!pirate.is_powered());
    }

    #[test]
    fn test_output_budget_times_out() {
        let mut pirate = EmulatedPirate::new(EmulatorConfig {
            output_budget: Some(5),
            ..EmulatorConfig::default()
        });
        pirate.write(&[0x00, 0x02]).unwrap();
        let mut buf = [0u8; 9];
        assert_eq!(pirate.read(&mut buf), Err(Error::Timeout { expected: 9 }));
    }

    #[test]
    fn test_self_test_round_trip() {
        let mut pirate = EmulatedPirate::new(EmulatorConfig {
            self_test_errors: 2,
            ..EmulatorConfig::default()
        });
        pirate.write(&[0x00, 0x10, 0xFF]).unwrap();
        let mut buf = [0u8; 7];
        pirate.read(&mut buf).unwrap();
        assert_eq!(&buf[5..], &[2, 0x01]);
    }
}
