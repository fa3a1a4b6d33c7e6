//! Bridge session and its mode state machine
//!
//! ```text
//! Idle --enter_bridge_mode--> BridgeEntered --select_bus_mode--> BusModeSelected
//!                                                                     |
//!                                                                 power_on
//!                                                                     v
//!                              Closed <------------close------------ Ready
//! ```
//!
//! A session that only ran the self-test can go from `BridgeEntered`
//! straight to `Closed` with `reset`.
//!
//! Each state is a type parameter of [`BridgeSession`], so bus operations
//! only exist on `BridgeSession<_, Ready>`. A failed transition consumes the
//! session and drops the channel without sending anything further.

use std::marker::PhantomData;
use std::ops::ControlFlow;

use bpeeprom_core::address::MemoryAddress;
use bpeeprom_core::protocol::opcodes::RESPONSE_OK;
use bpeeprom_core::protocol::{BridgeCommand, BusCommand, BRIDGE_SIGNATURE, BUS_MODE_SIGNATURE};
use bpeeprom_core::retry::RetryBudget;
use bpeeprom_core::transport::Transport;

use crate::config::Config;
use crate::encoder::TransactionEncoder;
use crate::error::{BusPirateError, Result};
use crate::progress::TransferProgress;
use crate::reader::BulkReader;
use crate::writer::{PageWriter, WriteReport};

mod sealed {
    pub trait Sealed {}
}

/// Marker trait for session states
pub trait SessionState: sealed::Sealed {
    /// Human-readable state name
    const NAME: &'static str;
}

macro_rules! session_states {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug)]
            pub enum $name {}

            impl sealed::Sealed for $name {}

            impl SessionState for $name {
                const NAME: &'static str = stringify!($name);
            }
        )*
    };
}

session_states! {
    /// Channel open, adapter in an unknown (usually text terminal) mode
    Idle,
    /// Raw bridge mode confirmed by its signature
    BridgeEntered,
    /// Two-wire sub-mode selected and its banner drained
    BusModeSelected,
    /// Target powered with pull-ups; bus operations allowed
    Ready,
    /// Power removed; only the channel can be recovered
    Closed,
}

/// Exclusive owner of the channel to one adapter
pub struct BridgeSession<T: Transport, S: SessionState> {
    transport: T,
    config: Config,
    _state: PhantomData<S>,
}

impl<T: Transport, S: SessionState> BridgeSession<T, S> {
    fn transition<N: SessionState>(self) -> BridgeSession<T, N> {
        log::debug!("session: {} -> {}", S::NAME, N::NAME);
        BridgeSession {
            transport: self.transport,
            config: self.config,
            _state: PhantomData,
        }
    }

    /// Name of the current state
    pub fn state(&self) -> &'static str {
        S::NAME
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn encoder(&mut self) -> TransactionEncoder<'_, T> {
        TransactionEncoder::new(&mut self.transport, &self.config.timing)
    }

    /// Read up to `buf.len()` bytes, stopping at the first quiet period
    fn read_upto(&mut self, buf: &mut [u8]) -> Result<usize> {
        let timeout = self.config.timing.drain_timeout_ms;
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.transport.read_nonblock(&mut buf[filled..], timeout)?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    fn send_bridge(&mut self, command: BridgeCommand) -> Result<()> {
        self.transport.write(&[command.opcode()])?;
        self.transport.flush()?;
        Ok(())
    }

    fn configure_power(&mut self, enable: bool) -> Result<()> {
        let command = if enable {
            BusCommand::POWER_ON
        } else {
            BusCommand::POWER_OFF
        };
        log::debug!(
            "session: power and pull-ups {}",
            if enable { "on" } else { "off" }
        );
        self.encoder().command(command)?;
        Ok(())
    }
}

impl<T: Transport> BridgeSession<T, Idle> {
    /// Take ownership of a freshly opened channel
    pub fn new(transport: T, config: Config) -> Self {
        Self {
            transport,
            config,
            _state: PhantomData,
        }
    }

    /// Switch the adapter into raw bridge mode
    ///
    /// Sends the reset-to-bridge opcode and waits for the 5-byte signature,
    /// retrying up to the configured number of attempts. Failure is fatal:
    /// the session is dropped before any bus traffic.
    pub fn enter_bridge_mode(mut self) -> Result<BridgeSession<T, BridgeEntered>> {
        let budget = RetryBudget::new(self.config.timing.entry_attempts);

        let entered = budget.run(|attempt| -> Result<ControlFlow<()>> {
            self.send_bridge(BridgeCommand::ResetToBridge)?;
            let mut answer = [0u8; BRIDGE_SIGNATURE.len()];
            let n = self.read_upto(&mut answer)?;
            if &answer[..n] == BRIDGE_SIGNATURE {
                log::debug!("session: bridge signature after {} reset(s)", attempt);
                return Ok(ControlFlow::Break(()));
            }
            Ok(ControlFlow::Continue(()))
        })?;

        if entered.is_none() {
            log::error!("session: no bridge signature, giving up");
            return Err(BusPirateError::ModeEntry {
                attempts: budget.attempts(),
            });
        }

        log::info!("Entered binary bridge mode");
        Ok(self.transition())
    }
}

impl<T: Transport> BridgeSession<T, BridgeEntered> {
    /// Run the adapter's short self-test
    ///
    /// Returns the number of errors the adapter reported; the session stays
    /// in bridge mode either way.
    pub fn self_test(&mut self) -> Result<u8> {
        self.encoder().drain()?;
        self.send_bridge(BridgeCommand::SelfTest)?;
        let mut errors = [0u8];
        self.transport.read(&mut errors)?;

        // any byte ends the self-test
        self.transport.write(&[0xFF])?;
        self.transport.flush()?;
        let mut ack = [0u8];
        self.transport.read(&mut ack)?;
        if ack[0] != RESPONSE_OK {
            return Err(BusPirateError::UnexpectedResponse {
                command: BridgeCommand::SelfTest.opcode(),
                response: ack[0],
            });
        }

        log::info!("Self-test finished with {} error(s)", errors[0]);
        Ok(errors[0])
    }

    /// Select the two-wire sub-mode
    ///
    /// The adapter announces the mode with a banner; it is drained, not
    /// parsed, until the channel stays quiet for one drain timeout.
    pub fn select_bus_mode(mut self) -> Result<BridgeSession<T, BusModeSelected>> {
        // leftover signatures from surplus resets
        self.encoder().drain()?;
        self.send_bridge(BridgeCommand::SelectTwoWire)?;

        let mut banner = [0u8; BUS_MODE_SIGNATURE.len()];
        let n = self.read_upto(&mut banner)?;
        let rest = self.encoder().drain()?;
        log::debug!(
            "session: bus mode banner {:?} (+{} byte(s))",
            String::from_utf8_lossy(&banner[..n]),
            rest
        );

        Ok(self.transition())
    }

    /// Hand the adapter back to its text terminal without selecting a bus
    pub fn reset(mut self) -> Result<BridgeSession<T, Closed>> {
        self.send_bridge(BridgeCommand::DeviceReset)?;
        self.encoder().drain()?;
        log::info!("Adapter reset to terminal mode");
        Ok(self.transition())
    }
}

impl<T: Transport> BridgeSession<T, BusModeSelected> {
    /// Enable target power and the bus pull-ups
    ///
    /// The adapter's answer is drained so the first transaction starts on
    /// a quiet channel.
    pub fn power_on(mut self) -> Result<BridgeSession<T, Ready>> {
        self.configure_power(true)?;
        self.encoder().drain()?;
        log::info!("Two-wire bus ready");
        Ok(self.transition())
    }
}

impl<T: Transport> BridgeSession<T, Ready> {
    /// Writer borrowing this session's channel
    pub fn page_writer(&mut self) -> PageWriter<'_, T> {
        PageWriter::new(&mut self.transport, &self.config.timing)
    }

    /// Reader borrowing this session's channel
    pub fn bulk_reader(&mut self) -> BulkReader<'_, T> {
        BulkReader::new(&mut self.transport, &self.config.timing)
    }

    /// Write `data` starting at `start`; see [`PageWriter::write_pages`]
    pub fn write_pages(&mut self, data: &[u8], start: MemoryAddress) -> Result<WriteReport> {
        self.page_writer().write_pages(data, start)
    }

    /// Like [`write_pages`](Self::write_pages), with progress reporting
    pub fn write_pages_with_progress<P: TransferProgress + ?Sized>(
        &mut self,
        data: &[u8],
        start: MemoryAddress,
        progress: &mut P,
    ) -> Result<WriteReport> {
        self.page_writer()
            .write_pages_with_progress(data, start, progress)
    }

    /// Read `len` bytes from `start`; see [`BulkReader::read_bytes`]
    pub fn read_bytes(&mut self, start: MemoryAddress, len: usize) -> Result<Vec<u8>> {
        self.bulk_reader().read_bytes(start, len)
    }

    /// Like [`read_bytes`](Self::read_bytes), with progress reporting
    pub fn read_bytes_with_progress<P: TransferProgress + ?Sized>(
        &mut self,
        start: MemoryAddress,
        len: usize,
        progress: &mut P,
    ) -> Result<Vec<u8>> {
        self.bulk_reader()
            .read_bytes_with_progress(start, len, progress)
    }

    /// Remove target power and release the adapter
    ///
    /// With `teardown_reset` set, the adapter is also returned from bridge
    /// mode to its text terminal.
    pub fn close(mut self) -> Result<BridgeSession<T, Closed>> {
        self.configure_power(false)?;
        if self.config.teardown_reset {
            self.encoder().command(BusCommand::ExitToBridge)?;
            self.send_bridge(BridgeCommand::DeviceReset)?;
            log::debug!("session: adapter reset to terminal mode");
        }
        self.encoder().drain()?;
        log::info!("Session closed");
        Ok(self.transition())
    }
}

impl<T: Transport> BridgeSession<T, Closed> {
    /// Recover the channel
    pub fn into_transport(self) -> T {
        self.transport
    }
}

/// Bring a fresh channel all the way to [`Ready`]
pub fn open<T: Transport>(transport: T, config: Config) -> Result<BridgeSession<T, Ready>> {
    BridgeSession::new(transport, config)
        .enter_bridge_mode()?
        .select_bus_mode()?
        .power_on()
}
