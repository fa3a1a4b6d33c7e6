//! Serial port transport
//!
//! The adapter enumerates as a plain USB serial device; this is the
//! production implementation of [`Transport`].

use std::io::{self, Read, Write};
use std::time::Duration;

use bpeeprom_core::transport::Transport;
use bpeeprom_core::{Error as CoreError, Result as CoreResult};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::error::Result;

/// Baud rate the adapter's terminal uses out of the box
pub const DEFAULT_BAUD: u32 = 115200;

/// Serial port transport
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open a serial port with the specified baud rate and read timeout
    pub fn open(device: &str, baud: Option<u32>, timeout: Duration) -> Result<Self> {
        let baud_rate = baud.unwrap_or(DEFAULT_BAUD);

        let port = serialport::new(device, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(timeout)
            .open()?;

        log::info!("Opened serial port {} at {} baud", device, baud_rate);

        Ok(Self { port })
    }
}

fn io_error(e: io::Error, expected: usize) -> CoreError {
    match e.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::UnexpectedEof => CoreError::Timeout { expected },
        _ => {
            log::error!("serial I/O failed: {}", e);
            CoreError::IoError
        }
    }
}

fn port_error(e: serialport::Error) -> CoreError {
    log::error!("serial port configuration failed: {}", e);
    CoreError::IoError
}

impl Transport for SerialTransport {
    fn write(&mut self, data: &[u8]) -> CoreResult<()> {
        self.port.write_all(data).map_err(|e| {
            log::error!("serial write failed: {}", e);
            CoreError::WriteError
        })
    }

    fn read(&mut self, buf: &mut [u8]) -> CoreResult<()> {
        self.port
            .read_exact(buf)
            .map_err(|e| io_error(e, buf.len()))
    }

    fn read_nonblock(&mut self, buf: &mut [u8], timeout_ms: u32) -> CoreResult<usize> {
        // Set temporary timeout
        let old_timeout = self.port.timeout();
        self.port
            .set_timeout(Duration::from_millis(timeout_ms as u64))
            .map_err(port_error)?;

        let result = match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(io_error(e, buf.len())),
        };

        // Restore timeout
        self.port.set_timeout(old_timeout).map_err(port_error)?;
        result
    }

    fn flush(&mut self) -> CoreResult<()> {
        self.port.flush().map_err(|e| io_error(e, 0))
    }
}
