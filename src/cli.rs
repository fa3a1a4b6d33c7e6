//! CLI argument parsing

use bpeeprom_core::address::MemoryAddress;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a 16-bit start address (`0000`, `f8d0` or `0xf8d0`)
fn parse_address(s: &str) -> Result<MemoryAddress, String> {
    MemoryAddress::parse_hex(s).map_err(|e| format!("{}: expected 1-4 hex digits", e))
}

/// Parse a string as a hex or decimal usize
fn parse_count(s: &str) -> Result<usize, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<usize>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a single byte value, hex (`0xAA`) or decimal
fn parse_byte(s: &str) -> Result<u8, String> {
    let value = parse_count(s)?;
    u8::try_from(value).map_err(|_| format!("{} does not fit in a byte", value))
}

/// Generate help text for the port argument
fn port_help() -> String {
    if cfg!(feature = "dummy") {
        "Serial device of the bus bridge, or \"dummy\" for the built-in emulator".to_string()
    } else {
        "Serial device of the bus bridge".to_string()
    }
}

#[derive(Parser)]
#[command(name = "bpeeprom")]
#[command(
    author,
    version,
    about = "24xx512 EEPROM reader/writer for serial bus bridges",
    long_about = None
)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection options shared across commands
#[derive(clap::Args, Debug, Clone)]
pub struct PortArgs {
    /// Serial device to use
    #[arg(short, long, help = port_help())]
    pub port: String,

    /// Baud rate of the serial device
    #[arg(short, long, default_value_t = 115_200)]
    pub baud: u32,

    /// Timing configuration file (TOML)
    #[arg(long)]
    pub timing: Option<PathBuf>,

    /// Wait after each page write, overriding the configuration
    #[arg(long)]
    pub settle_ms: Option<u64>,

    /// Pause after each written byte, overriding the configuration
    #[arg(long)]
    pub byte_delay_us: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read EEPROM contents to a file or stdout
    Read {
        #[command(flatten)]
        port: PortArgs,

        /// Start address (hex, e.g. 0000, f8d0, 0xf8d0)
        #[arg(short, long, value_parser = parse_address, default_value = "0000")]
        start: MemoryAddress,

        /// Number of bytes to read (hex or decimal)
        #[arg(short, long, value_parser = parse_count)]
        count: usize,

        /// Output file path (hex dump to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a file to the EEPROM
    Write {
        #[command(flatten)]
        port: PortArgs,

        /// Start address (hex, e.g. 0000, f8d0, 0xf8d0)
        #[arg(short, long, value_parser = parse_address, default_value = "0000")]
        start: MemoryAddress,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Read back and compare after writing
        #[arg(long)]
        verify: bool,
    },

    /// Overwrite the whole EEPROM with one byte value
    Fill {
        #[command(flatten)]
        port: PortArgs,

        /// Byte value to fill with (hex or decimal)
        #[arg(short = 'B', long, value_parser = parse_byte)]
        byte: u8,
    },

    /// Compare EEPROM contents against a file
    Verify {
        #[command(flatten)]
        port: PortArgs,

        /// Start address (hex, e.g. 0000, f8d0, 0xf8d0)
        #[arg(short, long, value_parser = parse_address, default_value = "0000")]
        start: MemoryAddress,

        /// Input file path to verify against
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Run the adapter's self-test
    SelfTest {
        #[command(flatten)]
        port: PortArgs,
    },
}
