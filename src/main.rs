//! bpeeprom - 24xx512 EEPROM reader/writer for serial bus bridges
//!
//! Drives a Bus Pirate style adapter in its binary bridging mode to read,
//! write, fill and verify a 64 KiB two-wire EEPROM.
//!
//! # Architecture
//!
//! - `bpeeprom-core` models the protocol: opcodes, addresses, page
//!   planning, transactions and the verifier
//! - `bpeeprom-buspirate` owns the serial channel and the mode state
//!   machine, and runs page writes and bulk reads against it
//! - `bpeeprom-dummy` emulates the adapter and the EEPROM in memory
//!
//! Every command opens a session, runs to completion and closes it again,
//! leaving the target unpowered.

mod cli;
mod commands;
mod port;

use bpeeprom_buspirate::BusPirateError;
use clap::Parser;
use cli::{Cli, Commands};

/// Exit status when the adapter never entered binary mode
const EXIT_MODE_ENTRY: i32 = 2;
/// Exit status for every other failure
const EXIT_FAILURE: i32 = 1;

fn main() {
    let cli = Cli::parse();

    // RUST_LOG still wins over -v
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter(cli.verbose)),
    )
    .init();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(exit_status(e.as_ref()));
    }
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Read {
            port,
            start,
            count,
            output,
        } => {
            let mut session = port::open_ready(&port)?;
            let result = commands::run_read(&mut session, start, count, output.as_deref());
            finish(session, result)
        }
        Commands::Write {
            port,
            start,
            input,
            verify,
        } => {
            let mut session = port::open_ready(&port)?;
            let result = commands::run_write(&mut session, start, &input, verify);
            finish(session, result)
        }
        Commands::Fill { port, byte } => {
            let mut session = port::open_ready(&port)?;
            let result = commands::run_fill(&mut session, byte);
            finish(session, result)
        }
        Commands::Verify { port, start, input } => {
            let mut session = port::open_ready(&port)?;
            let result = commands::run_verify(&mut session, start, &input);
            finish(session, result)
        }
        Commands::SelfTest { port } => commands::run_self_test(port::open_idle(&port)?),
    }
}

/// Log filter used when RUST_LOG is unset
fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Power down and release the adapter, then report the command's outcome
///
/// A channel timeout leaves the adapter out of step, so no teardown is
/// attempted after one.
fn finish(
    session: port::Session<bpeeprom_buspirate::Ready>,
    result: Result<(), Box<dyn std::error::Error>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let desynced = result
        .as_ref()
        .err()
        .and_then(|e| e.downcast_ref::<BusPirateError>())
        .is_some_and(BusPirateError::is_timeout);
    if desynced {
        log::warn!("Channel timed out, skipping adapter teardown");
        return result;
    }

    match (result, session.close()) {
        (Err(e), _) => Err(e),
        (Ok(()), Err(e)) => Err(e.into()),
        (Ok(()), Ok(_)) => Ok(()),
    }
}

/// Map an error to the process exit status
fn exit_status(err: &(dyn std::error::Error + 'static)) -> i32 {
    match err.downcast_ref::<BusPirateError>() {
        Some(BusPirateError::ModeEntry { .. }) => EXIT_MODE_ENTRY,
        _ => EXIT_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_follows_verbosity() {
        assert_eq!(default_filter(0), "info");
        assert_eq!(default_filter(1), "debug");
        assert_eq!(default_filter(2), "trace");
        assert_eq!(default_filter(5), "trace");

        let cli = Cli::try_parse_from(["bpeeprom", "-vv", "self-test", "-p", "dummy"]).unwrap();
        assert_eq!(default_filter(cli.verbose), "trace");
    }

    #[test]
    fn test_exit_status() {
        let mode: Box<dyn std::error::Error> = BusPirateError::ModeEntry { attempts: 20 }.into();
        assert_eq!(exit_status(mode.as_ref()), 2);

        let other: Box<dyn std::error::Error> = BusPirateError::SelfTest { errors: 1 }.into();
        assert_eq!(exit_status(other.as_ref()), 1);

        let plain: Box<dyn std::error::Error> = "bad input".into();
        assert_eq!(exit_status(plain.as_ref()), 1);
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_fill_then_verify_on_emulator() {
        let port = cli::PortArgs {
            port: port::DUMMY_PORT.to_string(),
            baud: 115_200,
            timing: None,
            settle_ms: None,
            byte_delay_us: None,
        };
        let mut session = port::open_ready(&port).unwrap();
        commands::run_fill(&mut session, 0x5A).unwrap();
        let data = session
            .read_bytes(bpeeprom_core::address::MemoryAddress::new(0x80, 0x00), 64)
            .unwrap();
        assert!(data.iter().all(|&b| b == 0x5A));
        finish(session, Ok(())).unwrap();
    }
}
