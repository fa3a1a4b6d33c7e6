//! Port selection and session setup
//!
//! A port is either a serial device path or, with the `dummy` feature, the
//! in-memory emulator. Either way the commands get a ready session over a
//! boxed [`Transport`].

use crate::cli::PortArgs;
use bpeeprom_buspirate::{open, BridgeSession, Config, Idle, Ready, SerialTransport, Timing};
use bpeeprom_core::transport::Transport;

/// Name of the emulated port
#[cfg(feature = "dummy")]
pub const DUMMY_PORT: &str = "dummy";

/// Session over whatever port was selected
pub type Session<S> = BridgeSession<Box<dyn Transport>, S>;

fn is_dummy(args: &PortArgs) -> bool {
    #[cfg(feature = "dummy")]
    {
        args.port == DUMMY_PORT
    }
    #[cfg(not(feature = "dummy"))]
    {
        let _ = args;
        false
    }
}

/// Build the session configuration from the command line
///
/// The emulator answers instantly, so it starts from [`Timing::immediate`]
/// unless a timing file says otherwise. Explicit overrides always win.
pub fn load_config(args: &PortArgs) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &args.timing {
        Some(path) => {
            let config = Config::from_file(path)?;
            log::info!("Loaded timing from {:?}", path);
            config
        }
        None if is_dummy(args) => Config {
            timing: Timing::immediate(),
            ..Config::default()
        },
        None => Config::default(),
    };

    if let Some(ms) = args.settle_ms {
        config.timing.page_settle_ms = ms;
    }
    if let Some(us) = args.byte_delay_us {
        config.timing.byte_delay_us = us;
    }
    log::debug!("Timing: {:?}", config.timing);
    Ok(config)
}

/// Open the selected port
pub fn open_transport(
    args: &PortArgs,
    config: &Config,
) -> Result<Box<dyn Transport>, Box<dyn std::error::Error>> {
    #[cfg(feature = "dummy")]
    if is_dummy(args) {
        log::info!("Using the in-memory bridge emulator");
        return Ok(Box::new(bpeeprom_dummy::EmulatedPirate::new_default()));
    }

    log::info!("Opening {} at {} baud", args.port, args.baud);
    let transport = SerialTransport::open(&args.port, Some(args.baud), config.timing.io_timeout())?;
    Ok(Box::new(transport))
}

/// Open the port without leaving the adapter's terminal mode
pub fn open_idle(args: &PortArgs) -> Result<Session<Idle>, Box<dyn std::error::Error>> {
    let config = load_config(args)?;
    let transport = open_transport(args, &config)?;
    Ok(BridgeSession::new(transport, config))
}

/// Open the port and bring the adapter all the way to a powered bus
pub fn open_ready(args: &PortArgs) -> Result<Session<Ready>, Box<dyn std::error::Error>> {
    let config = load_config(args)?;
    let transport = open_transport(args, &config)?;
    Ok(open(transport, config)?)
}
