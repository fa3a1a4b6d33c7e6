//! Self-test command implementation

use crate::port::Session;
use bpeeprom_buspirate::{BusPirateError, Idle};

/// Run the adapter's self-test and hand it back to its terminal
pub fn run_self_test(session: Session<Idle>) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = session.enter_bridge_mode()?;
    let errors = session.self_test()?;
    session.reset()?;

    if errors != 0 {
        return Err(BusPirateError::SelfTest { errors }.into());
    }
    println!("Self-test passed");
    Ok(())
}
