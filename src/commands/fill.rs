//! Fill command implementation

use super::{write::print_report, IndicatifProgress};
use crate::port::Session;
use bpeeprom_buspirate::Ready;
use bpeeprom_core::address::MemoryAddress;
use bpeeprom_core::protocol::EEPROM_CAPACITY;

/// Overwrite every byte of the device with `byte`
pub fn run_fill(session: &mut Session<Ready>, byte: u8) -> Result<(), Box<dyn std::error::Error>> {
    let data = vec![byte; EEPROM_CAPACITY];

    let mut progress = IndicatifProgress::new("Filling");
    let report = session.write_pages_with_progress(&data, MemoryAddress::ZERO, &mut progress)?;
    print_report(&report);
    report.into_result()?;

    println!("Filled the EEPROM with 0x{:02X}", byte);
    Ok(())
}
