//! Verify command implementation

use super::{read_file, IndicatifProgress};
use crate::port::Session;
use bpeeprom_buspirate::Ready;
use bpeeprom_core::address::MemoryAddress;
use bpeeprom_core::verify;
use std::path::Path;

/// Run the verify command
pub fn run_verify(
    session: &mut Session<Ready>,
    start: MemoryAddress,
    input: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let expected = read_file(input)?;
    verify_with_progress(session, start, &expected)?;
    println!("Verification passed!");
    Ok(())
}

/// Read back `expected.len()` bytes from `start` and compare them
pub fn verify_with_progress(
    session: &mut Session<Ready>,
    start: MemoryAddress,
    expected: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut progress = IndicatifProgress::new("Verifying");
    let actual = session.read_bytes_with_progress(start, expected.len(), &mut progress)?;

    if let Err(e) = verify::compare(expected, &actual) {
        let mismatches = verify::count_mismatches(expected, &actual);
        return Err(format!(
            "Verification failed: {} byte(s) differ, first: {}",
            mismatches, e
        )
        .into());
    }

    Ok(())
}
