//! Write command implementation

use super::{read_file, verify::verify_with_progress, IndicatifProgress};
use crate::port::Session;
use bpeeprom_buspirate::{Ready, WriteReport};
use bpeeprom_core::address::MemoryAddress;
use std::path::Path;

/// Run the write command
pub fn run_write(
    session: &mut Session<Ready>,
    start: MemoryAddress,
    input: &Path,
    verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = read_file(input)?;

    let mut progress = IndicatifProgress::new("Writing");
    let report = session.write_pages_with_progress(&data, start, &mut progress)?;
    print_report(&report);

    // skipped pages would shift the comparison
    if verify && report.committed > 0 && report.rejected.is_empty() {
        verify_with_progress(session, start, &data[..report.committed])?;
        println!("Verification passed!");
    }

    report.into_result()?;
    Ok(())
}

/// Summarize a write, including whatever did not make it to the device
pub fn print_report(report: &WriteReport) {
    println!(
        "Wrote {} of {} bytes at {} in {} page(s)",
        report.committed, report.requested, report.start, report.pages
    );
    for rejected in &report.rejected {
        println!("  skipped page {}: {}", rejected.chunk, rejected.reason);
    }
    if report.dropped > 0 {
        println!(
            "  {} byte(s) dropped past the end of the device",
            report.dropped
        );
    }
}
