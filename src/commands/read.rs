//! Read command implementation

use super::IndicatifProgress;
use crate::port::Session;
use bpeeprom_buspirate::Ready;
use bpeeprom_core::address::MemoryAddress;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Bytes per hex dump line
const DUMP_WIDTH: usize = 16;

/// Run the read command
pub fn run_read(
    session: &mut Session<Ready>,
    start: MemoryAddress,
    count: usize,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut progress = IndicatifProgress::new("Reading");
    let data = session.read_bytes_with_progress(start, count, &mut progress)?;

    match output {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(&data)?;
            println!("Wrote {} bytes to {:?}", data.len(), path);
        }
        None => {
            let stdout = std::io::stdout();
            hex_dump(&mut stdout.lock(), start, &data)?;
        }
    }

    Ok(())
}

/// Print `data` as offset-prefixed hex lines
fn hex_dump<W: Write>(out: &mut W, start: MemoryAddress, data: &[u8]) -> std::io::Result<()> {
    let base = start.offset() as usize;
    for (i, line) in data.chunks(DUMP_WIDTH).enumerate() {
        write!(out, "{:04X}:", base + i * DUMP_WIDTH)?;
        for byte in line {
            write!(out, " {:02X}", byte)?;
        }
        writeln!(out)?;
    }
    Ok(())
}
