//! CLI command implementations
//!
//! Every command runs against a [`Session`](crate::port::Session) and works
//! the same over a serial adapter or the built-in emulator. Long transfers
//! report through [`IndicatifProgress`].

mod fill;
mod read;
mod selftest;
mod verify;
mod write;

pub use fill::run_fill;
pub use read::run_read;
pub use selftest::run_self_test;
pub use verify::run_verify;
pub use write::run_write;

use bpeeprom_buspirate::TransferProgress;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Progress reporter using an indicatif progress bar
pub struct IndicatifProgress {
    bar: Option<ProgressBar>,
    phase: &'static str,
}

impl IndicatifProgress {
    pub fn new(phase: &'static str) -> Self {
        Self { bar: None, phase }
    }
}

impl TransferProgress for IndicatifProgress {
    fn started(&mut self, total_bytes: usize) {
        let pb = ProgressBar::new(total_bytes as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(&format!(
                    "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                    self.phase
                ))
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        self.bar = Some(pb);
    }

    fn advanced(&mut self, bytes_done: usize) {
        if let Some(pb) = &self.bar {
            pb.set_position(bytes_done as u64);
        }
    }

    fn finished(&mut self, bytes_done: usize) {
        if let Some(pb) = self.bar.take() {
            pb.set_position(bytes_done as u64);
            if pb.length() == Some(bytes_done as u64) {
                pb.finish_with_message(format!("{} complete", self.phase));
            } else {
                pb.abandon_with_message(format!("{} incomplete", self.phase));
            }
        }
    }
}

/// Read a whole input file
fn read_file(path: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut file = File::open(path)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    println!("Read {} bytes from {:?}", data.len(), path);
    Ok(data)
}
