//! Progress reporting hooks for long transfers

/// Callback for progress reporting during page writes and bulk reads
pub trait TransferProgress {
    /// Called once before the first byte moves
    fn started(&mut self, total_bytes: usize);

    /// Called whenever more bytes were committed or received
    fn advanced(&mut self, bytes_done: usize);

    /// Called when the transfer ends, successfully or not
    fn finished(&mut self, bytes_done: usize);
}

/// A no-op progress reporter
pub struct NoProgress;

impl TransferProgress for NoProgress {
    fn started(&mut self, _total_bytes: usize) {}
    fn advanced(&mut self, _bytes_done: usize) {}
    fn finished(&mut self, _bytes_done: usize) {}
}
