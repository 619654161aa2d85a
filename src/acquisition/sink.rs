//! Sample sink: the per-tile CS8 file a capture writes into.
//!
//! Buffer size and byte budget mirror the original driver's
//! `setvbuf(file, NULL, _IOFBF, FD_BUFFER_SIZE)` (8 KiB) and its
//! `bytes_to_xfer = DEFAULT_SAMPLES_TO_XFER_MAX * 2` budget (20M complex
//! samples, 2 bytes each -> 40 MB) from `Drivers/bacn_RF.c`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::CoreError;

/// Write buffer size, matching the original driver's `FD_BUFFER_SIZE`.
const SINK_BUFFER_BYTES: usize = 8 * 1024;

/// Default per-tile byte budget: 20,000,000 CS8 samples * 2 bytes/sample.
pub const DEFAULT_TILE_BUDGET_BYTES: u64 = 40_000_000;

/// A single tile's capture file, clamped to a fixed byte budget.
pub struct SampleSink {
    writer: BufWriter<File>,
    remaining: u64,
    written: u64,
}

impl SampleSink {
    /// Create a sink writing to `path`, truncating any prior contents, with
    /// at most `budget_bytes` accepted before `is_complete()` reports true.
    pub fn create(path: &Path, budget_bytes: u64) -> Result<Self, CoreError> {
        let file = File::create(path).map_err(|e| CoreError::io(path.to_path_buf(), e))?;
        Ok(Self {
            writer: BufWriter::with_capacity(SINK_BUFFER_BYTES, file),
            remaining: budget_bytes,
            written: 0,
        })
    }

    /// Write `data`, clamped to the remaining budget. Writing past the
    /// budget silently drops the excess rather than erroring — the budget
    /// is a capture limit, not a corruption signal.
    pub fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        let take = data.len().min(self.remaining as usize);
        if take == 0 {
            return Ok(());
        }
        self.writer.write_all(&data[..take])?;
        self.remaining -= take as u64;
        self.written += take as u64;
        Ok(())
    }

    /// True once the byte budget has been exhausted.
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Flush the buffered writer, surfacing any short-write as `CoreError::Io`.
    pub fn finish(mut self, path: &Path) -> Result<u64, CoreError> {
        self.writer
            .flush()
            .map_err(|e| CoreError::io(path.to_path_buf(), e))?;
        Ok(self.written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn writes_are_clamped_to_budget() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0");
        let mut sink = SampleSink::create(&path, 10).unwrap();

        sink.write(&[1u8; 6]).unwrap();
        assert!(!sink.is_complete());
        sink.write(&[2u8; 6]).unwrap();
        assert!(sink.is_complete());

        let written = sink.finish(&path).unwrap();
        assert_eq!(written, 10);

        let mut contents = Vec::new();
        File::open(&path).unwrap().read_to_end(&mut contents).unwrap();
        assert_eq!(contents.len(), 10);
        assert_eq!(&contents[..6], &[1u8; 6]);
        assert_eq!(&contents[6..], &[2u8; 4]);
    }

    #[test]
    fn zero_budget_is_immediately_complete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0");
        let sink = SampleSink::create(&path, 0).unwrap();
        assert!(sink.is_complete());
    }
}
