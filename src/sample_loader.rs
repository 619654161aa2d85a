//! CS8 sample loader: turns a tile's raw `i8` I/Q byte file into a vector of
//! `Complex<f64>` samples.
//!
//! Conversion is deliberately **not** normalized to `[-1, 1]` — each raw
//! signed byte becomes a real or imaginary component directly, matching
//! `cs8_to_iq_convert` in `Modules/CS8toIQ.c` (`output_buffer[i] = raw[2i] +
//! raw[2i+1]*I`). Memory-mapped loading mirrors that file's `USE_MMAP` path
//! via `memmap2`; streaming loading mirrors its buffered-`fread` fallback.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use num_complex::Complex;

use crate::error::CoreError;

/// Streaming read chunk size, matching `OPTIMAL_BLOCK_SIZE` in `CS8toIQ.c`.
const STREAM_CHUNK_BYTES: usize = 1024 * 1024;

/// Load a CS8 file into complex samples using a memory map.
///
/// Returns `CoreError::Format` if the file size is odd (CS8 requires an
/// even byte count: one byte each for I and Q).
pub fn load_mmap(path: &Path) -> Result<Vec<Complex<f64>>, CoreError> {
    let file = File::open(path).map_err(|e| CoreError::io(path.to_path_buf(), e))?;
    // Safety: the file is opened read-only for the lifetime of this call and
    // not concurrently truncated by this process.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| CoreError::io(path.to_path_buf(), e))?;
    convert_bytes(&mmap, path)
}

/// Load a CS8 file by streaming it in fixed-size chunks rather than mapping
/// it, for callers that want to avoid holding the whole file in the page
/// cache at once (or on platforms where mmap is undesirable).
pub fn load_streaming(path: &Path) -> Result<Vec<Complex<f64>>, CoreError> {
    use std::io::Read;

    let mut file = File::open(path).map_err(|e| CoreError::io(path.to_path_buf(), e))?;
    let len = file
        .metadata()
        .map_err(|e| CoreError::io(path.to_path_buf(), e))?
        .len() as usize;

    if len % 2 != 0 {
        return Err(CoreError::Format(format!(
            "{}: CS8 file size {len} is not a multiple of 2",
            path.display()
        )));
    }

    let mut samples = Vec::with_capacity(len / 2);
    let mut buf = vec![0u8; STREAM_CHUNK_BYTES];
    let mut carry: Option<i8> = None;

    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| CoreError::io(path.to_path_buf(), e))?;
        if n == 0 {
            break;
        }

        let mut chunk = &buf[..n];
        if let Some(i_val) = carry.take() {
            let q_val = chunk[0] as i8;
            samples.push(Complex::new(f64::from(i_val), f64::from(q_val)));
            chunk = &chunk[1..];
        }

        let pairs = chunk.len() / 2;
        for p in 0..pairs {
            let i_val = chunk[p * 2] as i8;
            let q_val = chunk[p * 2 + 1] as i8;
            samples.push(Complex::new(f64::from(i_val), f64::from(q_val)));
        }
        if chunk.len() % 2 == 1 {
            carry = Some(chunk[chunk.len() - 1] as i8);
        }
    }

    Ok(samples)
}

fn convert_bytes(raw: &[u8], path: &Path) -> Result<Vec<Complex<f64>>, CoreError> {
    if raw.len() % 2 != 0 {
        return Err(CoreError::Format(format!(
            "{}: CS8 file size {} is not a multiple of 2",
            path.display(),
            raw.len()
        )));
    }

    let num_samples = raw.len() / 2;
    let mut out = Vec::with_capacity(num_samples);
    for i in 0..num_samples {
        let i_val = raw[2 * i] as i8;
        let q_val = raw[2 * i + 1] as i8;
        out.push(Complex::new(f64::from(i_val), f64::from(q_val)));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn raw_bytes_are_not_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0");
        let mut f = File::create(&path).unwrap();
        // -1 as i8 is 0xFF; 2 stays 2.
        f.write_all(&[0xFFu8, 2u8]).unwrap();
        drop(f);

        let samples = load_mmap(&path).unwrap();
        assert_eq!(samples, vec![Complex::new(-1.0, 2.0)]);

        let streamed = load_streaming(&path).unwrap();
        assert_eq!(streamed, samples);
    }

    #[test]
    fn odd_length_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0");
        let mut f = File::create(&path).unwrap();
        f.write_all(&[1u8, 2u8, 3u8]).unwrap();
        drop(f);

        assert!(matches!(load_mmap(&path), Err(CoreError::Format(_))));
        assert!(matches!(load_streaming(&path), Err(CoreError::Format(_))));
    }

    #[test]
    fn streaming_matches_mmap_across_chunk_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0");
        let mut f = File::create(&path).unwrap();
        let bytes: Vec<u8> = (0..(STREAM_CHUNK_BYTES + 6) as u32)
            .map(|i| (i % 251) as u8)
            .collect();
        f.write_all(&bytes).unwrap();
        drop(f);

        assert_eq!(load_mmap(&path).unwrap(), load_streaming(&path).unwrap());
    }
}
