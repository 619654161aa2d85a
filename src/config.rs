//! Application configuration: `.env`-style path discovery layered with CLI
//! overrides.
//!
//! Path values are read-only once constructed and are passed around by
//! reference, the way the teacher codebase treats its loaded `AppConfig`.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::error::CoreError;

/// Required keys in the `.env`-style configuration file.
const KEY_ROOT: &str = "ROOT_PATH";
const KEY_SAMPLES: &str = "CORE_SAMPLES_PATH";
const KEY_JSON: &str = "CORE_JSON_PATH";
const KEY_BANDS: &str = "CORE_BANDS_PATH";

/// VHF spectrum monitor — acquires, analyzes, and publishes per-tile PSD results.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the `.env`-style file carrying ROOT_PATH / CORE_SAMPLES_PATH /
    /// CORE_JSON_PATH / CORE_BANDS_PATH.
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,

    /// Lower edge of the scan range in Hz.
    #[arg(long, default_value_t = 88_000_000.0)]
    pub lo_freq_hz: f64,

    /// Upper edge of the scan range in Hz.
    #[arg(long, default_value_t = 108_000_000.0)]
    pub hi_freq_hz: f64,

    /// Radio sample rate in Hz (tile width).
    #[arg(long, default_value_t = 20_000_000.0)]
    pub sample_rate_hz: f64,

    /// Presence-detection threshold, in dB.
    #[arg(long, default_value_t = -30.0)]
    pub threshold_db: f64,

    /// Number of full scan passes to run; 0 means run until shutdown requested.
    #[arg(long, default_value_t = 0)]
    pub passes: u32,

    /// RTL-SDR device index (only used with the `hardware` feature).
    #[arg(long, default_value_t = 0)]
    pub device_index: u32,

    /// Run against the synthetic signal generator instead of hardware.
    #[arg(long)]
    pub synthetic: bool,

    /// Increase log verbosity (equivalent to RUST_LOG=debug).
    #[arg(short, long)]
    pub verbose: bool,
}

/// Resolved, read-only path configuration for one run.
#[derive(Debug, Clone)]
pub struct PathConfig {
    pub root_path: PathBuf,
    pub samples_path: PathBuf,
    pub json_path: PathBuf,
    pub bands_path: PathBuf,
}

impl PathConfig {
    /// Load path configuration from a `.env`-style file. Every key is
    /// required; a missing key is a fatal `CoreError::Config`.
    pub fn load(env_file: &Path) -> Result<Self, CoreError> {
        // `dotenvy::from_path_iter` does not mutate the process environment,
        // which keeps repeated loads (e.g. in tests) side-effect free.
        let iter = dotenvy::from_path_iter(env_file).map_err(|e| {
            CoreError::Config(format!(
                "could not read env file {}: {e}",
                env_file.display()
            ))
        })?;

        let mut root_path = None;
        let mut samples_path = None;
        let mut json_path = None;
        let mut bands_path = None;

        for item in iter {
            let (key, value) =
                item.map_err(|e| CoreError::Config(format!("malformed env entry: {e}")))?;
            match key.as_str() {
                KEY_ROOT => root_path = Some(PathBuf::from(value)),
                KEY_SAMPLES => samples_path = Some(PathBuf::from(value)),
                KEY_JSON => json_path = Some(PathBuf::from(value)),
                KEY_BANDS => bands_path = Some(PathBuf::from(value)),
                _ => {}
            }
        }

        let missing = |key: &str| CoreError::Config(format!("missing required key: {key}"));

        Ok(Self {
            root_path: root_path.ok_or_else(|| missing(KEY_ROOT))?,
            samples_path: samples_path.ok_or_else(|| missing(KEY_SAMPLES))?,
            json_path: json_path.ok_or_else(|| missing(KEY_JSON))?,
            bands_path: bands_path.ok_or_else(|| missing(KEY_BANDS))?,
        })
    }

    /// Path for a tile's CS8 sample file.
    pub fn sample_file(&self, tile_index: usize) -> PathBuf {
        self.samples_path.join(tile_index.to_string())
    }

    /// Path for a tile's JSON result file.
    pub fn json_file(&self, tile_index: usize) -> PathBuf {
        self.json_path.join(tile_index.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_all_required_keys() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "ROOT_PATH=/tmp/root").unwrap();
        writeln!(f, "CORE_SAMPLES_PATH=/tmp/samples").unwrap();
        writeln!(f, "CORE_JSON_PATH=/tmp/json").unwrap();
        writeln!(f, "CORE_BANDS_PATH=/tmp/bands.csv").unwrap();

        let cfg = PathConfig::load(f.path()).unwrap();
        assert_eq!(cfg.root_path, PathBuf::from("/tmp/root"));
        assert_eq!(cfg.samples_path, PathBuf::from("/tmp/samples"));
        assert_eq!(cfg.json_path, PathBuf::from("/tmp/json"));
        assert_eq!(cfg.bands_path, PathBuf::from("/tmp/bands.csv"));
        assert_eq!(cfg.sample_file(3), PathBuf::from("/tmp/samples/3"));
        assert_eq!(cfg.json_file(3), PathBuf::from("/tmp/json/3"));
    }

    #[test]
    fn missing_key_is_fatal() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "ROOT_PATH=/tmp/root").unwrap();
        writeln!(f, "CORE_SAMPLES_PATH=/tmp/samples").unwrap();

        let err = PathConfig::load(f.path()).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
