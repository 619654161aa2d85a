//! The driver-agnostic SDR device interface: configure, start a background
//! capture, stop it, close the device.
//!
//! Both the RTL-SDR hardware driver and the synthetic generator implement
//! this so the orchestrator never needs to know which one it holds.

use crate::acquisition::RingProducer;
use crate::error::CoreError;

/// Tuner gain mode, mirroring the teacher's `rtlsdr_source::GainMode`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GainMode {
    Auto,
    Manual(i32),
}

/// Parameters for one tile's capture.
#[derive(Debug, Clone, Copy)]
pub struct DeviceConfig {
    pub center_freq_hz: f64,
    pub sample_rate_hz: f64,
    pub gain_mode: GainMode,
    pub ppm_correction: i32,
}

/// An SDR device: open, tune, stream CS8 bytes into a `RingProducer`, close.
///
/// `start` spawns whatever background work is needed to keep pushing bytes
/// and returns immediately; `stop` must block until that work has quiesced
/// so `close` never races a live USB transfer.
pub trait SdrDevice {
    /// Apply tuning/gain/correction before streaming starts.
    fn configure(&mut self, config: DeviceConfig) -> Result<(), CoreError>;

    /// Begin pushing CS8 bytes into `producer`. Non-blocking.
    fn start(&mut self, producer: RingProducer) -> Result<(), CoreError>;

    /// Stop streaming and wait for the background worker to exit.
    fn stop(&mut self) -> Result<(), CoreError>;

    /// Release the underlying device handle.
    fn close(&mut self) -> Result<(), CoreError>;
}
