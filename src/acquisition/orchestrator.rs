//! Tile orchestrator: drives one tile's capture from device open through
//! sample file close.
//!
//! Sequencing follows `getSamples()` in `Drivers/bacn_RF.c`: open the sample
//! file, open and configure the device, stream until the byte budget is hit
//! (or shutdown is requested), stop, close, and validate that something was
//! actually captured.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::acquisition::ring::CaptureRing;
use crate::acquisition::sink::SampleSink;
use crate::error::CoreError;
use crate::sdr::device::{DeviceConfig, SdrDevice};
use crate::signals::ShutdownSignal;

/// Ring capacity in bytes: roughly 400ms of CS8 samples at a 20 Msps tile
/// width, matching the scale of the teacher's 1M-sample ring in
/// `sdr/rtlsdr_source.rs`.
const RING_CAPACITY_BYTES: usize = 1024 * 1024;

/// How long to sleep between empty drains while waiting for more bytes.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Drives a single device through one tile's capture.
pub struct TileOrchestrator<'a, D: SdrDevice> {
    device: &'a mut D,
}

impl<'a, D: SdrDevice> TileOrchestrator<'a, D> {
    pub fn new(device: &'a mut D) -> Self {
        Self { device }
    }

    /// Capture one tile to `sink_path`, stopping at `budget_bytes` or when
    /// `shutdown` reports a request, whichever happens first. Returns the
    /// number of bytes actually captured, or an error if none were.
    pub fn run_tile(
        &mut self,
        config: DeviceConfig,
        sink_path: &Path,
        budget_bytes: u64,
        shutdown: &ShutdownSignal,
        timeout: Duration,
    ) -> Result<u64, CoreError> {
        let mut sink = SampleSink::create(sink_path, budget_bytes)?;
        let (producer, mut consumer) = CaptureRing::new(RING_CAPACITY_BYTES);

        self.device.configure(config)?;
        self.device.start(producer)?;

        let started = Instant::now();
        while !sink.is_complete() && shutdown.is_running() {
            if started.elapsed() > timeout {
                log::warn!(
                    "tile capture at {:.3} MHz timed out after {:?}",
                    config.center_freq_hz / 1e6,
                    timeout
                );
                break;
            }

            let drained = consumer
                .drain_into(&mut sink)
                .map_err(|e| CoreError::io(sink_path.to_path_buf(), e))?;

            if drained == 0 {
                std::thread::sleep(POLL_INTERVAL);
            }
        }

        self.device.stop()?;
        self.device.close()?;

        // Drain whatever arrived between the last poll and the driver thread
        // actually stopping.
        let _ = consumer.drain_into(&mut sink);

        let delivered = sink.finish(sink_path)?;
        if delivered == 0 {
            return Err(CoreError::Device(format!(
                "tile at {:.3} MHz produced no samples",
                config.center_freq_hz / 1e6
            )));
        }

        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::RingProducer;

    struct StubDevice {
        configured: bool,
        started: bool,
        bytes: Vec<u8>,
    }

    impl SdrDevice for StubDevice {
        fn configure(&mut self, _config: DeviceConfig) -> Result<(), CoreError> {
            self.configured = true;
            Ok(())
        }

        fn start(&mut self, mut producer: RingProducer) -> Result<(), CoreError> {
            self.started = true;
            producer.try_push(&self.bytes);
            Ok(())
        }

        fn stop(&mut self) -> Result<(), CoreError> {
            Ok(())
        }

        fn close(&mut self) -> Result<(), CoreError> {
            Ok(())
        }
    }

    #[test]
    fn captures_bytes_pushed_synchronously_at_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0");
        let mut device = StubDevice {
            configured: false,
            started: false,
            bytes: vec![7u8; 16],
        };
        let shutdown = ShutdownSignal::new();
        let config = DeviceConfig {
            center_freq_hz: 98_000_000.0,
            sample_rate_hz: 20_000_000.0,
            gain_mode: crate::sdr::device::GainMode::Auto,
            ppm_correction: 0,
        };

        let mut orchestrator = TileOrchestrator::new(&mut device);
        let delivered = orchestrator
            .run_tile(config, &path, 16, &shutdown, Duration::from_millis(200))
            .unwrap();

        assert_eq!(delivered, 16);
        assert!(device.configured);
        assert!(device.started);
    }

    #[test]
    fn zero_bytes_delivered_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0");
        let mut device = StubDevice {
            configured: false,
            started: false,
            bytes: vec![],
        };
        let shutdown = ShutdownSignal::new();
        shutdown.request_shutdown();
        let config = DeviceConfig {
            center_freq_hz: 98_000_000.0,
            sample_rate_hz: 20_000_000.0,
            gain_mode: crate::sdr::device::GainMode::Auto,
            ppm_correction: 0,
        };

        let mut orchestrator = TileOrchestrator::new(&mut device);
        let err = orchestrator
            .run_tile(config, &path, 16, &shutdown, Duration::from_millis(200))
            .unwrap_err();
        assert!(matches!(err, CoreError::Device(_)));
    }
}
