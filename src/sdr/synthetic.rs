//! Synthetic device: a tone-plus-noise CS8 generator used in place of
//! hardware for development and the `--synthetic` CLI flag.
//!
//! Not present in the original system; supplements it the way a software
//! loopback source supplements a hardware-only driver, following the same
//! background-thread-plus-ring shape as `rtlsdr_source::RtlSdrDevice`.

use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::acquisition::RingProducer;
use crate::error::CoreError;
use crate::sdr::device::{DeviceConfig, SdrDevice};

const CHUNK_SAMPLES: usize = 4096;

/// Generates a CS8 tone offset from tile center, plus uniform noise, so
/// the channel detector has something to find without hardware attached.
pub struct SyntheticDevice {
    tone_offset_hz: f64,
    config: Option<DeviceConfig>,
    stop_flag: Arc<AtomicBool>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl SyntheticDevice {
    pub fn new(tone_offset_hz: f64) -> Self {
        Self {
            tone_offset_hz,
            config: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }
}

impl SdrDevice for SyntheticDevice {
    fn configure(&mut self, config: DeviceConfig) -> Result<(), CoreError> {
        self.config = Some(config);
        Ok(())
    }

    fn start(&mut self, mut producer: RingProducer) -> Result<(), CoreError> {
        let config = self
            .config
            .ok_or_else(|| CoreError::Device("start called before configure".to_string()))?;
        let stop_flag = self.stop_flag.clone();
        let tone_offset_hz = self.tone_offset_hz;

        let handle = std::thread::spawn(move || {
            let mut phase = 0.0f64;
            let phase_step = 2.0 * PI * tone_offset_hz / config.sample_rate_hz;
            let mut rng_state: u32 = 0x1234_5678;
            let mut buf = vec![0u8; CHUNK_SAMPLES * 2];

            while !stop_flag.load(Ordering::Relaxed) {
                for sample_idx in 0..CHUNK_SAMPLES {
                    let tone_i = 60.0 * phase.cos();
                    let tone_q = 60.0 * phase.sin();
                    phase += phase_step;

                    let noise_i = next_noise(&mut rng_state);
                    let noise_q = next_noise(&mut rng_state);

                    buf[sample_idx * 2] = clamp_i8(tone_i + noise_i) as u8;
                    buf[sample_idx * 2 + 1] = clamp_i8(tone_q + noise_q) as u8;
                }

                producer.try_push(&buf);
                std::thread::sleep(std::time::Duration::from_micros(
                    (CHUNK_SAMPLES as u64 * 1_000_000) / config.sample_rate_hz.max(1.0) as u64,
                ));
            }
        });

        self.thread_handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CoreError> {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread_handle.take() {
            handle
                .join()
                .map_err(|_| CoreError::Device("synthetic device thread panicked".to_string()))?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), CoreError> {
        Ok(())
    }
}

fn next_noise(state: &mut u32) -> f64 {
    // xorshift32, cheap and deterministic enough for a stand-in noise floor.
    *state ^= *state << 13;
    *state ^= *state >> 17;
    *state ^= *state << 5;
    (f64::from(*state % 21) - 10.0) * 0.3
}

fn clamp_i8(value: f64) -> i8 {
    value.round().clamp(i8::MIN as f64, i8::MAX as f64) as i8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::CaptureRing;
    use crate::sdr::device::GainMode;

    #[test]
    fn streams_bytes_until_stopped() {
        let mut device = SyntheticDevice::new(1_000_000.0);
        device
            .configure(DeviceConfig {
                center_freq_hz: 98_000_000.0,
                sample_rate_hz: 2_000_000.0,
                gain_mode: GainMode::Auto,
                ppm_correction: 0,
            })
            .unwrap();

        let (producer, mut consumer) = CaptureRing::new(1 << 16);
        device.start(producer).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(50));
        device.stop().unwrap();

        assert!(consumer.bytes_in_flight() > 0);
    }
}
