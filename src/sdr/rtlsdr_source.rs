//! RTL-SDR hardware driver: opens a dongle, tunes it, and streams raw CS8
//! bytes into a `RingProducer` from a background thread.
//!
//! The device is opened and driven entirely on its own thread, exactly as
//! in the original `rtlsdr_source::RtlSdrSource::new` background task, to
//! sidestep the non-`Send` device handle. Enable the `hardware` feature to
//! compile with RTL-SDR support; without it `RtlSdrDevice::new` always
//! returns `CoreError::Device`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::acquisition::RingProducer;
use crate::error::CoreError;
use crate::sdr::device::{DeviceConfig, GainMode, SdrDevice};

/// RTL-SDR requires read sizes that are multiples of 512 bytes (USB packet
/// size); 256 KiB is the size the teacher's background reader used.
const READ_CHUNK_BYTES: usize = 256 * 1024;

#[cfg(feature = "hardware")]
pub struct RtlSdrDevice {
    device_index: u32,
    config: Option<DeviceConfig>,
    stop_flag: Arc<AtomicBool>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

#[cfg(feature = "hardware")]
impl RtlSdrDevice {
    pub fn new(device_index: u32) -> Self {
        Self {
            device_index,
            config: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }
}

#[cfg(feature = "hardware")]
impl SdrDevice for RtlSdrDevice {
    fn configure(&mut self, config: DeviceConfig) -> Result<(), CoreError> {
        // The device handle itself is opened and tuned inside the
        // background thread in `start`, since it is not `Send`; this just
        // stashes the parameters to apply once it exists.
        self.config = Some(config);
        Ok(())
    }

    fn start(&mut self, mut producer: RingProducer) -> Result<(), CoreError> {
        let device_index = self.device_index;
        let config = self
            .config
            .ok_or_else(|| CoreError::Device("start called before configure".to_string()))?;
        let stop_flag = self.stop_flag.clone();
        let (init_tx, init_rx) = std::sync::mpsc::channel::<Result<(), String>>();

        let handle = std::thread::spawn(move || {
            #[allow(clippy::cast_possible_wrap)]
            let mut device = match rtlsdr::open(device_index as i32) {
                Ok(dev) => dev,
                Err(e) => {
                    let _ = init_tx.send(Err(format!(
                        "failed to open RTL-SDR device {device_index}: {e}"
                    )));
                    return;
                }
            };

            if let Err(e) = tune(&mut device, config) {
                let _ = init_tx.send(Err(e.to_string()));
                return;
            }

            let _ = init_tx.send(Ok(()));

            let mut read_count = 0u64;
            while !stop_flag.load(Ordering::Relaxed) {
                match device.read_sync(READ_CHUNK_BYTES) {
                    Ok(buf) => {
                        read_count += 1;
                        if read_count % 1000 == 0 {
                            log::debug!("RTL-SDR read #{read_count}: {} bytes", buf.len());
                        }
                        producer.try_push(&buf);
                    }
                    Err(e) => {
                        log::error!("RTL-SDR read error after {read_count} reads: {e}");
                        break;
                    }
                }
            }
        });

        match init_rx.recv_timeout(std::time::Duration::from_secs(5)) {
            Ok(Ok(())) => {
                self.thread_handle = Some(handle);
                Ok(())
            }
            Ok(Err(msg)) => Err(CoreError::Device(msg)),
            Err(_) => Err(CoreError::Device(
                "RTL-SDR initialization timed out".to_string(),
            )),
        }
    }

    fn stop(&mut self) -> Result<(), CoreError> {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread_handle.take() {
            handle
                .join()
                .map_err(|_| CoreError::Device("RTL-SDR reader thread panicked".to_string()))?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), CoreError> {
        // The device handle is dropped at the end of the background
        // thread's closure, which releases the USB interface.
        Ok(())
    }
}

#[cfg(not(feature = "hardware"))]
pub struct RtlSdrDevice;

#[cfg(not(feature = "hardware"))]
impl RtlSdrDevice {
    pub fn new(_device_index: u32) -> Self {
        Self
    }
}

#[cfg(not(feature = "hardware"))]
impl SdrDevice for RtlSdrDevice {
    fn configure(&mut self, _config: DeviceConfig) -> Result<(), CoreError> {
        Err(CoreError::Device(
            "RTL-SDR hardware support not compiled (enable the `hardware` feature)".to_string(),
        ))
    }

    fn start(&mut self, _producer: RingProducer) -> Result<(), CoreError> {
        Err(CoreError::Device(
            "RTL-SDR hardware support not compiled (enable the `hardware` feature)".to_string(),
        ))
    }

    fn stop(&mut self) -> Result<(), CoreError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Apply center frequency, sample rate, gain, and PPM correction to an
/// opened device, mirroring the setup sequence in `getSamples()`.
#[cfg(feature = "hardware")]
fn tune(device: &mut rtlsdr::RTLSDRDevice, config: DeviceConfig) -> Result<(), CoreError> {
    let center_freq_u32 = config.center_freq_hz as u32;
    let sample_rate_u32 = config.sample_rate_hz as u32;

    device
        .set_center_freq(center_freq_u32)
        .map_err(|e| CoreError::Device(format!("failed to set center frequency: {e}")))?;
    device
        .set_sample_rate(sample_rate_u32)
        .map_err(|e| CoreError::Device(format!("failed to set sample rate: {e}")))?;

    match config.gain_mode {
        GainMode::Auto => device
            .set_tuner_gain_mode(false)
            .map_err(|e| CoreError::Device(format!("failed to set auto gain: {e}")))?,
        GainMode::Manual(tenths_db) => {
            device
                .set_tuner_gain_mode(true)
                .map_err(|e| CoreError::Device(format!("failed to set manual gain mode: {e}")))?;
            device
                .set_tuner_gain(tenths_db)
                .map_err(|e| CoreError::Device(format!("failed to set gain: {e}")))?;
        }
    }

    if config.ppm_correction != 0 {
        device
            .set_freq_correction(config.ppm_correction)
            .map_err(|e| CoreError::Device(format!("failed to set PPM correction: {e}")))?;
    }

    device
        .reset_buffer()
        .map_err(|e| CoreError::Device(format!("failed to reset buffer: {e}")))
}
