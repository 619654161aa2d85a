//! Main control loop: wires config, band table, frequency plan, and one
//! device through repeated acquire → analyze → encode passes.
//!
//! Sequencing follows `main()` in `Core/main.c`: resolve paths, load the
//! band table once, then loop tiles until the pass count (or the shutdown
//! signal) says to stop, finishing any in-flight tile's analysis before
//! exiting.

use std::time::Duration;

use crate::acquisition::TileOrchestrator;
use crate::band_table::Channel;
use crate::config::PathConfig;
use crate::detector::{detect_channels, noise_floor};
use crate::error::CoreError;
use crate::frequency_plan::FrequencyPlan;
use crate::psd::{postprocess, welch_psd, NPERSEG_LARGE, NPERSEG_SMALL};
use crate::result::{encode, write_atomic, TileResult};
use crate::sample_loader::load_mmap;
use crate::sdr::device::{DeviceConfig, GainMode};
use crate::sdr::SdrDevice;
use crate::signals::ShutdownSignal;

/// Per-tile capture timeout: generous relative to a 40 MB budget at typical
/// USB throughput, so a genuinely stalled device still gets flagged rather
/// than hanging the pass indefinitely.
const TILE_CAPTURE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct RunParams {
    pub sample_rate_hz: f64,
    pub threshold_db: f64,
    pub passes: u32,
    pub fmin_mhz: String,
    pub fmax_mhz: String,
}

/// Run the acquire/analyze/encode loop until `params.passes` full sweeps
/// complete (0 means run until `shutdown` fires), one tile at a time.
pub fn run<D: SdrDevice>(
    device: &mut D,
    paths: &PathConfig,
    plan: &FrequencyPlan,
    channels: &[Channel],
    params: &RunParams,
    shutdown: &ShutdownSignal,
) -> Result<(), CoreError> {
    let mut completed_passes = 0u32;

    loop {
        for tile in plan.tiles() {
            if !shutdown.is_running() {
                log::info!("shutdown requested, stopping before tile {}", tile.index);
                return Ok(());
            }

            if let Err(e) = run_tile(device, paths, tile.index, tile.center_freq_hz, channels, params, shutdown) {
                log::error!("tile {} failed: {e}", tile.index);
            }
        }

        completed_passes += 1;
        if params.passes != 0 && completed_passes >= params.passes {
            break;
        }
        if !shutdown.is_running() {
            break;
        }
    }

    Ok(())
}

fn run_tile<D: SdrDevice>(
    device: &mut D,
    paths: &PathConfig,
    tile_index: usize,
    center_freq_hz: f64,
    channels: &[Channel],
    params: &RunParams,
    shutdown: &ShutdownSignal,
) -> Result<(), CoreError> {
    let sample_path = paths.sample_file(tile_index);
    let sample_rate_hz = params.sample_rate_hz;

    let mut orchestrator = TileOrchestrator::new(device);
    orchestrator.run_tile(
        DeviceConfig {
            center_freq_hz,
            sample_rate_hz,
            gain_mode: GainMode::Auto,
            ppm_correction: 0,
        },
        &sample_path,
        crate::acquisition::DEFAULT_TILE_BUDGET_BYTES,
        shutdown,
        TILE_CAPTURE_TIMEOUT,
    )?;

    let signal = load_mmap(&sample_path)?;

    let mut large = welch_psd(&signal, sample_rate_hz, NPERSEG_LARGE, 0.0)?;
    let mut small = welch_psd(&signal, sample_rate_hz, NPERSEG_SMALL, 0.0)?;

    let f_large_mhz = postprocess(&mut large, center_freq_hz);
    let f_small_mhz = postprocess(&mut small, center_freq_hz);

    let noise = noise_floor(&large.psd);
    let channel_results = detect_channels(channels, &large.psd, &f_large_mhz, noise, params.threshold_db);

    let kappa = crate::psd::calibration_offset(large.psd[0], small.psd[0]);
    let psd_small_db: Vec<f64> = small.psd.iter().map(|&v| crate::psd::to_db(v) + kappa).collect();

    let tile_result = TileResult {
        tile_index,
        center_freq_hz,
        f_bins_mhz: f_small_mhz,
        psd_db: psd_small_db,
        channels: channel_results,
    };

    let doc = encode(&tile_result, &params.fmin_mhz, &params.fmax_mhz);
    write_atomic(&doc, &paths.json_file(tile_index))?;

    log::info!(
        "tile {tile_index} ({:.3} MHz): {} channels evaluated",
        center_freq_hz / 1e6,
        tile_result.channels.len()
    );

    Ok(())
}
