//! Welch's method power spectral density estimator.
//!
//! Segment accumulation, the Hamming window, and the window-power
//! normalization `U` all follow `welch_psd_complex` in `Modules/welch.c`
//! directly; `rustfft` stands in for `fftw` the way the teacher's waterfall
//! pipeline uses `rustfft` for its own spectrum computation.

use std::f64::consts::PI;
use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::CoreError;

/// Result of one Welch estimate: PSD bins in FFT natural order (DC first,
/// ascending then wrapping to negative frequencies) and their bin-spacing
/// frequency offsets, also in natural order.
#[derive(Debug, Clone)]
pub struct PsdEstimate {
    pub psd: Vec<f64>,
    pub freq_offsets_hz: Vec<f64>,
}

fn hamming_window(len: usize) -> Vec<f64> {
    if len == 1 {
        return vec![1.0];
    }
    (0..len)
        .map(|n| 0.54 - 0.46 * ((2.0 * PI * n as f64) / (len as f64 - 1.0)).cos())
        .collect()
}

/// Estimate the PSD of `signal` sampled at `sample_rate_hz`, using segments
/// of `segment_len` with `overlap` (0.0..1.0) fractional overlap between
/// consecutive segments.
///
/// `segment_len` must not exceed `signal.len()`.
pub fn welch_psd(
    signal: &[Complex<f64>],
    sample_rate_hz: f64,
    segment_len: usize,
    overlap: f64,
) -> Result<PsdEstimate, CoreError> {
    if segment_len == 0 || segment_len > signal.len() {
        return Err(CoreError::Compute(format!(
            "segment length {segment_len} exceeds signal length {}",
            signal.len()
        )));
    }

    let step = ((segment_len as f64) * (1.0 - overlap)).round() as usize;
    let step = step.max(1);
    let segment_count = (signal.len() - segment_len) / step + 1;

    let window = hamming_window(segment_len);
    let window_power: f64 = window.iter().map(|w| w * w).sum::<f64>() / segment_len as f64;

    let mut planner = FftPlanner::<f64>::new();
    let fft: Arc<dyn Fft<f64>> = planner.plan_fft_forward(segment_len);

    let mut psd = vec![0.0f64; segment_len];
    let mut scratch = vec![Complex::new(0.0, 0.0); segment_len];

    for k in 0..segment_count {
        let start = k * step;
        for i in 0..segment_len {
            scratch[i] = signal[start + i] * window[i];
        }
        fft.process(&mut scratch);

        for i in 0..segment_len {
            let mag = scratch[i].norm();
            psd[i] += (mag * mag) / (sample_rate_hz * window_power);
        }
    }

    for bin in &mut psd {
        *bin /= segment_count as f64;
    }

    let bin_spacing = sample_rate_hz / segment_len as f64;
    let freq_offsets_hz = (0..segment_len)
        .map(|i| -sample_rate_hz / 2.0 + i as f64 * bin_spacing)
        .collect();

    Ok(PsdEstimate {
        psd,
        freq_offsets_hz,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_longer_than_signal_is_a_compute_error() {
        let signal = vec![Complex::new(1.0, 0.0); 8];
        let err = welch_psd(&signal, 1000.0, 16, 0.0).unwrap_err();
        assert!(matches!(err, CoreError::Compute(_)));
    }

    #[test]
    fn dc_tone_concentrates_power_in_bin_zero() {
        let n = 256;
        let signal: Vec<Complex<f64>> = (0..n * 4).map(|_| Complex::new(1.0, 0.0)).collect();
        let estimate = welch_psd(&signal, 1000.0, n, 0.5).unwrap();
        assert_eq!(estimate.psd.len(), n);

        let dc_power = estimate.psd[0];
        let total: f64 = estimate.psd.iter().sum();
        assert!(dc_power / total > 0.5, "expected DC-dominated spectrum, got {estimate:?}");
    }

    #[test]
    fn frequency_offsets_span_plus_minus_half_sample_rate() {
        let signal = vec![Complex::new(0.0, 0.0); 64];
        let estimate = welch_psd(&signal, 100.0, 16, 0.0).unwrap();
        assert_eq!(estimate.freq_offsets_hz[0], -50.0);
        assert_eq!(estimate.freq_offsets_hz.len(), 16);
    }
}
