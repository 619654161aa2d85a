//! Spectral post-processing: centered rearrangement, DC-spike masking,
//! absolute-frequency mapping, and the dual-resolution calibration offset.
//!
//! Every constant here is preserved verbatim from `Modules/parameter.c`
//! (`rearrange_welch_psd`, `apply_spectral_correction`,
//! `process_signal_spectrum`'s calibration line) rather than re-derived —
//! see DESIGN.md for the open question this leaves unresolved.

use crate::psd::welch::PsdEstimate;

/// `correction_width` in the original is `(int)(nperseg * 0.002)` — about
/// 0.2% of the segment either side of center.
pub const CORRECTION_WIDTH_FRACTION: f64 = 0.002;

/// Swap the PSD array's two halves in place, turning FFT natural order
/// (DC first, ascending then wrapping negative) into frequency-ascending
/// order (most negative frequency first). Requires an even-length slice.
pub fn rearrange_centered(psd: &mut [f64]) {
    debug_assert_eq!(psd.len() % 2, 0, "PSD length must be even to rearrange");
    let half = psd.len() / 2;
    let (first, second) = psd.split_at_mut(half);
    first.swap_with_slice(second);
}

/// Mask the DC spike around `center_index` by copying bins from just
/// outside the correction window, exactly as `apply_spectral_correction`
/// does: offset 13 bins out, stride 3 going left of center, stride 2 going
/// right of center. This is a direct port, not a redesign.
pub fn apply_dc_spike_correction(psd: &mut [f64], center_index: usize, correction_width: usize) {
    let len = psd.len() as isize;
    let center_index = center_index as isize;
    let correction_width = correction_width as isize;

    if len <= 0 || center_index < 0 || center_index >= len || correction_width <= 0 {
        return;
    }

    let mut a = center_index;
    let mut b = center_index - (correction_width + 13);
    for _ in 0..correction_width {
        b -= 3;
        if b >= 0 && a >= 0 && a < len {
            psd[a as usize] = psd[b as usize];
            a -= 1;
        }
    }

    let mut a = center_index;
    let mut b = center_index - (correction_width + 13);
    for _ in 0..correction_width {
        if a >= 0 && a < len && b >= 0 && b < len {
            psd[a as usize] = psd[b as usize];
            a += 1;
            b -= 2;
        }
    }
}

/// Map bin-spacing frequency offsets (centered on 0) to absolute frequencies
/// in MHz, given the tile's center frequency in Hz.
pub fn to_absolute_mhz(freq_offsets_hz: &[f64], center_freq_hz: f64) -> Vec<f64> {
    freq_offsets_hz
        .iter()
        .map(|offset| (offset + center_freq_hz) / 1e6)
        .collect()
}

/// `10 * log10(x)`, with `x <= 0` mapped to a -200 dB sentinel rather than
/// `-inf`/`NaN`, since a floored-out PSD bin is a legitimate (if
/// uninformative) value, not a computation failure.
pub fn to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        -200.0
    } else {
        10.0 * linear.log10()
    }
}

/// Calibration offset between a tile's two PSD resolutions, preserved
/// verbatim as `|db(large[0])| - |db(small[0])|`'s absolute value from
/// `process_signal_spectrum` — not `db(large[0]/small[0])`, an asymmetry
/// flagged as an open question in DESIGN.md.
pub fn calibration_offset(psd_large_bin0: f64, psd_small_bin0: f64) -> f64 {
    (to_db(psd_large_bin0).abs() - to_db(psd_small_bin0).abs()).abs()
}

/// Apply the full rearrange + DC-correction + absolute-frequency pipeline
/// to a raw Welch estimate, in place, for one tile's PSD at one resolution.
pub fn postprocess(estimate: &mut PsdEstimate, center_freq_hz: f64) -> Vec<f64> {
    rearrange_centered(&mut estimate.psd);
    rearrange_centered(&mut estimate.freq_offsets_hz);

    let center_index = estimate.psd.len() / 2;
    let correction_width = ((estimate.psd.len() as f64) * CORRECTION_WIDTH_FRACTION) as usize;
    apply_dc_spike_correction(&mut estimate.psd, center_index, correction_width);

    to_absolute_mhz(&estimate.freq_offsets_hz, center_freq_hz)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rearrange_swaps_halves() {
        let mut psd = vec![1.0, 2.0, 3.0, 4.0];
        rearrange_centered(&mut psd);
        assert_eq!(psd, vec![3.0, 4.0, 1.0, 2.0]);
    }

    #[test]
    fn dc_correction_is_a_noop_outside_bounds() {
        let mut psd = vec![1.0, 2.0, 3.0];
        apply_dc_spike_correction(&mut psd, 10, 1);
        assert_eq!(psd, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn to_db_floors_nonpositive_values() {
        assert_eq!(to_db(0.0), -200.0);
        assert_eq!(to_db(-5.0), -200.0);
        assert!((to_db(1.0) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn calibration_offset_is_symmetric_in_inputs() {
        let a = calibration_offset(2.0, 1.0);
        let b = calibration_offset(1.0, 2.0);
        assert!((a - b).abs() < 1e-9);
    }
}
