//! Channel occupancy detector: for each band-table entry, find its bin
//! range in the high-resolution PSD and decide whether a signal is present.
//!
//! Nearest-neighbor search, median/max over the range, and the threshold
//! comparison against `10*log10(power_max)` all follow the per-channel loop
//! in `process_signal_spectrum` (`Modules/parameter.c`) directly.

use crate::band_table::Channel;
use crate::psd::to_db;

/// Result of evaluating one band-table channel against a tile's PSD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelOccupancy {
    pub center_mhz: f64,
    pub bandwidth_mhz: f64,
    pub power_median_db: f64,
    pub power_max_db: f64,
    pub snr_db: f64,
    pub present: bool,
}

/// Nearest index to `target` in `freq_mhz`. Ties resolve to the lower index,
/// matching `find_closest_index`'s strict `<` comparison (a later equal
/// difference never replaces the first match).
fn find_closest_index(freq_mhz: &[f64], target: f64) -> usize {
    let mut min_index = 0;
    let mut min_diff = (freq_mhz[0] - target).abs();
    for (i, &f) in freq_mhz.iter().enumerate().skip(1) {
        let diff = (f - target).abs();
        if diff < min_diff {
            min_diff = diff;
            min_index = i;
        }
    }
    min_index
}

fn median_linear(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let len = values.len();
    if len % 2 == 0 {
        (values[len / 2 - 1] + values[len / 2]) * 0.5
    } else {
        values[len / 2]
    }
}

/// Evaluate every channel in `channels` against `psd_large` (linear power)
/// and `freq_mhz` (absolute frequency per bin, same length as `psd_large`),
/// using `noise_floor` (the global minimum of `psd_large`) and
/// `threshold_db` for presence detection.
pub fn detect_channels(
    channels: &[Channel],
    psd_large: &[f64],
    freq_mhz: &[f64],
    noise_floor: f64,
    threshold_db: f64,
) -> Vec<ChannelOccupancy> {
    channels
        .iter()
        .map(|channel| {
            let lower_target = channel.center_mhz - channel.bandwidth_mhz / 2.0;
            let upper_target = channel.center_mhz + channel.bandwidth_mhz / 2.0;

            let mut lower_index = find_closest_index(freq_mhz, lower_target);
            let mut upper_index = find_closest_index(freq_mhz, upper_target);
            if lower_index > upper_index {
                std::mem::swap(&mut lower_index, &mut upper_index);
            }

            let mut range: Vec<f64> = psd_large[lower_index..=upper_index].to_vec();
            let power_max = range.iter().cloned().fold(f64::MIN, f64::max);
            let power_median = median_linear(&mut range);

            // Guard against a zero (or otherwise non-positive) noise floor
            // rather than dividing into it, per the PSD Engine's -200 dB
            // sentinel convention for a non-positive log10 argument.
            let snr_db = if noise_floor > 0.0 {
                to_db(power_max / noise_floor)
            } else {
                to_db(power_max)
            };
            let power_max_db = to_db(power_max);
            let present = power_max_db > threshold_db;

            ChannelOccupancy {
                center_mhz: channel.center_mhz,
                bandwidth_mhz: channel.bandwidth_mhz,
                power_median_db: to_db(power_median),
                power_max_db,
                snr_db,
                present,
            }
        })
        .collect()
}

/// Global noise floor: the minimum value of the high-resolution linear PSD.
pub fn noise_floor(psd_large: &[f64]) -> f64 {
    psd_large.iter().cloned().fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_neighbor_ties_prefer_lower_index() {
        let freq = vec![0.0, 1.0, 2.0, 3.0];
        // 1.5 is equidistant between index 1 and 2; the first minimum found wins.
        assert_eq!(find_closest_index(&freq, 1.5), 1);
    }

    #[test]
    fn detects_presence_above_threshold() {
        let channels = vec![Channel {
            center_mhz: 100.0,
            bandwidth_mhz: 0.2,
        }];
        let freq_mhz: Vec<f64> = (0..200).map(|i| 90.0 + i as f64 * 0.1).collect();
        let mut psd = vec![1e-6; freq_mhz.len()];
        let peak_idx = freq_mhz
            .iter()
            .position(|&f| (f - 100.0).abs() < 0.05)
            .unwrap();
        psd[peak_idx] = 1.0;

        let noise = noise_floor(&psd);
        let result = detect_channels(&channels, &psd, &freq_mhz, noise, -30.0);
        assert_eq!(result.len(), 1);
        assert!(result[0].present);
    }

    #[test]
    fn absent_below_threshold() {
        let channels = vec![Channel {
            center_mhz: 100.0,
            bandwidth_mhz: 0.2,
        }];
        let freq_mhz: Vec<f64> = (0..200).map(|i| 90.0 + i as f64 * 0.1).collect();
        let psd = vec![1e-9; freq_mhz.len()];

        let noise = noise_floor(&psd);
        let result = detect_channels(&channels, &psd, &freq_mhz, noise, -30.0);
        assert!(!result[0].present);
    }
}
