//! Power spectral density engine: Welch estimation plus the spectral
//! post-processing applied to each tile's two resolutions.

pub mod postprocess;
pub mod welch;

pub use postprocess::{apply_dc_spike_correction, calibration_offset, postprocess, rearrange_centered, to_absolute_mhz, to_db};
pub use welch::{welch_psd, PsdEstimate};

/// Segment length for the high-resolution (detection) PSD pass, matching
/// `nperseg_large` in `Modules/parameter.c`.
pub const NPERSEG_LARGE: usize = 32_768;

/// Segment length for the low-resolution (published) PSD pass, matching
/// `nperseg_small`.
pub const NPERSEG_SMALL: usize = 4_096;
