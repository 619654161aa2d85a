//! Frequency plan: tiling a scan range into contiguous sample-rate-wide slabs.

/// One sample-rate-wide slab of the scan range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub index: usize,
    pub center_freq_hz: f64,
}

/// Ordered sequence of tiles covering `[lo_freq_hz, hi_freq_hz]` at `sample_rate_hz`.
#[derive(Debug, Clone)]
pub struct FrequencyPlan {
    tiles: Vec<Tile>,
}

impl FrequencyPlan {
    /// Build a plan. `f_c(k) = lo + (k + 0.5) * sample_rate`, with
    /// `tile_count = ceil((hi - lo) / sample_rate)`.
    pub fn new(lo_freq_hz: f64, hi_freq_hz: f64, sample_rate_hz: f64) -> Self {
        assert!(sample_rate_hz > 0.0, "sample rate must be positive");
        assert!(hi_freq_hz >= lo_freq_hz, "hi_freq must be >= lo_freq");

        let span = hi_freq_hz - lo_freq_hz;
        let tile_count = (span / sample_rate_hz).ceil() as usize;
        let tiles = (0..tile_count)
            .map(|k| Tile {
                index: k,
                center_freq_hz: lo_freq_hz + (k as f64 + 0.5) * sample_rate_hz,
            })
            .collect();

        Self { tiles }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
