//! Result document model and the write-then-rename JSON encoder.
//!
//! Field layout matches `create_signal_json` in `Modules/parameter.c`
//! exactly: a `data` object carrying `band`/`fmin`/`fmax`/`units`/`measure`
//! metadata, a `vectors` object with parallel `f`/`Pxx` arrays rounded to
//! three decimal places, and a `parameters` array of per-channel results.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::detector::ChannelOccupancy;
use crate::error::CoreError;

#[derive(Debug, Clone, Serialize)]
pub struct ChannelResult {
    pub center_mhz: f64,
    pub bandwidth_mhz: f64,
    pub power_median_db: f64,
    pub power_max_db: f64,
    pub snr_db: f64,
    pub present: bool,
}

impl From<ChannelOccupancy> for ChannelResult {
    fn from(c: ChannelOccupancy) -> Self {
        Self {
            center_mhz: round3(c.center_mhz),
            bandwidth_mhz: round3(c.bandwidth_mhz),
            power_median_db: round3(c.power_median_db),
            power_max_db: round3(c.power_max_db),
            snr_db: round3(c.snr_db),
            present: c.present,
        }
    }
}

/// One tile's full result: its published (low-resolution) PSD and the
/// per-channel occupancy decisions drawn from the high-resolution pass.
#[derive(Debug, Clone)]
pub struct TileResult {
    pub tile_index: usize,
    pub center_freq_hz: f64,
    pub f_bins_mhz: Vec<f64>,
    pub psd_db: Vec<f64>,
    pub channels: Vec<ChannelOccupancy>,
}

#[derive(Serialize)]
struct Vectors {
    f: Vec<f64>,
    #[serde(rename = "Pxx")]
    pxx: Vec<f64>,
}

#[derive(Serialize)]
struct DataBody {
    band: &'static str,
    fmin: String,
    fmax: String,
    units: &'static str,
    measure: &'static str,
    vectors: Vectors,
    parameters: Vec<ChannelResult>,
}

#[derive(Serialize)]
struct ResultDocument {
    data: DataBody,
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Render `result` into the fixed JSON document shape.
pub fn encode(result: &TileResult, fmin_mhz: &str, fmax_mhz: &str) -> ResultJson {
    let f = result.f_bins_mhz.iter().map(|v| round3(*v)).collect();
    let pxx = result.psd_db.iter().map(|v| round3(*v)).collect();
    let parameters = result
        .channels
        .iter()
        .cloned()
        .map(ChannelResult::from)
        .collect();

    ResultJson(ResultDocument {
        data: DataBody {
            band: "VHF",
            fmin: fmin_mhz.to_string(),
            fmax: fmax_mhz.to_string(),
            units: "MHz",
            measure: "RMER",
            vectors: Vectors { f, pxx },
            parameters,
        },
    })
}

/// Opaque wrapper so callers can't construct a document bypassing `encode`.
pub struct ResultJson(ResultDocument);

/// Write `doc` to `path` atomically: serialize to a `.tmp` sibling, flush,
/// then `rename` over the destination so readers never observe a partial
/// write, matching `save_json_to_file`'s all-or-nothing intent in
/// `Modules/parameter.c` (there achieved by a single `fwrite`; here by the
/// filesystem rename instead, since Rust's `serde_json` writer can't offer
/// the same single-syscall guarantee).
pub fn write_atomic(doc: &ResultJson, path: &Path) -> Result<(), CoreError> {
    let tmp_path = path.with_extension("tmp");
    let mut file = File::create(&tmp_path).map_err(|e| CoreError::io(tmp_path.clone(), e))?;
    let json = serde_json::to_string_pretty(&doc.0)
        .map_err(|e| CoreError::Format(format!("failed to serialize result: {e}")))?;
    file.write_all(json.as_bytes())
        .map_err(|e| CoreError::io(tmp_path.clone(), e))?;
    file.flush().map_err(|e| CoreError::io(tmp_path.clone(), e))?;
    drop(file);

    std::fs::rename(&tmp_path, path).map_err(|e| CoreError::io(path.to_path_buf(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> TileResult {
        TileResult {
            tile_index: 0,
            center_freq_hz: 98_000_000.0,
            f_bins_mhz: vec![88.0001, 98.00049],
            psd_db: vec![-40.12349, -30.0],
            channels: vec![ChannelOccupancy {
                center_mhz: 98.3,
                bandwidth_mhz: 0.2,
                power_median_db: -35.5,
                power_max_db: -20.0001,
                snr_db: 12.0,
                present: true,
            }],
        }
    }

    #[test]
    fn rounds_to_three_decimal_places() {
        let doc = encode(&sample_result(), "88", "108");
        let json = serde_json::to_value(&doc.0).unwrap();
        assert_eq!(json["data"]["vectors"]["f"][0], 88.0);
        assert_eq!(json["data"]["vectors"]["f"][1], 98.0);
        assert_eq!(json["data"]["vectors"]["Pxx"][0], -40.123);
        assert_eq!(json["data"]["parameters"][0]["power_max_db"], -20.0);
    }

    #[test]
    fn write_atomic_leaves_no_tmp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0");
        let doc = encode(&sample_result(), "88", "108");
        write_atomic(&doc, &path).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"band\""));
    }
}
