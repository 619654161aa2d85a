//! Band table: the ordered list of channels a pass evaluates for occupancy.
//!
//! Parsed from a CSV with a header line and `center_MHz,bandwidth_MHz` rows,
//! the way the teacher loads aircraft/airport reference data with the `csv`
//! crate in `aircraft_db.rs`.

use std::path::Path;

use serde::Deserialize;

use crate::error::CoreError;

/// A single channel definition: a named center frequency and its bandwidth.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Channel {
    pub center_mhz: f64,
    pub bandwidth_mhz: f64,
}

/// Load the band table from a CSV file.
///
/// Blank rows are skipped. The first malformed row truncates the table —
/// everything parsed before it is kept, and the row index is reported.
pub fn load_band_table(path: &Path) -> Result<Vec<Channel>, CoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| CoreError::Format(format!("failed to open band table {}: {e}", path.display())))?;

    let mut channels = Vec::new();

    for (row_index, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                return Ok(truncate_with_warning(channels, row_index, &e.to_string()));
            }
        };

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        match parse_row(&record) {
            Some(channel) => channels.push(channel),
            None => {
                return Ok(truncate_with_warning(
                    channels,
                    row_index,
                    &format!("malformed row: {record:?}"),
                ));
            }
        }
    }

    Ok(channels)
}

fn parse_row(record: &csv::StringRecord) -> Option<Channel> {
    let center_mhz: f64 = record.get(0)?.parse().ok()?;
    let bandwidth_mhz: f64 = record.get(1)?.parse().ok()?;
    Some(Channel {
        center_mhz,
        bandwidth_mhz,
    })
}

fn truncate_with_warning(channels: Vec<Channel>, row_index: usize, detail: &str) -> Vec<Channel> {
    log::warn!("band table truncated at row {row_index}: {detail}");
    channels
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_ordered_channels() {
        let f = write_csv("center_MHz,bandwidth_MHz\n100.3,0.2\n101.1,0.15\n");
        let channels = load_band_table(f.path()).unwrap();
        assert_eq!(
            channels,
            vec![
                Channel {
                    center_mhz: 100.3,
                    bandwidth_mhz: 0.2
                },
                Channel {
                    center_mhz: 101.1,
                    bandwidth_mhz: 0.15
                },
            ]
        );
    }

    #[test]
    fn skips_blank_rows() {
        let f = write_csv("center_MHz,bandwidth_MHz\n100.3,0.2\n\n101.1,0.15\n");
        let channels = load_band_table(f.path()).unwrap();
        assert_eq!(channels.len(), 2);
    }

    #[test]
    fn truncates_at_first_malformed_row() {
        let f = write_csv("center_MHz,bandwidth_MHz\n100.3,0.2\nNOT_A_NUMBER,0.15\n102.0,0.1\n");
        let channels = load_band_table(f.path()).unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].center_mhz, 100.3);
    }

    #[test]
    fn empty_table_is_valid() {
        let f = write_csv("center_MHz,bandwidth_MHz\n");
        let channels = load_band_table(f.path()).unwrap();
        assert!(channels.is_empty());
    }
}
