//! Volume statistics extraction from volumedetect output.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::error::ParseError;

static DB_READING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r": (-?\d{1,2}\.\d{1,2}) dB").unwrap());

/// Mean and peak volume of one input, in decibels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeStats {
    /// Mean volume across the whole signal.
    pub mean_db: f64,
    /// Highest sample level.
    pub peak_db: f64,
}

/// Extracts the two decibel readings a volumedetect pass reports.
///
/// The filter prints its `mean_volume` line before `max_volume`, so the
/// first reading in document order is the mean and the second the peak.
/// Any other number of readings is ambiguous and rejected rather than
/// guessed at.
pub fn parse_volume_stats(text: &str) -> Result<VolumeStats, ParseError> {
    let mut readings = Vec::new();
    for caps in DB_READING_RE.captures_iter(text) {
        let token = &caps[1];
        let value: f64 = token.parse().map_err(|_| ParseError::MalformedVolume {
            token: token.to_string(),
        })?;
        readings.push(value);
    }

    match readings[..] {
        [mean_db, peak_db] => Ok(VolumeStats { mean_db, peak_db }),
        _ => Err(ParseError::AmbiguousVolumeStats {
            found: readings.len(),
        }),
    }
}
