//! Filter expressions for the normalization passes.

use crate::diagnostics::LoudnormStats;

/// Filter for the loudness measurement pass.
pub(crate) const LOUDNORM_MEASURE_FILTER: &str = "loudnorm=print_format=json";

/// Filter for the volume analysis pass.
pub(crate) const VOLUMEDETECT_FILTER: &str = "volumedetect";

/// Builds the corrective loudnorm filter from a measurement pass.
///
/// The measured input fields are spliced in exactly as the engine printed
/// them; reformatting them would change what the second pass corrects for.
pub(crate) fn loudnorm_apply_filter(stats: &LoudnormStats) -> String {
    format!(
        "loudnorm=linear=true:measured_I={}:measured_LRA={}:measured_tp={}:measured_thresh={}:print_format=json",
        stats.input_i, stats.input_lra, stats.input_tp, stats.input_thresh
    )
}

/// Gain in dB that brings the measured peak up to 0 dBFS.
///
/// Written as a subtraction so a zero peak yields plain zero rather than
/// negative zero.
pub(crate) fn peak_gain_db(peak_db: f64) -> f64 {
    0.0 - peak_db
}

/// Builds the volume filter applying a decibel gain.
pub(crate) fn volume_filter(gain_db: f64) -> String {
    format!("volume={}dB", gain_db)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> LoudnormStats {
        LoudnormStats {
            input_i: "-27.61".to_string(),
            input_tp: "-4.47".to_string(),
            input_lra: "18.06".to_string(),
            input_thresh: "-39.20".to_string(),
            output_i: "-24.58".to_string(),
            output_tp: "-6.34".to_string(),
            output_lra: "17.14".to_string(),
            output_thresh: "-35.88".to_string(),
            normalization_type: "dynamic".to_string(),
            target_offset: "0.58".to_string(),
        }
    }

    #[test]
    fn test_apply_filter_splices_measured_fields_verbatim() {
        assert_eq!(
            loudnorm_apply_filter(&stats()),
            "loudnorm=linear=true:measured_I=-27.61:measured_LRA=18.06:\
             measured_tp=-4.47:measured_thresh=-39.20:print_format=json"
        );
    }

    #[test]
    fn test_peak_gain_is_the_additive_inverse() {
        assert_eq!(peak_gain_db(-3.0), 3.0);
        assert_eq!(peak_gain_db(2.5), -2.5);
    }

    #[test]
    fn test_peak_gain_near_zero_stays_near_zero() {
        assert_eq!(peak_gain_db(0.0), 0.0);
        assert_eq!(peak_gain_db(-0.01), 0.01);
    }

    #[test]
    fn test_volume_filter_formatting() {
        assert_eq!(volume_filter(3.0), "volume=3dB");
        assert_eq!(volume_filter(-1.5), "volume=-1.5dB");
        assert_eq!(volume_filter(peak_gain_db(0.0)), "volume=0dB");
    }
}
