//! Loudness measurement extraction from loudnorm output.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Deserialize;

use super::error::ParseError;

static STATS_JSON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\{[\w\s:,."-]*\}"#).unwrap());

/// The measurement block a loudnorm pass prints as JSON.
///
/// Values stay the exact decimal strings the engine printed. A corrective
/// pass splices the measured input fields back into its filter expression
/// verbatim, so no numeric round trip is allowed here.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoudnormStats {
    pub input_i: String,
    pub input_tp: String,
    pub input_lra: String,
    pub input_thresh: String,
    pub output_i: String,
    pub output_tp: String,
    pub output_lra: String,
    pub output_thresh: String,
    pub normalization_type: String,
    pub target_offset: String,
}

/// Extracts the first embedded JSON measurement block from diagnostic text.
///
/// The engine interleaves human-readable log lines with one machine-readable
/// JSON object; everything around the braces is noise.
pub fn parse_loudnorm_stats(text: &str) -> Result<LoudnormStats, ParseError> {
    let fragment = STATS_JSON_RE.find(text).ok_or(ParseError::MissingStats)?;
    Ok(serde_json::from_str(fragment.as_str())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOUDNORM_OUTPUT: &str = "\
size=N/A time=00:42:31.89 bitrate=N/A speed= 512x
video:0kB audio:478475kB subtitle:0kB other streams:0kB global headers:0kB muxing overhead: unknown
[Parsed_loudnorm_0 @ 0x558e9ba44800]
{
\t\"input_i\" : \"-27.61\",
\t\"input_tp\" : \"-4.47\",
\t\"input_lra\" : \"18.06\",
\t\"input_thresh\" : \"-39.20\",
\t\"output_i\" : \"-24.58\",
\t\"output_tp\" : \"-6.34\",
\t\"output_lra\" : \"17.14\",
\t\"output_thresh\" : \"-35.88\",
\t\"normalization_type\" : \"dynamic\",
\t\"target_offset\" : \"0.58\"
}
";

    #[test]
    fn test_parses_measurement_block() {
        let stats = parse_loudnorm_stats(LOUDNORM_OUTPUT).unwrap();
        assert_eq!(stats.input_i, "-27.61");
        assert_eq!(stats.input_tp, "-4.47");
        assert_eq!(stats.input_lra, "18.06");
        assert_eq!(stats.input_thresh, "-39.20");
        assert_eq!(stats.output_i, "-24.58");
        assert_eq!(stats.normalization_type, "dynamic");
    }

    #[test]
    fn test_takes_first_block_in_document_order() {
        let second = LOUDNORM_OUTPUT.replace("-27.61", "-99.99");
        let text = format!("{}{}", LOUDNORM_OUTPUT, second);
        let stats = parse_loudnorm_stats(&text).unwrap();
        assert_eq!(stats.input_i, "-27.61");
    }

    #[test]
    fn test_missing_block_fails() {
        let result = parse_loudnorm_stats("size=N/A time=00:42:31.89 bitrate=N/A");
        assert!(matches!(result, Err(ParseError::MissingStats)));
    }

    #[test]
    fn test_incomplete_block_fails() {
        let result = parse_loudnorm_stats("{\"input_i\" : \"-27.61\"}");
        assert!(matches!(result, Err(ParseError::InvalidStats(_))));
    }
}
