//! Duration extraction from engine banner output.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::error::ParseError;

static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Duration: (\d{2}:\d{2}:\d{2}\.\d{1,3}),").unwrap());

/// Extracts the media duration in seconds from diagnostic text.
///
/// The engine prints one `Duration: HH:MM:SS.fff,` line per input as part
/// of its banner. Surrounding text is ignored; a missing or malformed line
/// is an error.
pub fn parse_duration(text: &str) -> Result<f64, ParseError> {
    let caps = DURATION_RE
        .captures(text)
        .ok_or(ParseError::MissingDuration)?;
    let token = &caps[1];
    parse_clock_time(token).ok_or_else(|| ParseError::MalformedDuration {
        token: token.to_string(),
    })
}

/// Parses a `HH:MM:SS.fraction` clock value into seconds.
///
/// Shared with the progress server, whose `out_time` records carry the
/// same shape.
pub(crate) fn parse_clock_time(token: &str) -> Option<f64> {
    let mut parts = token.splitn(3, ':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}
