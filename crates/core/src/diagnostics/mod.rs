//! Structured extraction from engine diagnostic text.
//!
//! The engine reports measurements as free text interleaved with banner
//! noise. Each extractor here handles one expected shape, works over plain
//! `&str` and never runs the engine itself.

mod duration;
mod error;
mod loudnorm;
mod volume;

pub(crate) use duration::parse_clock_time;
pub use duration::parse_duration;
pub use error::ParseError;
pub use loudnorm::{parse_loudnorm_stats, LoudnormStats};
pub use volume::{parse_volume_stats, VolumeStats};
