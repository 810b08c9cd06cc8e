//! Loudness normalization workflows.
//!
//! A [`Normalizer`] chains engine passes into complete jobs: two-pass EBU
//! R128 loudness correction followed by peak restoration for
//! [`normalize_file`], a volume analysis for [`analyze`], and a plain wav
//! conversion for [`convert_wav`]. Artifact naming lives in [`FileJob`].
//!
//! [`normalize_file`]: Normalizer::normalize_file
//! [`analyze`]: Normalizer::analyze
//! [`convert_wav`]: Normalizer::convert_wav

mod artifacts;
mod error;
mod filters;
mod pipeline;

pub use artifacts::FileJob;
pub use error::NormalizeError;
pub use pipeline::Normalizer;
