//! Live transcode progress, from engine telemetry to terminal rendering.
//!
//! The engine streams `key=value` records to whatever address it was given
//! on the command line. [`ProgressServer`] listens on an ephemeral local
//! port, translates the records into [`ProgressEvent`]s and pushes them
//! into a channel; [`ProgressDisplay`] consumes the channel and drives a
//! terminal progress bar until completion or cancellation.

mod display;
mod server;

pub use display::{DisplayState, ProgressDisplay, ProgressTracker};
pub use server::ProgressServer;

/// One typed progress update from the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Elapsed output time in seconds.
    ElapsedTime(f64),
    /// The engine reported the end of the run.
    Completed,
    /// A record that should carry progress but did not parse.
    Unparseable(String),
}
