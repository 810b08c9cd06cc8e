//! Process execution for the external transcoding engine.
//!
//! This module describes one engine run as an immutable [`EngineInvocation`]
//! and executes it through the [`Engine`] trait. The ffmpeg implementation
//! spawns the binary with both output streams piped, drains them
//! concurrently into per-stream buffers and merges them into a single
//! [`CapturedOutput`] once the process exits. Runs are cancelled
//! cooperatively through [`Shutdown`].
//!
//! [`Shutdown`]: crate::shutdown::Shutdown

mod config;
mod error;
mod ffmpeg;
mod invocation;
mod traits;
mod types;

pub use config::EngineConfig;
pub use error::EngineError;
pub use ffmpeg::FfmpegEngine;
pub use invocation::{EngineInvocation, InvocationBuilder};
pub use traits::Engine;
pub use types::{CapturedOutput, EngineProgram};
