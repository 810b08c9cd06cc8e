//! Error types for the engine module.

use thiserror::Error;

use super::types::CapturedOutput;

/// Errors that can occur while running the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine binary not found.
    #[error("Engine binary not found at path: {path}")]
    BinaryNotFound { path: String },

    /// The engine exited with a non-zero status.
    #[error("Engine exited with status {code:?}:\n{output}")]
    Failed {
        code: Option<i32>,
        output: CapturedOutput,
    },

    /// The run was cancelled before completion.
    #[error("Engine run cancelled")]
    Cancelled,

    /// I/O error while spawning or draining the engine.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Creates a failure error from an exit code and captured output.
    pub fn failed(code: Option<i32>, output: CapturedOutput) -> Self {
        Self::Failed { code, output }
    }

    /// Whether this error is a cooperative cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
