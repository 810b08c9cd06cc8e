//! Trait definition for the engine module.

use async_trait::async_trait;

use crate::shutdown::Shutdown;

use super::error::EngineError;
use super::invocation::EngineInvocation;
use super::types::CapturedOutput;

/// An external transcoding engine that can execute invocations.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Runs one invocation to completion and returns its merged output.
    ///
    /// The result is not returned until both output streams are fully
    /// drained. When the shutdown signal fires, whether before or after
    /// process start, the run aborts with [`EngineError::Cancelled`].
    async fn run(
        &self,
        invocation: EngineInvocation,
        shutdown: &Shutdown,
    ) -> Result<CapturedOutput, EngineError>;
}
