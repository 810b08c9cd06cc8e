//! Scripted engine for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::engine::{CapturedOutput, Engine, EngineError, EngineInvocation};
use crate::shutdown::Shutdown;

#[derive(Debug)]
enum ScriptedOutcome {
    Output(String),
    Error(EngineError),
}

/// Engine double driven by a queue of scripted outcomes.
///
/// Each run pops the next outcome and records the invocation for later
/// assertions; an empty queue yields an empty successful output. A
/// successful run with an output path touches that path, so artifact
/// handling can be exercised against a real filesystem.
///
/// Clones share the same queue and recordings, letting a test keep a
/// handle after moving the engine into the code under test.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEngine {
    outcomes: Arc<RwLock<VecDeque<ScriptedOutcome>>>,
    invocations: Arc<RwLock<Vec<EngineInvocation>>>,
}

impl ScriptedEngine {
    /// Creates an engine with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful run producing the given diagnostic text.
    pub async fn push_output(&self, text: impl Into<String>) {
        self.outcomes
            .write()
            .await
            .push_back(ScriptedOutcome::Output(text.into()));
    }

    /// Queues a failed run.
    pub async fn push_error(&self, error: EngineError) {
        self.outcomes
            .write()
            .await
            .push_back(ScriptedOutcome::Error(error));
    }

    /// Every invocation run so far, in order.
    pub async fn recorded_invocations(&self) -> Vec<EngineInvocation> {
        self.invocations.read().await.clone()
    }

    /// Number of runs performed.
    pub async fn run_count(&self) -> usize {
        self.invocations.read().await.len()
    }
}

#[async_trait]
impl Engine for ScriptedEngine {
    async fn run(
        &self,
        invocation: EngineInvocation,
        shutdown: &Shutdown,
    ) -> Result<CapturedOutput, EngineError> {
        if shutdown.is_triggered() {
            return Err(EngineError::Cancelled);
        }

        self.invocations.write().await.push(invocation.clone());

        let outcome = self.outcomes.write().await.pop_front();
        match outcome {
            Some(ScriptedOutcome::Error(error)) => Err(error),
            Some(ScriptedOutcome::Output(text)) => {
                if let Some(output) = invocation.output() {
                    // Best effort; a missing parent directory is the
                    // test's own arrangement to assert on.
                    let _ = tokio::fs::write(output, b"").await;
                }
                Ok(CapturedOutput::from_streams(Vec::new(), text.into_bytes()))
            }
            None => Ok(CapturedOutput::default()),
        }
    }
}
