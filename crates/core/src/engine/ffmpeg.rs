//! FFmpeg-backed engine implementation.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::shutdown::Shutdown;

use super::config::EngineConfig;
use super::error::EngineError;
use super::invocation::EngineInvocation;
use super::traits::Engine;
use super::types::CapturedOutput;

/// Engine implementation that shells out to ffmpeg and ffprobe.
pub struct FfmpegEngine {
    config: EngineConfig,
}

impl FfmpegEngine {
    /// Creates a new engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Creates an engine with default binary paths.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Drains one output stream line by line into a task-local buffer.
///
/// Bytes are kept exactly as read, including line terminators. With `echo`
/// set, each line is written to the console as it arrives. A read error ends
/// the drain early but keeps what was read so far.
fn drain_stream<R>(stream: R, echo: bool) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buffer = Vec::new();
        loop {
            let line_start = buffer.len();
            match reader.read_until(b'\n', &mut buffer).await {
                Ok(0) => break,
                Ok(_) => {
                    if echo {
                        eprint!("{}", String::from_utf8_lossy(&buffer[line_start..]));
                    }
                }
                Err(e) => {
                    warn!("Engine output stream read failed: {}", e);
                    break;
                }
            }
        }
        buffer
    })
}

#[async_trait]
impl Engine for FfmpegEngine {
    async fn run(
        &self,
        invocation: EngineInvocation,
        shutdown: &Shutdown,
    ) -> Result<CapturedOutput, EngineError> {
        if shutdown.is_triggered() {
            return Err(EngineError::Cancelled);
        }

        let program = self.config.program_path(invocation.program());
        debug!("Running {} {}", program, invocation.args().join(" "));

        let mut child = Command::new(program)
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::BinaryNotFound {
                        path: program.to_string(),
                    }
                } else {
                    EngineError::Io(e)
                }
            })?;

        let stdout = child.stdout.take().expect("stdout should be captured");
        let stderr = child.stderr.take().expect("stderr should be captured");

        let stdout_drain = drain_stream(stdout, invocation.echo());
        let stderr_drain = drain_stream(stderr, invocation.echo());

        let status = tokio::select! {
            status = child.wait() => status?,
            _ = shutdown.wait() => {
                let _ = child.kill().await;
                // Killing closes the pipes, so the drains unblock on
                // end-of-stream.
                let _ = stdout_drain.await;
                let _ = stderr_drain.await;
                return Err(EngineError::Cancelled);
            }
        };

        // Both drains finish on end-of-stream once the process exits, so
        // the merged output is complete after these joins.
        let stdout_bytes = stdout_drain.await.unwrap_or_default();
        let stderr_bytes = stderr_drain.await.unwrap_or_default();
        let output = CapturedOutput::from_streams(stdout_bytes, stderr_bytes);

        if !status.success() {
            return Err(EngineError::failed(status.code(), output));
        }

        Ok(output)
    }
}
