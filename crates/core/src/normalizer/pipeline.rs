//! The normalization pipeline stages.

use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::diagnostics::{
    parse_duration, parse_loudnorm_stats, parse_volume_stats, LoudnormStats, VolumeStats,
};
use crate::engine::{CapturedOutput, Engine, EngineInvocation, InvocationBuilder};
use crate::progress::{ProgressDisplay, ProgressServer};
use crate::shutdown::Shutdown;

use super::artifacts::FileJob;
use super::error::NormalizeError;
use super::filters;

/// Null sink for passes that measure without keeping their encode.
const NULL_SINK: &str = "/dev/null";

/// Capacity of the per-pass progress event channel.
const PROGRESS_CHANNEL_SIZE: usize = 64;

/// Drives the engine through the normalization workflows.
///
/// One normalizer handles any number of files. Stages for one file run
/// strictly in sequence; a batch keeps going past individual failures and
/// stops only on cancellation.
pub struct Normalizer<E> {
    engine: E,
    echo: bool,
    show_progress: bool,
}

impl<E: Engine> Normalizer<E> {
    /// Creates a normalizer over the given engine.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            echo: false,
            show_progress: false,
        }
    }

    /// Echo engine output as it is read.
    ///
    /// Echoing wins over the progress bar; both writing to the terminal at
    /// once garbles it.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Render a live progress bar for each engine pass.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn interactive(&self) -> bool {
        self.show_progress && !self.echo
    }

    /// Normalizes a batch of files sequentially.
    ///
    /// The outcome is reported per input path. One file's failure does not
    /// stop the batch; cancellation does.
    pub async fn normalize_batch(
        &self,
        inputs: &[PathBuf],
        shutdown: &Shutdown,
    ) -> Vec<(PathBuf, Result<PathBuf, NormalizeError>)> {
        let mut results = Vec::with_capacity(inputs.len());
        for input in inputs {
            let result = self.normalize_file(input, shutdown).await;
            let cancelled = matches!(&result, Err(e) if e.is_cancelled());
            results.push((input.clone(), result));
            if cancelled {
                break;
            }
        }
        results
    }

    /// Runs the full chain for one file, producing `<stem>.normalized.mkv`.
    ///
    /// Stages: two-pass loudness correction into an intermediate, volume
    /// analysis of that intermediate, peak correction into a second
    /// intermediate, then finalize by deleting the first and renaming the
    /// second. The final artifact carries both corrections; the input is
    /// never written to. On failure the intermediates are removed.
    pub async fn normalize_file(
        &self,
        input: &Path,
        shutdown: &Shutdown,
    ) -> Result<PathBuf, NormalizeError> {
        self.ensure_input_exists(input).await?;
        let job = FileJob::new(input);
        let duration_secs = self.probe_duration(input, shutdown).await?;

        match self.run_chain(&job, duration_secs, shutdown).await {
            Ok(path) => Ok(path),
            Err(e) => {
                self.cleanup_artifacts(&job).await;
                Err(e)
            }
        }
    }

    /// Measures mean and peak volume with a volumedetect pass.
    pub async fn analyze(
        &self,
        input: &Path,
        shutdown: &Shutdown,
    ) -> Result<VolumeStats, NormalizeError> {
        self.ensure_input_exists(input).await?;
        let duration_secs = self.probe_duration(input, shutdown).await?;
        self.volumedetect(input, duration_secs, shutdown).await
    }

    /// Converts one input to a pcm_s16le wav next to it.
    pub async fn convert_wav(
        &self,
        input: &Path,
        shutdown: &Shutdown,
    ) -> Result<PathBuf, NormalizeError> {
        self.ensure_input_exists(input).await?;
        let job = FileJob::new(input);
        let duration_secs = self.probe_duration(input, shutdown).await?;

        let wav_path = job.wav_output();
        info!("Converting {} to {}", input.display(), wav_path.display());
        let builder = EngineInvocation::builder()
            .input(input)
            .audio_codec("pcm_s16le")
            .overwrite()
            .output(&wav_path);
        self.run_pass(builder, duration_secs, shutdown).await?;

        Ok(wav_path)
    }

    async fn run_chain(
        &self,
        job: &FileJob,
        duration_secs: Option<f64>,
        shutdown: &Shutdown,
    ) -> Result<PathBuf, NormalizeError> {
        let loudnorm_path = job.loudnorm_output();
        self.loudnorm(job.input(), &loudnorm_path, duration_secs, shutdown)
            .await?;

        // Analysis and the peak pass read the loudness-corrected encode,
        // so the final artifact carries both corrections.
        let stats = self
            .volumedetect(&loudnorm_path, duration_secs, shutdown)
            .await?;

        let peak_path = job.peak_output();
        self.peak_normalize(
            &loudnorm_path,
            &peak_path,
            stats.peak_db,
            duration_secs,
            shutdown,
        )
        .await?;

        tokio::fs::remove_file(&loudnorm_path).await?;

        let normalized_path = job.normalized_output();
        tokio::fs::rename(&peak_path, &normalized_path).await?;
        info!(
            "Normalized {} into {}",
            job.input().display(),
            normalized_path.display()
        );

        Ok(normalized_path)
    }

    /// Runs the measure-then-apply loudness passes, writing the corrected
    /// encode to `output`.
    pub async fn loudnorm(
        &self,
        input: &Path,
        output: &Path,
        duration_secs: Option<f64>,
        shutdown: &Shutdown,
    ) -> Result<LoudnormStats, NormalizeError> {
        info!("Measuring loudness of {}", input.display());
        let builder = EngineInvocation::builder()
            .input(input)
            .video_codec("copy")
            .audio_filter(filters::LOUDNORM_MEASURE_FILTER)
            .overwrite()
            .container_format("null")
            .output(Path::new(NULL_SINK));
        let measure_output = self.run_pass(builder, duration_secs, shutdown).await?;
        let measured = parse_loudnorm_stats(&measure_output.text())?;
        debug!(
            "Measured input_i={} input_tp={} input_lra={} input_thresh={}",
            measured.input_i, measured.input_tp, measured.input_lra, measured.input_thresh
        );

        info!("Applying loudness correction into {}", output.display());
        let builder = EngineInvocation::builder()
            .input(input)
            .video_codec("copy")
            .audio_filter(&filters::loudnorm_apply_filter(&measured))
            .overwrite()
            .output(output);
        let apply_output = self.run_pass(builder, duration_secs, shutdown).await?;
        let corrected = parse_loudnorm_stats(&apply_output.text())?;
        info!(
            "Corrected loudness output_i={} output_tp={}",
            corrected.output_i, corrected.output_tp
        );

        Ok(corrected)
    }

    /// Applies a single volume pass lifting the measured peak to 0 dBFS.
    pub async fn peak_normalize(
        &self,
        input: &Path,
        output: &Path,
        peak_db: f64,
        duration_secs: Option<f64>,
        shutdown: &Shutdown,
    ) -> Result<(), NormalizeError> {
        let gain_db = filters::peak_gain_db(peak_db);
        info!("Raising peak of {} by {} dB", input.display(), gain_db);
        let builder = EngineInvocation::builder()
            .input(input)
            .video_codec("copy")
            .audio_filter(&filters::volume_filter(gain_db))
            .overwrite()
            .output(output);
        self.run_pass(builder, duration_secs, shutdown).await?;
        Ok(())
    }

    async fn volumedetect(
        &self,
        input: &Path,
        duration_secs: Option<f64>,
        shutdown: &Shutdown,
    ) -> Result<VolumeStats, NormalizeError> {
        debug!("Detecting volume of {}", input.display());
        let builder = EngineInvocation::builder()
            .input(input)
            .video_codec("copy")
            .audio_filter(filters::VOLUMEDETECT_FILTER)
            .overwrite()
            .container_format("null")
            .output(Path::new(NULL_SINK));
        let output = self.run_pass(builder, duration_secs, shutdown).await?;
        Ok(parse_volume_stats(&output.text())?)
    }

    /// Probes the input duration, needed only to scale the progress bar.
    ///
    /// Skipped entirely outside interactive mode. A probe that runs but
    /// yields no parseable duration degrades to an undisplayed pass rather
    /// than failing the file.
    async fn probe_duration(
        &self,
        input: &Path,
        shutdown: &Shutdown,
    ) -> Result<Option<f64>, NormalizeError> {
        if !self.interactive() {
            return Ok(None);
        }

        let invocation = EngineInvocation::builder()
            .probe()
            .input(input)
            .echo(self.echo)
            .build();
        let output = self.engine.run(invocation, shutdown).await?;

        match parse_duration(&output.text()) {
            Ok(duration_secs) => Ok(Some(duration_secs)),
            Err(e) => {
                warn!("Could not read duration of {}: {}", input.display(), e);
                Ok(None)
            }
        }
    }

    /// Runs one engine pass, attaching a progress bridge and display when
    /// interactive progress was requested and the duration is known.
    ///
    /// The bridge and display are torn down before the result propagates,
    /// whatever the outcome of the pass.
    async fn run_pass(
        &self,
        builder: InvocationBuilder,
        duration_secs: Option<f64>,
        shutdown: &Shutdown,
    ) -> Result<CapturedOutput, NormalizeError> {
        let bridge = match duration_secs {
            Some(duration_secs) if self.interactive() => {
                let (events_tx, events_rx) = mpsc::channel(PROGRESS_CHANNEL_SIZE);
                match ProgressServer::bind(events_tx).await {
                    Ok(server) => {
                        let display =
                            ProgressDisplay::new(duration_secs, events_rx, shutdown.clone());
                        Some((server, tokio::spawn(display.run())))
                    }
                    Err(e) => {
                        warn!("Progress listener unavailable: {}", e);
                        None
                    }
                }
            }
            _ => None,
        };

        let builder = match &bridge {
            Some((server, _)) => builder.progress_target(server.address()),
            None => builder,
        };

        let result = self
            .engine
            .run(builder.echo(self.echo).build(), shutdown)
            .await;

        if let Some((server, display_task)) = bridge {
            server.stop().await;
            // Stopping the server drops every event sender, so the display
            // drains its inbox and ends even without a completion record.
            await_display(display_task).await;
        }

        Ok(result?)
    }

    async fn ensure_input_exists(&self, input: &Path) -> Result<(), NormalizeError> {
        if tokio::fs::try_exists(input).await? {
            Ok(())
        } else {
            Err(NormalizeError::InputNotFound {
                path: input.to_path_buf(),
            })
        }
    }

    /// Removes whatever intermediates a failed chain left behind.
    ///
    /// A missing intermediate is the normal case for early failures; any
    /// other removal error is logged and swallowed, the chain error being
    /// the one worth surfacing.
    async fn cleanup_artifacts(&self, job: &FileJob) {
        for path in [job.loudnorm_output(), job.peak_output()] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!("Removed leftover artifact {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(
                    "Could not remove leftover artifact {}: {}",
                    path.display(),
                    e
                ),
            }
        }
    }
}

async fn await_display(display_task: JoinHandle<()>) {
    if let Err(e) = display_task.await {
        warn!("Progress display task failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, EngineProgram};
    use crate::testing::{fixtures, ScriptedEngine};
    use tempfile::TempDir;

    fn write_input(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"media bytes").expect("Failed to create input file");
        path
    }

    fn scripted_normalizer() -> (Normalizer<ScriptedEngine>, ScriptedEngine) {
        let engine = ScriptedEngine::new();
        (Normalizer::new(engine.clone()), engine)
    }

    async fn script_full_chain(engine: &ScriptedEngine, peak_db: &str) {
        engine
            .push_output(fixtures::loudnorm_output("-27.61", "-4.47", "18.06", "-39.20"))
            .await;
        engine
            .push_output(fixtures::loudnorm_output("-24.00", "-2.00", "11.00", "-34.00"))
            .await;
        engine
            .push_output(fixtures::volumedetect_output("-23.10", peak_db))
            .await;
        engine.push_output("").await;
    }

    #[tokio::test]
    async fn test_normalize_runs_the_full_chain() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let input = write_input(&dir, "episode.mkv");
        let (normalizer, engine) = scripted_normalizer();
        script_full_chain(&engine, "-3.00").await;

        let shutdown = Shutdown::new();
        let normalized = normalizer
            .normalize_file(&input, &shutdown)
            .await
            .expect("chain should succeed");

        assert_eq!(normalized, dir.path().join("episode.normalized.mkv"));
        assert!(normalized.exists());
        assert!(input.exists(), "the input must never be touched");
        assert!(
            !dir.path().join("episode.loudnorm.mkv").exists(),
            "the loudnorm intermediate should be deleted"
        );
        assert!(
            !dir.path().join("episode.peakloud.mkv").exists(),
            "the peak intermediate should be renamed away"
        );

        let invocations = engine.recorded_invocations().await;
        assert_eq!(invocations.len(), 4);
        assert!(invocations[0]
            .args()
            .contains(&"loudnorm=print_format=json".to_string()));
        assert!(invocations[1].args().contains(
            &"loudnorm=linear=true:measured_I=-27.61:measured_LRA=18.06:\
              measured_tp=-4.47:measured_thresh=-39.20:print_format=json"
                .to_string()
        ));
        assert!(invocations[2].args().contains(&"volumedetect".to_string()));
        assert!(invocations[3].args().contains(&"volume=3dB".to_string()));

        // The corrective passes work on the loudnorm intermediate.
        let loudnorm_arg = dir.path().join("episode.loudnorm.mkv").display().to_string();
        assert!(invocations[2].args().contains(&loudnorm_arg));
        assert!(invocations[3].args().contains(&loudnorm_arg));
    }

    #[tokio::test]
    async fn test_interactive_normalize_probes_once() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let input = write_input(&dir, "episode.mkv");
        let (normalizer, engine) = scripted_normalizer();
        let normalizer = normalizer.with_progress(true);

        engine
            .push_output(fixtures::probe_output("00:50:00.000"))
            .await;
        script_full_chain(&engine, "-1.50").await;

        let shutdown = Shutdown::new();
        normalizer
            .normalize_file(&input, &shutdown)
            .await
            .expect("chain should succeed");

        let invocations = engine.recorded_invocations().await;
        assert_eq!(invocations.len(), 5);
        assert_eq!(invocations[0].program(), EngineProgram::Prober);
        for invocation in &invocations[1..] {
            assert_eq!(invocation.program(), EngineProgram::Transcoder);
            assert!(
                invocation.args().contains(&"-progress".to_string()),
                "every encode pass should stream telemetry"
            );
        }
    }

    #[tokio::test]
    async fn test_echo_disables_the_progress_bridge() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let input = write_input(&dir, "episode.mkv");
        let (normalizer, engine) = scripted_normalizer();
        let normalizer = normalizer.with_progress(true).with_echo(true);
        script_full_chain(&engine, "-1.50").await;

        let shutdown = Shutdown::new();
        normalizer
            .normalize_file(&input, &shutdown)
            .await
            .expect("chain should succeed");

        let invocations = engine.recorded_invocations().await;
        assert_eq!(invocations.len(), 4, "echo mode must not probe");
        for invocation in &invocations {
            assert!(!invocation.args().contains(&"-progress".to_string()));
            assert!(invocation.echo());
        }
    }

    #[tokio::test]
    async fn test_missing_input_short_circuits() {
        let (normalizer, engine) = scripted_normalizer();
        let shutdown = Shutdown::new();

        let result = normalizer
            .normalize_file(Path::new("/media/not-there.mkv"), &shutdown)
            .await;

        assert!(matches!(result, Err(NormalizeError::InputNotFound { .. })));
        assert_eq!(engine.run_count().await, 0);
    }

    #[tokio::test]
    async fn test_failed_analysis_cleans_up_the_intermediate() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let input = write_input(&dir, "episode.mkv");
        let (normalizer, engine) = scripted_normalizer();

        engine
            .push_output(fixtures::loudnorm_output("-27.61", "-4.47", "18.06", "-39.20"))
            .await;
        engine
            .push_output(fixtures::loudnorm_output("-24.00", "-2.00", "11.00", "-34.00"))
            .await;
        engine
            .push_error(EngineError::failed(Some(1), CapturedOutput::default()))
            .await;

        let shutdown = Shutdown::new();
        let result = normalizer.normalize_file(&input, &shutdown).await;

        assert!(result.is_err());
        assert!(input.exists());
        assert!(
            !dir.path().join("episode.loudnorm.mkv").exists(),
            "failed chains must not leave intermediates behind"
        );
    }

    #[tokio::test]
    async fn test_batch_continues_past_failures() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let first = write_input(&dir, "one.mkv");
        let second = write_input(&dir, "two.mkv");
        let (normalizer, engine) = scripted_normalizer();

        engine
            .push_error(EngineError::failed(Some(1), CapturedOutput::default()))
            .await;
        script_full_chain(&engine, "-3.00").await;

        let shutdown = Shutdown::new();
        let results = normalizer
            .normalize_batch(&[first.clone(), second.clone()], &shutdown)
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, first);
        assert!(results[0].1.is_err());
        assert_eq!(results[1].0, second);
        assert!(results[1].1.is_ok());
        assert!(dir.path().join("two.normalized.mkv").exists());
    }

    #[tokio::test]
    async fn test_batch_stops_on_cancellation() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let first = write_input(&dir, "one.mkv");
        let second = write_input(&dir, "two.mkv");
        let (normalizer, engine) = scripted_normalizer();

        engine.push_error(EngineError::Cancelled).await;

        let shutdown = Shutdown::new();
        let results = normalizer.normalize_batch(&[first, second], &shutdown).await;

        assert_eq!(results.len(), 1, "cancellation should stop the batch");
        assert!(matches!(&results[0].1, Err(e) if e.is_cancelled()));
    }

    #[tokio::test]
    async fn test_analyze_reports_stats() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let input = write_input(&dir, "episode.mkv");
        let (normalizer, engine) = scripted_normalizer();

        engine
            .push_output(fixtures::volumedetect_output("-23.10", "-1.50"))
            .await;

        let shutdown = Shutdown::new();
        let stats = normalizer
            .analyze(&input, &shutdown)
            .await
            .expect("analysis should succeed");

        assert_eq!(stats.mean_db, -23.1);
        assert_eq!(stats.peak_db, -1.5);

        let invocations = engine.recorded_invocations().await;
        assert_eq!(invocations.len(), 1);
        assert!(invocations[0].args().contains(&"volumedetect".to_string()));
        assert_eq!(invocations[0].output(), Some(NULL_SINK));
    }

    #[tokio::test]
    async fn test_wav_conversion() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let input = write_input(&dir, "episode.mkv");
        let (normalizer, engine) = scripted_normalizer();

        engine.push_output("").await;

        let shutdown = Shutdown::new();
        let wav = normalizer
            .convert_wav(&input, &shutdown)
            .await
            .expect("conversion should succeed");

        assert_eq!(wav, dir.path().join("episode.wav"));
        assert!(wav.exists());

        let invocations = engine.recorded_invocations().await;
        assert!(invocations[0].args().contains(&"pcm_s16le".to_string()));
        assert!(invocations[0].args().contains(&"-y".to_string()));
    }
}
