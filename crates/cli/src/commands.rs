//! Command line surface and per-command handlers.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::error;

use loudini_core::{Config, FfmpegEngine, Normalizer, Shutdown, VolumeStats};

#[derive(Parser, Debug)]
#[command(name = "loudini", version, about = "Multi-pass loudness normalization for media files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Echo raw engine output and raise log verbosity
    #[arg(long, global = true)]
    pub debug: bool,

    /// Disable the live progress bar
    #[arg(long, global = true)]
    pub no_progress: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Normalize loudness and peak level of each file
    Normalize {
        /// Media files to normalize
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Report mean and peak volume of each file
    Analyze {
        /// Media files to analyze
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Convert each file to a pcm_s16le wav
    Wav {
        /// Media files to convert
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Runs the selected command against a fresh engine.
pub async fn execute(cli: Cli, config: Config, shutdown: &Shutdown) -> Result<()> {
    let engine = FfmpegEngine::new(config.engine);
    let normalizer = Normalizer::new(engine)
        .with_echo(cli.debug || config.echo)
        .with_progress(!cli.no_progress);

    match cli.command {
        Command::Normalize { files } => normalize(&normalizer, &files, shutdown).await,
        Command::Analyze { files } => analyze(&normalizer, &files, shutdown).await,
        Command::Wav { files } => wav(&normalizer, &files, shutdown).await,
    }
}

async fn normalize(
    normalizer: &Normalizer<FfmpegEngine>,
    files: &[PathBuf],
    shutdown: &Shutdown,
) -> Result<()> {
    let results = normalizer.normalize_batch(files, shutdown).await;

    let mut failed = 0;
    for (input, result) in &results {
        if let Err(e) = result {
            error!("{}: {}", input.display(), e);
            failed += 1;
        }
    }
    finish_batch(failed, files.len())
}

async fn analyze(
    normalizer: &Normalizer<FfmpegEngine>,
    files: &[PathBuf],
    shutdown: &Shutdown,
) -> Result<()> {
    let mut failed = 0;
    for input in files {
        match normalizer.analyze(input, shutdown).await {
            Ok(stats) => print!("{}", format_stats(input, &stats)),
            Err(e) => {
                let cancelled = e.is_cancelled();
                error!("{}: {}", input.display(), e);
                failed += 1;
                if cancelled {
                    break;
                }
            }
        }
    }
    finish_batch(failed, files.len())
}

async fn wav(
    normalizer: &Normalizer<FfmpegEngine>,
    files: &[PathBuf],
    shutdown: &Shutdown,
) -> Result<()> {
    let mut failed = 0;
    for input in files {
        match normalizer.convert_wav(input, shutdown).await {
            Ok(_) => {}
            Err(e) => {
                let cancelled = e.is_cancelled();
                error!("{}: {}", input.display(), e);
                failed += 1;
                if cancelled {
                    break;
                }
            }
        }
    }
    finish_batch(failed, files.len())
}

fn finish_batch(failed: usize, total: usize) -> Result<()> {
    if failed > 0 {
        bail!("{} of {} files failed", failed, total);
    }
    Ok(())
}

/// One analysis block, aligned the way the volumedetect filter reports.
fn format_stats(path: &Path, stats: &VolumeStats) -> String {
    format!(
        "       file: {}\nmean_volume: {}\n max_volume: {}\n\n",
        path.display(),
        stats.mean_db,
        stats.peak_db
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalize_with_files() {
        let cli = Cli::try_parse_from(["loudini", "normalize", "a.mkv", "b.mkv"]).unwrap();
        match cli.command {
            Command::Normalize { files } => {
                assert_eq!(files, vec![PathBuf::from("a.mkv"), PathBuf::from("b.mkv")]);
            }
            other => panic!("Expected normalize, got {:?}", other),
        }
        assert!(!cli.debug);
        assert!(!cli.no_progress);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "loudini",
            "analyze",
            "--debug",
            "--no-progress",
            "--config",
            "custom.toml",
            "a.mkv",
        ])
        .unwrap();

        assert!(matches!(cli.command, Command::Analyze { .. }));
        assert!(cli.debug);
        assert!(cli.no_progress);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }

    #[test]
    fn test_parse_wav() {
        let cli = Cli::try_parse_from(["loudini", "wav", "a.mkv"]).unwrap();
        assert!(matches!(cli.command, Command::Wav { .. }));
    }

    #[test]
    fn test_each_command_requires_files() {
        for command in ["normalize", "analyze", "wav"] {
            let result = Cli::try_parse_from(["loudini", command]);
            assert!(result.is_err(), "{} without files should not parse", command);
        }
    }

    #[test]
    fn test_format_stats_block() {
        let stats = VolumeStats {
            mean_db: -23.1,
            peak_db: -1.5,
        };
        let block = format_stats(Path::new("album.mkv"), &stats);
        assert_eq!(
            block,
            "       file: album.mkv\nmean_volume: -23.1\n max_volume: -1.5\n\n"
        );
    }

    #[test]
    fn test_finish_batch_reports_failures() {
        assert!(finish_batch(0, 3).is_ok());
        let err = finish_batch(2, 3).unwrap_err();
        assert_eq!(err.to_string(), "2 of 3 files failed");
    }
}
