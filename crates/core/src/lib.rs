pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod normalizer;
pub mod progress;
pub mod shutdown;
pub mod testing;

pub use config::{load_config, load_config_from_str, load_config_or_default, Config, ConfigError};
pub use diagnostics::{
    parse_duration, parse_loudnorm_stats, parse_volume_stats, LoudnormStats, ParseError,
    VolumeStats,
};
pub use engine::{
    CapturedOutput, Engine, EngineConfig, EngineError, EngineInvocation, EngineProgram,
    FfmpegEngine, InvocationBuilder,
};
pub use normalizer::{FileJob, NormalizeError, Normalizer};
pub use progress::{DisplayState, ProgressEvent, ProgressServer};
pub use shutdown::Shutdown;
