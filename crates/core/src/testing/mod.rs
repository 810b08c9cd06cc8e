//! Testing doubles and canned engine output.
//!
//! [`ScriptedEngine`] stands in for ffmpeg in pipeline tests, replaying
//! queued outcomes and recording every invocation; [`fixtures`] builds
//! diagnostic text shaped like what the real passes print.
//!
//! # Example
//!
//! ```rust,ignore
//! use loudini_core::testing::{fixtures, ScriptedEngine};
//!
//! let engine = ScriptedEngine::new();
//! engine.push_output(fixtures::volumedetect_output("-23.10", "-1.50")).await;
//!
//! // Run the code under test with a clone, then inspect:
//! let invocations = engine.recorded_invocations().await;
//! ```

mod scripted_engine;

pub use scripted_engine::ScriptedEngine;

/// Canned diagnostic text shaped like real engine output.
pub mod fixtures {
    /// Probe banner with a `Duration:` line carrying the given clock value.
    pub fn probe_output(clock: &str) -> String {
        format!(
            "Input #0, matroska,webm, from 'input.mkv':\n\
             Metadata:\n\
             ENCODER         : Lavf58.76.100\n\
             Duration: {}, start: 0.000000, bitrate: 2180 kb/s\n\
             Stream #0:0: Video: h264 (High), yuv420p(progressive), 1920x1080\n\
             Stream #0:1: Audio: aac (LC), 48000 Hz, stereo, fltp\n",
            clock
        )
    }

    /// Volumedetect output reporting the given mean and peak readings.
    pub fn volumedetect_output(mean_db: &str, peak_db: &str) -> String {
        format!(
            "[Parsed_volumedetect_0 @ 0x55d3a8a19c40] n_samples: 15360000\n\
             [Parsed_volumedetect_0 @ 0x55d3a8a19c40] mean_volume: {} dB\n\
             [Parsed_volumedetect_0 @ 0x55d3a8a19c40] max_volume: {} dB\n\
             [Parsed_volumedetect_0 @ 0x55d3a8a19c40] histogram_1db: 21\n",
            mean_db, peak_db
        )
    }

    /// A loudnorm measurement block with the given measured input fields.
    pub fn loudnorm_output(
        input_i: &str,
        input_tp: &str,
        input_lra: &str,
        input_thresh: &str,
    ) -> String {
        format!(
            "size=N/A time=00:42:31.89 bitrate=N/A speed= 512x\n\
             [Parsed_loudnorm_0 @ 0x558e9ba44800]\n\
             {{\n\
             \t\"input_i\" : \"{}\",\n\
             \t\"input_tp\" : \"{}\",\n\
             \t\"input_lra\" : \"{}\",\n\
             \t\"input_thresh\" : \"{}\",\n\
             \t\"output_i\" : \"-24.58\",\n\
             \t\"output_tp\" : \"-6.34\",\n\
             \t\"output_lra\" : \"17.14\",\n\
             \t\"output_thresh\" : \"-35.88\",\n\
             \t\"normalization_type\" : \"dynamic\",\n\
             \t\"target_offset\" : \"0.58\"\n\
             }}\n",
            input_i, input_tp, input_lra, input_thresh
        )
    }
}
