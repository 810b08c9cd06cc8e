//! Immutable description of one engine run.

use std::path::Path;

use super::types::EngineProgram;

/// A fully built argument list for one run of the engine.
///
/// Built through [`InvocationBuilder`] and immutable afterwards. The output
/// path, when present, is always the trailing argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInvocation {
    program: EngineProgram,
    args: Vec<String>,
    output: Option<String>,
    echo: bool,
}

impl EngineInvocation {
    /// Starts building an invocation of the transcoder binary.
    pub fn builder() -> InvocationBuilder {
        InvocationBuilder::new()
    }

    /// Which executable this invocation targets.
    pub fn program(&self) -> EngineProgram {
        self.program
    }

    /// The argument list, starting with `-hide_banner`.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The trailing output path, when one was set.
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// Whether engine output is echoed to the console as it is read.
    pub fn echo(&self) -> bool {
        self.echo
    }
}

/// Builder for [`EngineInvocation`].
///
/// Switches are appended in call order after the fixed `-hide_banner`
/// prefix; the output path is held back and appended last by [`build`].
///
/// [`build`]: InvocationBuilder::build
#[derive(Debug, Clone)]
pub struct InvocationBuilder {
    program: EngineProgram,
    args: Vec<String>,
    output: Option<String>,
    echo: bool,
}

impl InvocationBuilder {
    fn new() -> Self {
        Self {
            program: EngineProgram::Transcoder,
            args: vec!["-hide_banner".to_string()],
            output: None,
            echo: false,
        }
    }

    /// Targets the probe binary instead of the transcoder.
    pub fn probe(mut self) -> Self {
        self.program = EngineProgram::Prober;
        self
    }

    /// Input file, `-i <path>`.
    pub fn input(mut self, path: &Path) -> Self {
        self.args.push("-i".to_string());
        self.args.push(path.display().to_string());
        self
    }

    /// Video codec, `-c:v <codec>`.
    pub fn video_codec(mut self, codec: &str) -> Self {
        self.args.push("-c:v".to_string());
        self.args.push(codec.to_string());
        self
    }

    /// Audio codec, `-c:a <codec>`.
    pub fn audio_codec(mut self, codec: &str) -> Self {
        self.args.push("-c:a".to_string());
        self.args.push(codec.to_string());
        self
    }

    /// Audio bitrate, `-b:a <bitrate>`.
    pub fn audio_bitrate(mut self, bitrate: &str) -> Self {
        self.args.push("-b:a".to_string());
        self.args.push(bitrate.to_string());
        self
    }

    /// Audio filter expression, `-filter:a <expr>`.
    pub fn audio_filter(mut self, filter: &str) -> Self {
        self.args.push("-filter:a".to_string());
        self.args.push(filter.to_string());
        self
    }

    /// Container format, `-f <format>`.
    pub fn container_format(mut self, format: &str) -> Self {
        self.args.push("-f".to_string());
        self.args.push(format.to_string());
        self
    }

    /// Overwrite the output without prompting, `-y`.
    pub fn overwrite(mut self) -> Self {
        self.args.push("-y".to_string());
        self
    }

    /// Progress telemetry sink, `-progress <address>`.
    ///
    /// An empty address leaves the switch out entirely.
    pub fn progress_target(mut self, address: &str) -> Self {
        if !address.is_empty() {
            self.args.push("-progress".to_string());
            self.args.push(address.to_string());
        }
        self
    }

    /// Echo engine output to the console as it is read.
    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Output path, appended after every other argument.
    ///
    /// An empty path leaves the invocation without an output.
    pub fn output(mut self, path: &Path) -> Self {
        let path = path.display().to_string();
        if !path.is_empty() {
            self.output = Some(path);
        }
        self
    }

    /// Finalizes the invocation.
    pub fn build(self) -> EngineInvocation {
        let mut args = self.args;
        if let Some(output) = &self.output {
            args.push(output.clone());
        }
        EngineInvocation {
            program: self.program,
            args,
            output: self.output,
            echo: self.echo,
        }
    }
}
