use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from a TOML file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    load_config_or_default(Some(path))
}

/// Load configuration with environment variable overrides, from a file when
/// one is given and from the built-in defaults otherwise
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::new();
    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    // Sections split on a double underscore because field names carry
    // single ones, e.g. LOUDINI_ENGINE__FFMPEG_PATH.
    let config: Config = figment
        .merge(Env::prefixed("LOUDINI_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Parse configuration from a TOML string, skipping environment overrides
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
echo = true

[engine]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert!(config.echo);
        assert_eq!(config.engine.ffmpeg_path, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(config.engine.ffprobe_path, "ffprobe");
    }

    #[test]
    fn test_load_config_from_str_empty_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert!(!config.echo);
        assert_eq!(config.engine.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn test_load_config_from_str_bad_type() {
        let result = load_config_from_str("echo = \"yes\"");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[engine]
ffmpeg_path = "/usr/local/bin/ffmpeg"
ffprobe_path = "/usr/local/bin/ffprobe"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.engine.ffmpeg_path, "/usr/local/bin/ffmpeg");
        assert_eq!(config.engine.ffprobe_path, "/usr/local/bin/ffprobe");
    }
}
