/// Host configuration
///
/// Layered the usual way: built-in defaults, an optional TOML file,
/// `TWEAKER_*` environment variables, then command-line flags.
use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tweaker_core::TweakerError;

/// Where the filter file lives unless configured otherwise
pub const DEFAULT_FILTER_FILE: &str = "/var/lib/alsa/speakertweaker.bin";

/// Sink/input name meaning standard output/input
pub const STDIO: &str = "-";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Filter file to map
    #[serde(default = "default_filterfile")]
    pub filterfile: PathBuf,

    /// Interleaved channels in the stream
    #[serde(default = "default_channels")]
    pub channels: usize,

    /// Downstream output, `-` for stdout
    #[serde(default = "default_sink")]
    pub sink: String,

    /// Frames handed to the engine per call
    #[serde(default = "default_period_frames")]
    pub period_frames: usize,

    /// Operating rate of the stream in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

/// Values given on the command line; `None` keeps the layered value
#[derive(Debug, Clone, Default)]
pub struct HostOverrides {
    pub filterfile: Option<PathBuf>,
    pub channels: Option<usize>,
    pub sink: Option<String>,
    pub period_frames: Option<usize>,
    pub sample_rate: Option<u32>,
}

impl HostConfig {
    /// Load configuration from an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`load`](Self::load), reading variables from `env` instead of the process
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(CliError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            settings = settings.add_source(config::File::from(path.to_path_buf()));
        }

        // Override with environment variables (prefixed with TWEAKER_)
        settings = settings.add_source(
            config::Environment::with_prefix("TWEAKER")
                .try_parsing(true)
                .source(env),
        );

        let config = settings.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Apply command-line flags on top of the loaded values
    pub fn apply(&mut self, overrides: HostOverrides) {
        if let Some(filterfile) = overrides.filterfile {
            self.filterfile = filterfile;
        }
        if let Some(channels) = overrides.channels {
            self.channels = channels;
        }
        if let Some(sink) = overrides.sink {
            self.sink = sink;
        }
        if let Some(period_frames) = overrides.period_frames {
            self.period_frames = period_frames;
        }
        if let Some(sample_rate) = overrides.sample_rate {
            self.sample_rate = sample_rate;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.channels < 1 {
            return Err(TweakerError::invalid_configuration("channels < 1").into());
        }
        if self.period_frames == 0 {
            return Err(CliError::Config("period_frames must be positive".to_string()));
        }
        if self.sample_rate == 0 {
            return Err(CliError::Config("sample_rate must be positive".to_string()));
        }
        if self.sink.is_empty() {
            return Err(CliError::Config("sink must not be empty".to_string()));
        }
        Ok(())
    }

    /// Whether output goes to stdout
    pub fn sink_is_stdout(&self) -> bool {
        self.sink == STDIO
    }
}

// Default values
fn default_filterfile() -> PathBuf {
    PathBuf::from(DEFAULT_FILTER_FILE)
}

fn default_channels() -> usize {
    2
}

fn default_sink() -> String {
    STDIO.to_string()
}

fn default_period_frames() -> usize {
    1024
}

fn default_sample_rate() -> u32 {
    48_000
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            filterfile: default_filterfile(),
            channels: default_channels(),
            sink: default_sink(),
            period_frames: default_period_frames(),
            sample_rate: default_sample_rate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> Option<config::Map<String, String>> {
        Some(config::Map::new())
    }

    #[test]
    fn defaults_without_sources() {
        let config = HostConfig::load_with_env(None, no_env()).unwrap();
        assert_eq!(config, HostConfig::default());
        assert_eq!(config.filterfile, PathBuf::from("/var/lib/alsa/speakertweaker.bin"));
        assert_eq!(config.channels, 2);
        assert!(config.sink_is_stdout());
    }

    #[test]
    fn file_values_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.toml");
        std::fs::write(
            &path,
            "filterfile = \"/tmp/tweak.bin\"\nchannels = 6\nsample_rate = 44100\n",
        )
        .unwrap();

        let config = HostConfig::load_with_env(Some(&path), no_env()).unwrap();
        assert_eq!(config.filterfile, PathBuf::from("/tmp/tweak.bin"));
        assert_eq!(config.channels, 6);
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.period_frames, 1024);
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.toml");
        std::fs::write(&path, "channels = 6\n").unwrap();
        let mut env = config::Map::new();
        env.insert("TWEAKER_CHANNELS".to_string(), "4".to_string());
        env.insert("TWEAKER_PERIOD_FRAMES".to_string(), "256".to_string());

        let config = HostConfig::load_with_env(Some(&path), Some(env)).unwrap();
        assert_eq!(config.channels, 4);
        assert_eq!(config.period_frames, 256);
    }

    #[test]
    fn unknown_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.toml");
        std::fs::write(&path, "chanels = 2\n").unwrap();

        assert!(matches!(
            HostConfig::load_with_env(Some(&path), no_env()),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn missing_file_rejected() {
        let err = HostConfig::load_with_env(Some(Path::new("/nonexistent/host.toml")), no_env())
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn flags_win() {
        let mut config = HostConfig::default();
        config.apply(HostOverrides {
            channels: Some(1),
            sink: Some("/tmp/out.raw".to_string()),
            ..HostOverrides::default()
        });
        assert_eq!(config.channels, 1);
        assert!(!config.sink_is_stdout());
        assert_eq!(config.sample_rate, 48_000);
    }

    #[test]
    fn zero_channels_is_invalid_configuration() {
        let config = HostConfig {
            channels: 0,
            ..HostConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CliError::Tweaker(TweakerError::InvalidConfiguration(_)))
        ));
    }

    #[test]
    fn zero_period_rejected() {
        let config = HostConfig {
            period_frames: 0,
            ..HostConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
