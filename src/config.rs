use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::buffer::OverflowPolicy;

/// Top-level configuration for the congestoor agent.
///
/// Every field has a default, so the agent runs without a config file at
/// all.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Logging verbosity (debug, info, warn, error). Default: "info".
    #[serde(default = "default_log_level")]
    #[allow(dead_code)]
    pub log_level: String,

    /// Sensor population configuration.
    #[serde(default)]
    pub sensors: SensorsConfig,

    /// Event buffer configuration.
    #[serde(default)]
    pub buffer: BufferConfig,

    /// Interval aggregation configuration.
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Event source configuration.
    #[serde(default)]
    pub source: SourceConfig,

    /// Report sink configuration.
    #[serde(default)]
    pub sink: SinkConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            sensors: SensorsConfig::default(),
            buffer: BufferConfig::default(),
            aggregation: AggregationConfig::default(),
            source: SourceConfig::default(),
            sink: SinkConfig::default(),
        }
    }
}

/// Sensor population configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SensorsConfig {
    /// Number of traffic lights, ids 1..=count. Default: 5.
    #[serde(default = "default_sensor_count")]
    pub count: u16,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            count: default_sensor_count(),
        }
    }
}

/// Event buffer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BufferConfig {
    /// Soft capacity of the buffer. Default: 10.
    #[serde(default = "default_buffer_capacity")]
    pub capacity: usize,

    /// Overflow policy (warn, drop_oldest, block). Default: warn.
    #[serde(default)]
    pub overflow: OverflowPolicy,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: default_buffer_capacity(),
            overflow: OverflowPolicy::default(),
        }
    }
}

/// Interval aggregation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregationConfig {
    /// Measurement interval length. Default: 1m.
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    /// Number of sensors to report per interval. Default: 5.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Emit a zero-entry report for intervals with no data. Default: true.
    #[serde(default = "default_true")]
    pub emit_empty: bool,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            top_n: default_top_n(),
            emit_empty: true,
        }
    }
}

/// Where events come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// Randomly generated readings.
    Synthetic,
    /// Readings replayed from a line-oriented file.
    Replay,
}

impl Default for SourceMode {
    fn default() -> Self {
        Self::Synthetic
    }
}

/// Event source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Source variant. Default: synthetic.
    #[serde(default)]
    pub mode: SourceMode,

    /// Number of concurrent synthetic producers. Default: 1.
    #[serde(default = "default_producers")]
    pub producers: usize,

    /// Input file for replay mode.
    #[serde(default)]
    pub replay_path: PathBuf,

    /// Minimum inter-arrival delay. Default: 100ms.
    #[serde(default = "default_min_delay", with = "humantime_serde")]
    pub min_delay: Duration,

    /// Maximum inter-arrival delay (exclusive). Default: 1100ms.
    #[serde(default = "default_max_delay", with = "humantime_serde")]
    pub max_delay: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            mode: SourceMode::default(),
            producers: default_producers(),
            replay_path: PathBuf::new(),
            min_delay: default_min_delay(),
            max_delay: default_max_delay(),
        }
    }
}

/// Where reports go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    Stdout,
    File,
}

impl Default for SinkKind {
    fn default() -> Self {
        Self::File
    }
}

/// Report sink configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    /// Sink variant. Default: file.
    #[serde(default)]
    pub output: SinkKind,

    /// Destination path for the file sink. Default: "output.txt".
    #[serde(default = "default_sink_path")]
    pub path: PathBuf,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            output: SinkKind::default(),
            path: default_sink_path(),
        }
    }
}

// --- Default value functions ---

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sensor_count() -> u16 {
    5
}

fn default_buffer_capacity() -> usize {
    10
}

fn default_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_top_n() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_producers() -> usize {
    1
}

fn default_min_delay() -> Duration {
    Duration::from_millis(100)
}

fn default_max_delay() -> Duration {
    Duration::from_millis(1100)
}

fn default_sink_path() -> PathBuf {
    PathBuf::from("output.txt")
}

// --- Validation and loading ---

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;

        let cfg: Config = serde_yaml::from_str(&data)
            .with_context(|| format!("parsing config file {}", path.display()))?;

        cfg.validate()?;

        Ok(cfg)
    }

    /// Validate the configuration for required fields and consistency.
    pub fn validate(&self) -> Result<()> {
        if self.sensors.count == 0 {
            bail!("sensors.count must be positive");
        }

        if self.buffer.capacity == 0 {
            bail!("buffer.capacity must be positive");
        }

        if self.aggregation.interval.is_zero() {
            bail!("aggregation.interval must be positive");
        }

        if self.aggregation.top_n == 0 {
            bail!("aggregation.top_n must be positive");
        }

        if self.source.producers == 0 {
            bail!("source.producers must be positive");
        }

        if self.source.min_delay >= self.source.max_delay {
            bail!(
                "source.min_delay {:?} must be less than source.max_delay {:?}",
                self.source.min_delay,
                self.source.max_delay
            );
        }

        if self.source.mode == SourceMode::Replay && self.source.replay_path.as_os_str().is_empty()
        {
            bail!("source.replay_path is required when source.mode is replay");
        }

        if self.sink.output == SinkKind::File && self.sink.path.as_os_str().is_empty() {
            bail!("sink.path is required when sink.output is file");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_reference_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.sensors.count, 5);
        assert_eq!(cfg.buffer.capacity, 10);
        assert_eq!(cfg.buffer.overflow, OverflowPolicy::Warn);
        assert_eq!(cfg.aggregation.interval, Duration::from_secs(60));
        assert_eq!(cfg.aggregation.top_n, 5);
        assert!(cfg.aggregation.emit_empty);
        assert_eq!(cfg.source.mode, SourceMode::Synthetic);
        assert_eq!(cfg.source.min_delay, Duration::from_millis(100));
        assert_eq!(cfg.source.max_delay, Duration::from_millis(1100));
        assert_eq!(cfg.sink.output, SinkKind::File);
        assert_eq!(cfg.sink.path, PathBuf::from("output.txt"));
    }

    #[test]
    fn test_default_config_validates() {
        Config::default().validate().expect("defaults are valid");
    }

    #[test]
    fn test_parse_full_yaml() {
        let yaml = r#"
log_level: debug
sensors:
  count: 12
buffer:
  capacity: 256
  overflow: drop_oldest
aggregation:
  interval: 5s
  top_n: 3
  emit_empty: false
source:
  mode: replay
  replay_path: /var/lib/congestoor/input.txt
  min_delay: 10ms
  max_delay: 20ms
sink:
  output: stdout
"#;
        let cfg: Config = serde_yaml::from_str(yaml).expect("valid yaml");
        cfg.validate().expect("valid config");

        assert_eq!(cfg.sensors.count, 12);
        assert_eq!(cfg.buffer.capacity, 256);
        assert_eq!(cfg.buffer.overflow, OverflowPolicy::DropOldest);
        assert_eq!(cfg.aggregation.interval, Duration::from_secs(5));
        assert_eq!(cfg.aggregation.top_n, 3);
        assert!(!cfg.aggregation.emit_empty);
        assert_eq!(cfg.source.mode, SourceMode::Replay);
        assert_eq!(cfg.sink.output, SinkKind::Stdout);
    }

    #[test]
    fn test_parse_empty_yaml_uses_defaults() {
        let cfg: Config = serde_yaml::from_str("{}").expect("valid yaml");
        assert_eq!(cfg.sensors.count, 5);
        assert_eq!(cfg.aggregation.interval, Duration::from_secs(60));
    }

    #[test]
    fn test_parse_unknown_overflow_policy_fails() {
        let yaml = "buffer:\n  overflow: reject\n";
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn test_validation_zero_sensor_count() {
        let cfg = Config {
            sensors: SensorsConfig { count: 0 },
            ..Default::default()
        };
        let err = cfg.validate().expect_err("should fail");
        assert!(err.to_string().contains("sensors.count"));
    }

    #[test]
    fn test_validation_zero_buffer_capacity() {
        let cfg = Config {
            buffer: BufferConfig {
                capacity: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = cfg.validate().expect_err("should fail");
        assert!(err.to_string().contains("buffer.capacity"));
    }

    #[test]
    fn test_validation_zero_interval() {
        let cfg = Config {
            aggregation: AggregationConfig {
                interval: Duration::ZERO,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = cfg.validate().expect_err("should fail");
        assert!(err.to_string().contains("aggregation.interval"));
    }

    #[test]
    fn test_validation_zero_top_n() {
        let cfg = Config {
            aggregation: AggregationConfig {
                top_n: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = cfg.validate().expect_err("should fail");
        assert!(err.to_string().contains("aggregation.top_n"));
    }

    #[test]
    fn test_validation_delay_ordering() {
        let cfg = Config {
            source: SourceConfig {
                min_delay: Duration::from_millis(500),
                max_delay: Duration::from_millis(500),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = cfg.validate().expect_err("should fail");
        assert!(err.to_string().contains("min_delay"));
    }

    #[test]
    fn test_validation_replay_requires_path() {
        let cfg = Config {
            source: SourceConfig {
                mode: SourceMode::Replay,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = cfg.validate().expect_err("should fail");
        assert!(err.to_string().contains("replay_path"));
    }
}
