use crate::Result;
use crate::engine::AnalysisConfig;
use crate::metrics::{MetricSpec, default_metric_specs};
use crate::sources::SourceSpec;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use core::time::Duration;
use ohno::{IntoAppError, bail};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "prime.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Only analyze events at or after this instant
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,

    /// Only analyze events at or before this instant
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,

    /// Number of retries for a temporarily unavailable source
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Delay before the first retry
    #[serde(default = "default_retry_backoff_base", with = "humantime_serde")]
    pub retry_backoff_base: Duration,

    /// Upper bound on the delay between retries
    #[serde(default = "default_retry_backoff_ceiling", with = "humantime_serde")]
    pub retry_backoff_ceiling: Duration,

    /// How far into the future event timestamps may lie
    #[serde(default = "default_clock_skew_tolerance", with = "humantime_serde")]
    pub clock_skew_tolerance: Duration,

    /// Abort the run once it exceeds this duration
    #[serde(default, with = "humantime_serde")]
    pub run_timeout: Option<Duration>,

    /// Adapters to fetch events from
    #[serde(default)]
    pub sources: Vec<SourceSpec>,

    /// Metrics to compute over the merged events
    #[serde(default = "default_metric_specs")]
    pub metrics: Vec<MetricSpec>,
}

const fn default_retry_count() -> u32 {
    3
}

const fn default_retry_backoff_base() -> Duration {
    Duration::from_secs(1)
}

const fn default_retry_backoff_ceiling() -> Duration {
    Duration::from_secs(30)
}

const fn default_clock_skew_tolerance() -> Duration {
    Duration::from_mins(5)
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated
    pub fn load(workspace_root: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading prime configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = workspace_root.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    // No config file found, use defaults
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading prime configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if the window or retry settings are inconsistent, a source is
    /// misconfigured, or two sources or two metrics share a name
    pub fn validate(&self) -> Result<()> {
        self.analysis_config().validate()?;

        if self.run_timeout.is_some_and(|t| t.is_zero()) {
            bail!("run_timeout must be greater than zero");
        }

        let mut source_names = HashSet::new();
        for source in &self.sources {
            source.validate()?;

            let name = source.name();
            if !source_names.insert(name.clone()) {
                bail!("source name '{name}' is used more than once");
            }
        }

        let mut metric_names = HashSet::new();
        for metric in &self.metrics {
            let name = metric.name();
            if name.trim().is_empty() {
                bail!("metric names must not be empty");
            }

            if !metric_names.insert(name.clone()) {
                bail!("metric name '{name}' is used more than once");
            }
        }

        Ok(())
    }

    #[must_use]
    pub const fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            since: self.since,
            until: self.until,
            retry_count: self.retry_count,
            retry_backoff_base: self.retry_backoff_base,
            retry_backoff_ceiling: self.retry_backoff_ceiling,
            clock_skew_tolerance: self.clock_skew_tolerance,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use chrono::TimeZone;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert!(config.sources.is_empty());
        assert_eq!(config.analysis_config(), AnalysisConfig::default());
    }

    #[test]
    fn test_default_config_lists_default_metrics() {
        assert_eq!(Config::default().metrics, default_metric_specs());
    }

    #[test]
    fn test_missing_metrics_fall_back_to_defaults() {
        let config: Config = toml::from_str("retry_count = 1").unwrap();
        assert_eq!(config.metrics, default_metric_specs());
        assert_eq!(config.retry_count, 1);
    }

    #[test]
    fn test_parse_window_and_durations() {
        let config: Config = toml::from_str(
            r#"
since = "2024-01-01T00:00:00Z"
until = "2024-06-30T00:00:00Z"
retry_backoff_base = "250ms"
run_timeout = "2m"
metrics = []
"#,
        )
        .unwrap();

        assert_eq!(config.since, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(config.until, Some(Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap()));
        assert_eq!(config.retry_backoff_base, Duration::from_millis(250));
        assert_eq!(config.run_timeout, Some(Duration::from_secs(120)));
        assert!(config.metrics.is_empty());
    }

    #[test]
    fn test_validate_inverted_window() {
        let config = Config {
            since: Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
            until: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..Config::default()
        };
        let _ = config.validate().unwrap_err();
    }

    #[test]
    fn test_validate_zero_timeout() {
        let config = Config {
            run_timeout: Some(Duration::ZERO),
            ..Config::default()
        };
        let _ = config.validate().unwrap_err();
    }

    #[test]
    fn test_validate_duplicate_source_names() {
        let config: Config = toml::from_str(
            r#"
[[sources]]
type = "git"
path = "."

[[sources]]
type = "git"
path = "."
"#,
        )
        .unwrap();

        let e = config.validate().unwrap_err();
        assert!(e.to_string().contains("git:."));
    }

    #[test]
    fn test_validate_duplicate_metric_names() {
        let mut config = Config::default();
        config.metrics.push(MetricSpec::EventCount {
            name: None,
            kind: EventKind::Commit,
            filter: crate::metrics::EventFilter::default(),
        });

        let e = config.validate().unwrap_err();
        assert!(e.to_string().contains("commit_count"));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_save_default_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let output_path = Utf8PathBuf::try_from(tmp.path().join(CONFIG_FILE_NAME)).unwrap();
        Config::save_default(&output_path).unwrap();
        let loaded = Config::load(&Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap(), Some(&output_path)).unwrap();
        assert_eq!(loaded.metrics, default_metric_specs());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_missing_config_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let workspace_root = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let config = Config::load(&workspace_root, None).unwrap();
        config.validate().unwrap();
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_finds_config_in_root() {
        let tmp = tempfile::tempdir().unwrap();
        let workspace_root = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        fs::write(workspace_root.join(CONFIG_FILE_NAME), "retry_count = 7\n").unwrap();

        let config = Config::load(&workspace_root, None).unwrap();
        assert_eq!(config.retry_count, 7);
    }

    #[test]
    fn test_default_config_toml_is_not_empty() {
        assert!(!DEFAULT_CONFIG_TOML.is_empty());
    }
}
