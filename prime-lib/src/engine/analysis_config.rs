use crate::Result;
use crate::events::{TimeWindow, ValidationPolicy};
use chrono::{DateTime, Utc};
use core::time::Duration;
use ohno::bail;

/// Everything that shapes a run besides its adapters and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Only events at or after this instant are analyzed.
    pub since: Option<DateTime<Utc>>,

    /// Only events at or before this instant are analyzed.
    pub until: Option<DateTime<Utc>>,

    /// How many times a transiently failing adapter is retried after its first attempt.
    pub retry_count: u32,

    /// Delay before the first retry. Each following retry doubles it.
    pub retry_backoff_base: Duration,

    /// Upper bound on the delay between two attempts.
    pub retry_backoff_ceiling: Duration,

    /// How far into the future event timestamps may lie.
    pub clock_skew_tolerance: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            since: None,
            until: None,
            retry_count: 3,
            retry_backoff_base: Duration::from_secs(1),
            retry_backoff_ceiling: Duration::from_secs(30),
            clock_skew_tolerance: Duration::from_mins(5),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        let _ = self.window()?;

        if self.retry_backoff_base > self.retry_backoff_ceiling {
            bail!(
                "retry backoff base ({:?}) must not exceed the backoff ceiling ({:?})",
                self.retry_backoff_base,
                self.retry_backoff_ceiling
            );
        }

        Ok(())
    }

    pub fn window(&self) -> Result<TimeWindow> {
        TimeWindow::new(self.since, self.until)
    }

    #[must_use]
    pub fn validation_policy(&self, now: DateTime<Utc>) -> ValidationPolicy {
        ValidationPolicy::new(now, self.clock_skew_tolerance)
    }

    /// Delay before the given retry, counting from 1.
    #[must_use]
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 2_u32.saturating_pow(retry.saturating_sub(1));
        self.retry_backoff_base.saturating_mul(factor).min(self.retry_backoff_ceiling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_is_valid() {
        AnalysisConfig::default().validate().unwrap();
    }

    #[test]
    fn test_backoff_doubles_up_to_ceiling() {
        let config = AnalysisConfig {
            retry_backoff_base: Duration::from_secs(1),
            retry_backoff_ceiling: Duration::from_secs(5),
            ..AnalysisConfig::default()
        };

        assert_eq!(config.backoff_delay(1), Duration::from_secs(1));
        assert_eq!(config.backoff_delay(2), Duration::from_secs(2));
        assert_eq!(config.backoff_delay(3), Duration::from_secs(4));
        assert_eq!(config.backoff_delay(4), Duration::from_secs(5));
        assert_eq!(config.backoff_delay(100), Duration::from_secs(5));
    }

    #[test]
    fn test_inverted_window_rejected() {
        let config = AnalysisConfig {
            since: Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
            until: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..AnalysisConfig::default()
        };
        let _ = config.validate().unwrap_err();
    }

    #[test]
    fn test_base_above_ceiling_rejected() {
        let config = AnalysisConfig {
            retry_backoff_base: Duration::from_secs(60),
            retry_backoff_ceiling: Duration::from_secs(30),
            ..AnalysisConfig::default()
        };
        let _ = config.validate().unwrap_err();
    }
}
