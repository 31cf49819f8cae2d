use super::MetricValue;
use compact_str::CompactString;
use std::collections::BTreeMap;

const SECONDS_PER_DAY: f64 = 86400.0;

/// Summary statistics over a set of durations, expressed in days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationStats {
    pub count: u64,
    pub avg: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

impl DurationStats {
    /// Compute statistics from durations in seconds. Returns `None` when there are no usable values.
    #[expect(clippy::cast_precision_loss, reason = "acceptable for statistics")]
    #[must_use]
    pub fn from_seconds(seconds_iter: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut seconds: Vec<f64> = seconds_iter.into_iter().filter(|&s| s.is_finite() && s >= 0.0).collect();
        if seconds.is_empty() {
            return None;
        }

        seconds.sort_by(f64::total_cmp);

        Some(Self {
            count: seconds.len() as u64,
            avg: seconds.iter().sum::<f64>() / seconds.len() as f64 / SECONDS_PER_DAY,
            p50: percentile(&seconds, 50.0) / SECONDS_PER_DAY,
            p75: percentile(&seconds, 75.0) / SECONDS_PER_DAY,
            p90: percentile(&seconds, 90.0) / SECONDS_PER_DAY,
            p95: percentile(&seconds, 95.0) / SECONDS_PER_DAY,
        })
    }

    /// Adds the statistics to a metric map as `count`, `avg_days`, `p50_days`, and so on.
    pub fn insert_into(&self, map: &mut BTreeMap<CompactString, MetricValue>) {
        let _ = map.insert("count".into(), MetricValue::UInt(self.count));
        let _ = map.insert("avg_days".into(), MetricValue::Float(self.avg));
        let _ = map.insert("p50_days".into(), MetricValue::Float(self.p50));
        let _ = map.insert("p75_days".into(), MetricValue::Float(self.p75));
        let _ = map.insert("p90_days".into(), MetricValue::Float(self.p90));
        let _ = map.insert("p95_days".into(), MetricValue::Float(self.p95));
    }
}

/// Nearest-rank percentile over sorted data.
fn percentile(sorted_data: &[f64], percentile: f64) -> f64 {
    let Some(last) = sorted_data.len().checked_sub(1) else {
        return 0.0;
    };

    #[expect(clippy::cast_possible_truncation, reason = "index calculation")]
    #[expect(clippy::cast_sign_loss, reason = "value is clamped to non-negative range")]
    #[expect(clippy::cast_precision_loss, reason = "index fits in usize")]
    let idx = (percentile / 100.0 * last as f64).round().clamp(0.0, last as f64) as usize;

    sorted_data.get(idx).copied().unwrap_or_default()
}
