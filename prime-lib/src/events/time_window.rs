use crate::Result;
use chrono::{DateTime, Utc};
use core::fmt::{Display, Formatter};
use ohno::bail;
use serde::Serialize;

/// An inclusive time range. A missing bound leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn new(since: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> Result<Self> {
        if let (Some(s), Some(u)) = (since, until)
            && s > u
        {
            bail!("time window starts at {s} which is after its end at {u}");
        }

        Ok(Self { since, until })
    }

    #[must_use]
    pub const fn unbounded() -> Self {
        Self { since: None, until: None }
    }

    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.since.is_none_or(|s| ts >= s) && self.until.is_none_or(|u| ts <= u)
    }

    /// Whether `ts` lies past the end of the window.
    #[must_use]
    pub fn is_after(&self, ts: DateTime<Utc>) -> bool {
        self.until.is_some_and(|u| ts > u)
    }
}

impl Display for TimeWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let fmt_bound = |b: Option<DateTime<Utc>>| b.map_or_else(|| "*".to_string(), |t| t.to_rfc3339());
        write!(f, "{} .. {}", fmt_bound(self.since), fmt_bound(self.until))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let window = TimeWindow::new(Some(ts(5)), Some(ts(10))).unwrap();
        assert!(window.contains(ts(5)));
        assert!(window.contains(ts(10)));
        assert!(!window.contains(ts(4)));
        assert!(!window.contains(ts(11)));
    }

    #[test]
    fn test_open_bounds() {
        let window = TimeWindow::new(None, Some(ts(10))).unwrap();
        assert!(window.contains(ts(1)));
        assert!(TimeWindow::unbounded().contains(ts(31)));
    }

    #[test]
    fn test_inverted_window_rejected() {
        let _ = TimeWindow::new(Some(ts(10)), Some(ts(5))).unwrap_err();
    }

    #[test]
    fn test_is_after() {
        let window = TimeWindow::new(Some(ts(5)), Some(ts(10))).unwrap();
        assert!(window.is_after(ts(11)));
        assert!(!window.is_after(ts(10)));
        assert!(!TimeWindow::unbounded().is_after(ts(30)));
    }
}
