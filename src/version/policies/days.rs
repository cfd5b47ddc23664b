//! Days-based expiry policy
//!
//! The clock starts when the first newer release is published, not the latest
//! one: a user two releases behind can be expired even if the latest release
//! shipped yesterday.

use chrono::{DateTime, Utc};
use semver::Version;

use crate::config::{MAX_DAYS_LIMIT, PolicyType};
use crate::version::analysis::TimelineEntry;
use crate::version::error::ConfigError;
use crate::version::policy::{Policy, PolicyThresholds, PolicyVerdict, first_newer_release};
use crate::version::release::Release;
use crate::version::semver::days_between;
use crate::version::timeline::days_timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaysPolicy {
    critical_days: i64,
    max_days: i64,
}

impl DaysPolicy {
    pub fn new(critical_days: i64, max_days: i64) -> Self {
        Self {
            critical_days,
            max_days,
        }
    }
}

impl Policy for DaysPolicy {
    fn policy_type(&self) -> PolicyType {
        PolicyType::Days
    }

    fn thresholds(&self) -> PolicyThresholds {
        PolicyThresholds {
            critical_age_days: self.critical_days,
            max_age_days: self.max_days,
            max_versions_behind: None,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.critical_days < 0 {
            return Err(ConfigError::NegativeThreshold(self.critical_days));
        }
        if self.critical_days >= self.max_days {
            return Err(ConfigError::MisorderedThresholds {
                critical_days: self.critical_days,
                max_days: self.max_days,
            });
        }
        if self.max_days > MAX_DAYS_LIMIT {
            return Err(ConfigError::ThresholdTooLarge {
                max_days: self.max_days,
                limit: MAX_DAYS_LIMIT,
            });
        }
        Ok(())
    }

    fn evaluate(
        &self,
        _comparison: &Release,
        _latest: &Release,
        newer_releases: &[Release],
        now: DateTime<Utc>,
    ) -> PolicyVerdict {
        let Some(first_newer) = first_newer_release(newer_releases) else {
            return PolicyVerdict {
                message: "no newer releases".to_string(),
                ..PolicyVerdict::default()
            };
        };

        let days_old = days_between(first_newer.published_at, now);
        let is_expired = days_old >= self.max_days;
        let is_critical = !is_expired && days_old >= self.critical_days;
        let is_warning = !is_expired && !is_critical && days_old > 0;

        let message = if is_expired {
            format!(
                "first newer release {} was published {} days ago, {} days past the {}-day limit",
                first_newer.version,
                days_old,
                days_old - self.max_days,
                self.max_days
            )
        } else {
            format!(
                "first newer release {} was published {} days ago, {} days left to update",
                first_newer.version,
                days_old,
                self.max_days - days_old
            )
        };

        PolicyVerdict {
            is_expired,
            is_critical,
            is_warning,
            days_old,
            versions_behind: 0,
            message,
        }
    }

    fn timeline(
        &self,
        releases: &[Release],
        _comparison: Option<&Version>,
        latest: &Release,
        now: DateTime<Utc>,
    ) -> Vec<TimelineEntry> {
        days_timeline(releases, &latest.version, self.max_days, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 17, 12, 0, 0).unwrap()
    }

    fn release(version: &str, days_ago: i64) -> Release {
        Release::new(
            Version::parse(version).unwrap(),
            now() - Duration::days(days_ago),
            "",
        )
    }

    #[rstest]
    #[case(0, false, false, false)]
    #[case(3, false, false, true)]
    #[case(11, false, false, true)]
    #[case(12, false, true, false)]
    #[case(29, false, true, false)]
    #[case(30, true, false, false)]
    #[case(65, true, false, false)]
    fn evaluate_classifies_by_age_of_first_newer_release(
        #[case] days_ago: i64,
        #[case] expired: bool,
        #[case] critical: bool,
        #[case] warning: bool,
    ) {
        let policy = DaysPolicy::new(12, 30);
        let comparison = release("2.327.1", 100);
        let newer = vec![release("2.328.0", days_ago)];

        let verdict = policy.evaluate(&comparison, &newer[0], &newer, now());

        assert_eq!(
            (verdict.is_expired, verdict.is_critical, verdict.is_warning),
            (expired, critical, warning)
        );
        assert_eq!(verdict.days_old, days_ago);
    }

    #[test]
    fn evaluate_starts_the_clock_at_the_first_newer_release() {
        let policy = DaysPolicy::new(12, 30);
        let comparison = release("2.327.1", 100);
        let latest = release("2.329.0", 1);
        let newer = vec![latest.clone(), release("2.328.0", 65)];

        let verdict = policy.evaluate(&comparison, &latest, &newer, now());

        assert!(verdict.is_expired);
        assert_eq!(verdict.days_old, 65);
        assert!(verdict.message.contains("2.328.0"));
        assert!(verdict.message.contains("35 days past the 30-day limit"));
    }

    #[test]
    fn evaluate_sets_no_flag_without_newer_releases() {
        let policy = DaysPolicy::new(12, 30);
        let latest = release("2.329.0", 3);

        let verdict = policy.evaluate(&latest, &latest, &[], now());

        assert!(!verdict.is_expired && !verdict.is_critical && !verdict.is_warning);
        assert_eq!(verdict.days_old, 0);
    }

    #[test]
    fn evaluate_reports_days_left_before_expiry() {
        let policy = DaysPolicy::new(12, 30);
        let newer = vec![release("2.328.0", 20)];

        let verdict = policy.evaluate(&release("2.327.1", 50), &newer[0], &newer, now());

        assert!(verdict.message.ends_with("10 days left to update"));
    }

    #[rstest]
    #[case(12, 30, true)]
    #[case(0, 1, true)]
    #[case(30, 30, false)]
    #[case(-1, 30, false)]
    #[case(12, MAX_DAYS_LIMIT, true)]
    #[case(12, 100_000_000, false)]
    fn validate_checks_threshold_order(
        #[case] critical: i64,
        #[case] max: i64,
        #[case] valid: bool,
    ) {
        assert_eq!(DaysPolicy::new(critical, max).validate().is_ok(), valid);
    }

    #[test]
    fn validate_rejects_max_days_beyond_limit() {
        let err = DaysPolicy::new(12, 100_000_000).validate().unwrap_err();

        assert!(matches!(
            err,
            ConfigError::ThresholdTooLarge {
                max_days: 100_000_000,
                limit: MAX_DAYS_LIMIT
            }
        ));
    }
}
