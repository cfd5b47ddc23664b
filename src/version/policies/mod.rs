//! Concrete expiry policies

mod days;
mod versions;

pub use days::DaysPolicy;
pub use versions::VersionsPolicy;

use std::sync::Arc;

use crate::config::PolicyConfig;
use crate::version::policy::Policy;

/// Creates the policy selected by a configuration
pub fn create_policy(config: &PolicyConfig) -> Arc<dyn Policy> {
    match *config {
        PolicyConfig::Days {
            critical_days,
            max_days,
        } => Arc::new(DaysPolicy::new(critical_days, max_days)),
        PolicyConfig::Versions {
            max_versions_behind,
        } => Arc::new(VersionsPolicy::new(max_versions_behind)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyType;

    #[test]
    fn create_policy_matches_configured_type() {
        let days = create_policy(&PolicyConfig::default());
        assert_eq!(days.policy_type(), PolicyType::Days);
        assert_eq!(days.thresholds().max_age_days, 30);

        let versions = create_policy(&PolicyConfig::Versions {
            max_versions_behind: 2,
        });
        assert_eq!(versions.policy_type(), PolicyType::Versions);
        assert_eq!(versions.thresholds().max_versions_behind, Some(2));
    }
}
