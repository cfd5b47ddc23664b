use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::version::error::ConfigError;
use crate::version::policies::create_policy;

// =============================================================================
// Analysis constants
// =============================================================================

/// Number of recent releases fetched to check the cache for freshness
pub const RECENT_RELEASES_COUNT: usize = 5;

/// Releases published within this many days appear in a days-policy timeline
pub const TIMELINE_WINDOW_DAYS: i64 = 90;

/// Minimum number of entries in a days-policy timeline
pub const TIMELINE_MIN_ENTRIES: usize = 4;

/// Page size used when listing releases
pub const RELEASES_PER_PAGE: usize = 100;

/// Upper bound on pages fetched when listing all releases
pub const MAX_RELEASE_PAGES: usize = 50;

// =============================================================================
// Policy defaults
// =============================================================================

pub const DEFAULT_CRITICAL_DAYS: i64 = 12;
pub const DEFAULT_MAX_DAYS: i64 = 30;
pub const DEFAULT_MAX_VERSIONS_BEHIND: u64 = 3;

/// Upper bound for `maxDays`, keeping expiry dates within chrono's range
pub const MAX_DAYS_LIMIT: i64 = 36_500;

/// Alias of the repository audited when none is given
pub const DEFAULT_REPOSITORY: &str = "actions-runner";

/// Kind of expiry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyType {
    /// Expiry measured in days since the first newer release
    Days,
    /// Expiry measured in minor versions behind
    Versions,
}

impl PolicyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyType::Days => "days",
            PolicyType::Versions => "versions",
        }
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "days" => Ok(PolicyType::Days),
            "versions" => Ok(PolicyType::Versions),
            other => Err(format!(
                "unknown policy type {other:?} (expected \"days\" or \"versions\")"
            )),
        }
    }
}

/// Expiry policy selection and its thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum PolicyConfig {
    Days {
        #[serde(default = "default_critical_days")]
        critical_days: i64,
        #[serde(default = "default_max_days")]
        max_days: i64,
    },
    Versions {
        #[serde(default = "default_max_versions_behind")]
        max_versions_behind: u64,
    },
}

fn default_critical_days() -> i64 {
    DEFAULT_CRITICAL_DAYS
}

fn default_max_days() -> i64 {
    DEFAULT_MAX_DAYS
}

fn default_max_versions_behind() -> u64 {
    DEFAULT_MAX_VERSIONS_BEHIND
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig::Days {
            critical_days: DEFAULT_CRITICAL_DAYS,
            max_days: DEFAULT_MAX_DAYS,
        }
    }
}

impl PolicyConfig {
    /// Default thresholds for the given policy type
    pub fn defaults_for(policy_type: PolicyType) -> Self {
        match policy_type {
            PolicyType::Days => PolicyConfig::default(),
            PolicyType::Versions => PolicyConfig::Versions {
                max_versions_behind: DEFAULT_MAX_VERSIONS_BEHIND,
            },
        }
    }

    pub fn policy_type(&self) -> PolicyType {
        match self {
            PolicyConfig::Days { .. } => PolicyType::Days,
            PolicyConfig::Versions { .. } => PolicyType::Versions,
        }
    }
}

/// Audited repository together with its policy and cache settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryConfig {
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Name of the embedded snapshot for this repository
    #[serde(default)]
    pub cache_path: Option<String>,
    #[serde(default)]
    pub cache_enabled: bool,
}

/// Predefined configurations, looked up by alias
const PREDEFINED: &[(&[&str], fn() -> RepositoryConfig)] = &[
    (&["actions-runner", "runner"], actions_runner),
    (&["kubernetes", "k8s"], kubernetes),
];

fn actions_runner() -> RepositoryConfig {
    RepositoryConfig {
        owner: "actions".to_string(),
        repo: "runner".to_string(),
        policy: PolicyConfig::Days {
            critical_days: DEFAULT_CRITICAL_DAYS,
            max_days: DEFAULT_MAX_DAYS,
        },
        cache_path: Some("actions-runner.json".to_string()),
        cache_enabled: true,
    }
}

fn kubernetes() -> RepositoryConfig {
    RepositoryConfig {
        owner: "kubernetes".to_string(),
        repo: "kubernetes".to_string(),
        policy: PolicyConfig::Versions {
            max_versions_behind: DEFAULT_MAX_VERSIONS_BEHIND,
        },
        cache_path: None,
        cache_enabled: false,
    }
}

static REPOSITORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:https?://)?(?:www\.)?github\.com/)?([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+?)(?:\.git)?(?:/.*)?$",
    )
    .unwrap()
});

impl RepositoryConfig {
    /// Configuration for an arbitrary repository: default days policy, no cache
    pub fn new(owner: &str, repo: &str) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            policy: PolicyConfig::default(),
            cache_path: None,
            cache_enabled: false,
        }
    }

    /// Looks up a predefined configuration by alias
    pub fn from_alias(alias: &str) -> Option<Self> {
        let alias = alias.to_ascii_lowercase();
        PREDEFINED
            .iter()
            .find(|(names, _)| names.contains(&alias.as_str()))
            .map(|(_, build)| build())
    }

    /// Primary alias of every predefined repository
    pub fn aliases() -> Vec<&'static str> {
        PREDEFINED.iter().map(|(names, _)| names[0]).collect()
    }

    /// Resolves an alias, `owner/repo` or GitHub URL into a configuration
    ///
    /// A reference naming a predefined repository yields its predefined configuration.
    pub fn resolve(reference: &str) -> Result<Self, ConfigError> {
        let reference = reference.trim();
        if let Some(config) = Self::from_alias(reference) {
            return Ok(config);
        }

        let captures = REPOSITORY_RE
            .captures(reference)
            .ok_or_else(|| ConfigError::InvalidRepository(reference.to_string()))?;
        let owner = &captures[1];
        let repo = &captures[2];

        let predefined = PREDEFINED.iter().map(|(_, build)| build()).find(|config| {
            config.owner.eq_ignore_ascii_case(owner) && config.repo.eq_ignore_ascii_case(repo)
        });

        Ok(predefined.unwrap_or_else(|| Self::new(owner, repo)))
    }

    /// Loads a configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `owner/repo`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Checks the repository identity and the thresholds of the selected policy
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner.is_empty() || self.repo.is_empty() {
            return Err(ConfigError::InvalidRepository(self.full_name()));
        }

        create_policy(&self.policy).validate()
    }
}

/// Environment variables consulted for a GitHub token, in order
pub const TOKEN_ENV_VARS: &[&str] = &["GITHUB_TOKEN", "GH_TOKEN"];

/// Returns the explicit token, or the first non-empty token from the environment
pub fn github_token(explicit: Option<String>) -> Option<String> {
    explicit.filter(|t| !t.is_empty()).or_else(|| {
        TOKEN_ENV_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|t| !t.is_empty())
    })
}

/// Command-line settings layered on top of a resolved configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub policy: Option<PolicyType>,
    pub critical_days: Option<i64>,
    pub max_days: Option<i64>,
    pub max_versions_behind: Option<u64>,
    pub no_cache: bool,
}

impl Overrides {
    /// Applies the overrides; thresholds of the policy not in effect are ignored
    pub fn apply(&self, mut config: RepositoryConfig) -> RepositoryConfig {
        let current = config.policy.policy_type();
        if let Some(policy_type) = self.policy.filter(|t| *t != current) {
            config.policy = PolicyConfig::defaults_for(policy_type);
        }

        match &mut config.policy {
            PolicyConfig::Days {
                critical_days,
                max_days,
            } => {
                if let Some(days) = self.critical_days {
                    *critical_days = days;
                }
                if let Some(days) = self.max_days {
                    *max_days = days;
                }
            }
            PolicyConfig::Versions {
                max_versions_behind,
            } => {
                if let Some(behind) = self.max_versions_behind {
                    *max_versions_behind = behind;
                }
            }
        }

        if self.no_cache {
            config.cache_enabled = false;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use serial_test::serial;

    #[rstest]
    #[case("actions-runner", "actions/runner", PolicyType::Days)]
    #[case("runner", "actions/runner", PolicyType::Days)]
    #[case("Actions-Runner", "actions/runner", PolicyType::Days)]
    #[case("k8s", "kubernetes/kubernetes", PolicyType::Versions)]
    #[case("actions/runner", "actions/runner", PolicyType::Days)]
    #[case("https://github.com/actions/runner", "actions/runner", PolicyType::Days)]
    #[case("https://github.com/cli/cli.git", "cli/cli", PolicyType::Days)]
    #[case("github.com/cli/cli/releases/tag/v2.0.0", "cli/cli", PolicyType::Days)]
    #[case("https://github.com/kubernetes/kubernetes/", "kubernetes/kubernetes", PolicyType::Versions)]
    fn resolve_accepts_aliases_and_references(
        #[case] reference: &str,
        #[case] full_name: &str,
        #[case] policy_type: PolicyType,
    ) {
        let config = RepositoryConfig::resolve(reference).unwrap();

        assert_eq!(config.full_name(), full_name);
        assert_eq!(config.policy.policy_type(), policy_type);
    }

    #[test]
    fn resolve_owner_repo_of_predefined_repository_keeps_its_cache() {
        let config = RepositoryConfig::resolve("actions/runner").unwrap();

        assert!(config.cache_enabled);
        assert_eq!(config.cache_path.as_deref(), Some("actions-runner.json"));
    }

    #[test]
    fn resolve_unknown_repository_uses_defaults_without_cache() {
        let config = RepositoryConfig::resolve("cli/cli").unwrap();

        assert_eq!(
            config,
            RepositoryConfig {
                owner: "cli".to_string(),
                repo: "cli".to_string(),
                policy: PolicyConfig::Days {
                    critical_days: 12,
                    max_days: 30
                },
                cache_path: None,
                cache_enabled: false,
            }
        );
    }

    #[rstest]
    #[case("")]
    #[case("runner-only")]
    #[case("https://gitlab.com/a/b")]
    #[case("a b/c")]
    fn resolve_rejects_invalid_references(#[case] reference: &str) {
        assert!(matches!(
            RepositoryConfig::resolve(reference),
            Err(ConfigError::InvalidRepository(_))
        ));
    }

    #[test]
    fn repository_config_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<RepositoryConfig>(json!({
            "owner": "cli",
            "repo": "cli"
        }))
        .unwrap();

        assert_eq!(result, RepositoryConfig::new("cli", "cli"));
    }

    #[test]
    fn repository_config_from_full_object_parses_all_fields() {
        let result = serde_json::from_value::<RepositoryConfig>(json!({
            "owner": "kubernetes",
            "repo": "kubernetes",
            "policy": { "type": "versions", "maxVersionsBehind": 2 },
            "cachePath": "k8s.json",
            "cacheEnabled": true
        }))
        .unwrap();

        assert_eq!(
            result,
            RepositoryConfig {
                owner: "kubernetes".to_string(),
                repo: "kubernetes".to_string(),
                policy: PolicyConfig::Versions {
                    max_versions_behind: 2
                },
                cache_path: Some("k8s.json".to_string()),
                cache_enabled: true,
            }
        );
    }

    #[test]
    fn days_policy_fields_default_independently() {
        let result = serde_json::from_value::<PolicyConfig>(json!({
            "type": "days",
            "maxDays": 45
        }))
        .unwrap();

        assert_eq!(
            result,
            PolicyConfig::Days {
                critical_days: 12,
                max_days: 45
            }
        );
    }

    #[rstest]
    #[case(PolicyConfig::Days { critical_days: 12, max_days: 30 }, true)]
    #[case(PolicyConfig::Days { critical_days: 0, max_days: 1 }, true)]
    #[case(PolicyConfig::Days { critical_days: 30, max_days: 30 }, false)]
    #[case(PolicyConfig::Days { critical_days: 31, max_days: 30 }, false)]
    #[case(PolicyConfig::Days { critical_days: -1, max_days: 30 }, false)]
    #[case(PolicyConfig::Days { critical_days: 12, max_days: 100_000_000 }, false)]
    #[case(PolicyConfig::Versions { max_versions_behind: 1 }, true)]
    #[case(PolicyConfig::Versions { max_versions_behind: 0 }, false)]
    fn validate_checks_policy_thresholds(#[case] policy: PolicyConfig, #[case] valid: bool) {
        let config = RepositoryConfig {
            policy,
            ..RepositoryConfig::new("cli", "cli")
        };

        assert_eq!(config.validate().is_ok(), valid);
    }

    #[test]
    fn load_reads_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"owner": "cli", "repo": "cli", "cacheEnabled": false}"#)
            .unwrap();

        let config = RepositoryConfig::load(&path).unwrap();

        assert_eq!(config.full_name(), "cli/cli");
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            RepositoryConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[rstest]
    #[case("days", Ok(PolicyType::Days))]
    #[case("versions", Ok(PolicyType::Versions))]
    #[case("weeks", Err(()))]
    fn policy_type_from_str(#[case] input: &str, #[case] expected: Result<PolicyType, ()>) {
        assert_eq!(input.parse::<PolicyType>().map_err(|_| ()), expected);
    }

    #[test]
    fn overrides_replace_thresholds_of_current_policy() {
        let overrides = Overrides {
            max_days: Some(45),
            max_versions_behind: Some(5),
            no_cache: true,
            ..Overrides::default()
        };

        let config = overrides.apply(RepositoryConfig::resolve("actions-runner").unwrap());

        assert_eq!(
            config.policy,
            PolicyConfig::Days {
                critical_days: 12,
                max_days: 45
            }
        );
        assert!(!config.cache_enabled);
    }

    #[test]
    fn overrides_switching_policy_starts_from_its_defaults() {
        let overrides = Overrides {
            policy: Some(PolicyType::Versions),
            max_versions_behind: Some(2),
            ..Overrides::default()
        };

        let config = overrides.apply(RepositoryConfig::new("cli", "cli"));

        assert_eq!(
            config.policy,
            PolicyConfig::Versions {
                max_versions_behind: 2
            }
        );
    }

    #[test]
    fn overrides_keep_policy_when_type_matches() {
        let base = RepositoryConfig {
            policy: PolicyConfig::Days {
                critical_days: 5,
                max_days: 10,
            },
            ..RepositoryConfig::new("cli", "cli")
        };
        let overrides = Overrides {
            policy: Some(PolicyType::Days),
            ..Overrides::default()
        };

        assert_eq!(overrides.apply(base.clone()), base);
    }

    #[test]
    #[serial]
    fn github_token_prefers_explicit_value() {
        // SAFETY: serial_test ensures this test runs exclusively, preventing race conditions
        unsafe {
            std::env::set_var("GITHUB_TOKEN", "from-env");
        }

        assert_eq!(
            github_token(Some("explicit".to_string())).as_deref(),
            Some("explicit")
        );
        assert_eq!(github_token(Some(String::new())).as_deref(), Some("from-env"));

        // SAFETY: serial_test ensures this test runs exclusively, preventing race conditions
        unsafe {
            std::env::remove_var("GITHUB_TOKEN");
        }
    }

    #[test]
    #[serial]
    fn github_token_falls_back_to_gh_token() {
        // SAFETY: serial_test ensures this test runs exclusively, preventing race conditions
        unsafe {
            std::env::remove_var("GITHUB_TOKEN");
            std::env::set_var("GH_TOKEN", "gh");
        }

        assert_eq!(github_token(None).as_deref(), Some("gh"));

        // SAFETY: serial_test ensures this test runs exclusively, preventing race conditions
        unsafe {
            std::env::remove_var("GH_TOKEN");
        }
        assert_eq!(github_token(None), None);
    }
}
