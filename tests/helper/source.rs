//! Release source test utilities

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use semver::Version;

use release_audit::config::{PolicyConfig, RepositoryConfig};
use release_audit::version::analyzer::Analyzer;
use release_audit::version::cache::{CacheLoader, Snapshot};
use release_audit::version::error::{CacheError, SourceError};
use release_audit::version::release::Release;
use release_audit::version::source::ReleaseSource;

/// Fixed reference instant shared by the integration tests
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 17, 12, 0, 0).unwrap()
}

pub fn release(version: &str, days_ago: i64) -> Release {
    Release::new(
        Version::parse(version).unwrap(),
        now() - Duration::days(days_ago),
        format!("https://github.com/actions/runner/releases/tag/v{version}"),
    )
}

/// Stub source serving a fixed list of releases and recording the calls made
pub struct StubSource {
    releases: Vec<Release>,
    calls: Mutex<Vec<&'static str>>,
}

impl StubSource {
    pub fn new(releases: Vec<Release>) -> Arc<Self> {
        Arc::new(Self {
            releases,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn newest_first(&self) -> Vec<Release> {
        let mut releases = self.releases.clone();
        releases.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        releases
    }
}

#[async_trait]
impl ReleaseSource for StubSource {
    async fn latest(&self) -> Result<Release, SourceError> {
        self.record("latest");
        self.newest_first()
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::NotFound("stub".to_string()))
    }

    async fn recent(&self, count: usize) -> Result<Vec<Release>, SourceError> {
        self.record("recent");
        let mut releases = self.newest_first();
        releases.truncate(count);
        Ok(releases)
    }

    async fn all(&self) -> Result<Vec<Release>, SourceError> {
        self.record("all");
        Ok(self.releases.clone())
    }
}

/// Cache loader returning a fixed list of releases
pub struct StaticCache(pub Vec<Release>);

impl CacheLoader for StaticCache {
    fn load(&self, _config: &RepositoryConfig) -> Result<Option<Snapshot>, CacheError> {
        Ok(Some(Snapshot::new(None, self.0.clone())))
    }
}

pub fn days_config() -> RepositoryConfig {
    RepositoryConfig::resolve("actions-runner").unwrap()
}

pub fn versions_config(max_versions_behind: u64) -> RepositoryConfig {
    RepositoryConfig {
        policy: PolicyConfig::Versions {
            max_versions_behind,
        },
        ..RepositoryConfig::new("kubernetes", "kubernetes")
    }
}

/// Analyzer over `source` with an empty cache and a fixed clock
pub fn analyzer(config: RepositoryConfig, source: Arc<StubSource>) -> Analyzer {
    Analyzer::new(config, source)
        .with_cache_loader(Arc::new(StaticCache(Vec::new())))
        .with_now(now())
}
