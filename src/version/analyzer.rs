//! Release analysis: assembles the release dataset and applies the policy

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::{PolicyType, RECENT_RELEASES_COUNT, RepositoryConfig};
use crate::version::analysis::{AnalysisResult, Status};
use crate::version::cache::{CacheLoader, SnapshotLoader, is_fresh, merge_releases};
use crate::version::error::{AnalysisError, SourceError};
use crate::version::policies::create_policy;
use crate::version::policy::Policy;
use crate::version::release::{Release, by_publication, latest_release};
use crate::version::semver::{days_between, parse_version};
use crate::version::source::ReleaseSource;

/// Audits a version of one repository against its expiry policy
pub struct Analyzer {
    config: RepositoryConfig,
    source: Arc<dyn ReleaseSource>,
    cache_loader: Arc<dyn CacheLoader>,
    policy: Arc<dyn Policy>,
    bypass_cache: bool,
    now: Option<DateTime<Utc>>,
}

impl Analyzer {
    /// Creates an analyzer that reads the embedded snapshot configured for the repository
    pub fn new(config: RepositoryConfig, source: Arc<dyn ReleaseSource>) -> Self {
        let policy = create_policy(&config.policy);
        Self {
            config,
            source,
            cache_loader: Arc::new(SnapshotLoader::default()),
            policy,
            bypass_cache: false,
            now: None,
        }
    }

    pub fn with_cache_loader(mut self, cache_loader: Arc<dyn CacheLoader>) -> Self {
        self.cache_loader = cache_loader;
        self
    }

    /// Always fetch every release, ignoring any cache
    pub fn bypass_cache(mut self, bypass: bool) -> Self {
        self.bypass_cache = bypass;
        self
    }

    /// Pins the reference instant used for day counts
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Runs the analysis, aborting with [`AnalysisError::Cancelled`] once `cancel` completes
    pub async fn analyze_until<F>(
        &self,
        comparison: Option<&str>,
        cancel: F,
    ) -> Result<AnalysisResult, AnalysisError>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                warn!("Analysis of {} cancelled", self.config.full_name());
                Err(AnalysisError::Cancelled)
            }
            result = self.analyze(comparison) => result,
        }
    }

    /// Analyzes `comparison`, or only reports the latest release when it is `None`
    pub async fn analyze(&self, comparison: Option<&str>) -> Result<AnalysisResult, AnalysisError> {
        let now = self.now.unwrap_or_else(Utc::now);
        let repository = self.config.full_name();

        self.config.validate()?;

        let releases = self.dataset().await?;
        let latest = latest_release(&releases)
            .cloned()
            .ok_or_else(|| AnalysisError::DatasetEmpty(repository.clone()))?;
        info!(
            "Assembled {} releases of {}, latest is {}",
            releases.len(),
            repository,
            latest.version
        );

        let Some(input) = comparison else {
            return Ok(AnalysisResult::latest_only(&repository, &latest));
        };

        let version =
            parse_version(input).map_err(|source| AnalysisError::InvalidComparisonVersion {
                input: input.to_string(),
                source,
            })?;

        let policy_type = self.policy.policy_type();
        let thresholds = self.policy.thresholds();
        let base = AnalysisResult {
            comparison_version: Some(version.clone()),
            recent_releases: self
                .policy
                .timeline(&releases, Some(&version), &latest, now),
            critical_age_days: thresholds.critical_age_days,
            max_age_days: thresholds.max_age_days,
            max_versions_behind: thresholds.max_versions_behind,
            policy_type: Some(policy_type),
            ..AnalysisResult::latest_only(&repository, &latest)
        };

        if version == latest.version {
            return Ok(AnalysisResult {
                comparison_released_at: Some(latest.published_at),
                is_latest: true,
                minor_versions_behind: (policy_type == PolicyType::Versions).then_some(0),
                message: format!("{} is the latest release of {}", version, repository),
                ..base
            });
        }

        let comparison = releases
            .iter()
            .find(|r| r.version == version)
            .cloned()
            .ok_or_else(|| AnalysisError::ComparisonNotFound {
                version: version.to_string(),
                repository: repository.clone(),
                latest: latest.version.to_string(),
            })?;

        let mut newer_releases: Vec<Release> = releases
            .iter()
            .filter(|r| r.version > version)
            .cloned()
            .collect();
        newer_releases.sort_by(by_publication);

        let first_newer = newer_releases.first();
        let days_since_update = first_newer.map_or(0, |r| days_between(r.published_at, now));
        let verdict = self
            .policy
            .evaluate(&comparison, &latest, &newer_releases, now);
        debug!(
            "Policy {} classified {}: expired={} critical={} warning={}",
            policy_type, version, verdict.is_expired, verdict.is_critical, verdict.is_warning
        );

        let mut result = AnalysisResult {
            comparison_released_at: Some(comparison.published_at),
            is_expired: verdict.is_expired,
            is_critical: verdict.is_critical,
            releases_behind: newer_releases.len(),
            days_since_update,
            minor_versions_behind: (policy_type == PolicyType::Versions)
                .then_some(verdict.versions_behind),
            first_newer_version: first_newer.map(|r| r.version.clone()),
            first_newer_release_date: first_newer.map(|r| r.published_at),
            ..base
        };
        result.message = summarize(&result, &verdict.message);
        result.newer_releases = newer_releases;

        Ok(result)
    }

    /// Chooses between the cache merged with recent releases and a full fetch
    async fn dataset(&self) -> Result<Vec<Release>, AnalysisError> {
        if self.bypass_cache {
            info!("Cache bypassed, fetching all releases");
            return self.fetch_all().await;
        }

        let cached = self
            .cache_loader
            .load(&self.config)?
            .map(|snapshot| snapshot.releases)
            .unwrap_or_default();
        if cached.is_empty() {
            debug!("No cached releases for {}", self.config.full_name());
            return self.fetch_all().await;
        }

        let recent = self
            .source
            .recent(RECENT_RELEASES_COUNT)
            .await
            .map_err(|source| self.unavailable(source))?;

        if is_fresh(&cached, &recent) {
            debug!(
                "Cache of {} releases is fresh, merging {} recent releases",
                cached.len(),
                recent.len()
            );
            Ok(merge_releases(&cached, &recent))
        } else {
            info!(
                "Cache is stale (more than {} releases since the snapshot), fetching all releases",
                RECENT_RELEASES_COUNT
            );
            self.fetch_all().await
        }
    }

    async fn fetch_all(&self) -> Result<Vec<Release>, AnalysisError> {
        let releases = self
            .source
            .all()
            .await
            .map_err(|source| self.unavailable(source))?;
        debug!("Fetched {} releases", releases.len());
        Ok(releases)
    }

    fn unavailable(&self, source: SourceError) -> AnalysisError {
        AnalysisError::SourceUnavailable {
            repository: self.config.full_name(),
            source,
        }
    }
}

/// Completes when `signal` fires; a signal that could not be installed never fires
pub async fn on_signal<F, E>(signal: F)
where
    F: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    if let Err(err) = signal.await {
        warn!("Failed to listen for interrupts: {}", err);
        std::future::pending::<()>().await;
    }
}

/// One-line summary: status, release skew and the policy's own explanation
fn summarize(result: &AnalysisResult, detail: &str) -> String {
    let Some(version) = &result.comparison_version else {
        return result.message.clone();
    };
    let headline = match result.status() {
        Status::Expired => "has expired",
        Status::Critical => "expires soon",
        Status::Warning => "is behind",
        Status::Current => "is current",
    };
    let noun = if result.releases_behind == 1 {
        "release"
    } else {
        "releases"
    };

    format!(
        "{} {}: {} {} behind {}, {}",
        version, headline, result.releases_behind, noun, result.latest_version, detail
    )
}
