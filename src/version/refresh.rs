//! Cache maintenance: capturing snapshots and checking how current they are

use chrono::{DateTime, Utc};
use semver::Version;
use tracing::{debug, info};

use crate::config::{RECENT_RELEASES_COUNT, RepositoryConfig};
use crate::version::cache::{CacheLoader, Snapshot, is_fresh};
use crate::version::error::{AnalysisError, SourceError};
use crate::version::semver::days_between;
use crate::version::source::ReleaseSource;

/// Where a repository's release cache stands against the live releases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStatus {
    pub repository: String,
    /// `None` when the snapshot carries no capture date
    pub age_days: Option<i64>,
    pub cached_releases: usize,
    pub cached_latest: Option<Version>,
    pub live_latest: Version,
    pub is_fresh: bool,
}

/// Fetches every release into a snapshot, newest version first
pub async fn fetch_snapshot(
    source: &dyn ReleaseSource,
    config: &RepositoryConfig,
) -> Result<Snapshot, AnalysisError> {
    let repository = config.full_name();
    let mut releases = source
        .all()
        .await
        .map_err(|source| unavailable(&repository, source))?;
    releases.sort_by(|a, b| b.version.cmp(&a.version));
    info!("Captured {} releases of {}", releases.len(), repository);

    Ok(Snapshot::new(Some(repository), releases))
}

/// Compares the applicable cache with the live releases
///
/// Returns `None` without touching the source when no cache applies.
pub async fn inspect_cache(
    source: &dyn ReleaseSource,
    loader: &dyn CacheLoader,
    config: &RepositoryConfig,
    now: DateTime<Utc>,
) -> Result<Option<CacheStatus>, AnalysisError> {
    let repository = config.full_name();
    let Some(snapshot) = loader.load(config)? else {
        debug!("No release cache applies to {}", repository);
        return Ok(None);
    };

    let live_latest = source
        .latest()
        .await
        .map_err(|source| unavailable(&repository, source))?;
    let recent = source
        .recent(RECENT_RELEASES_COUNT)
        .await
        .map_err(|source| unavailable(&repository, source))?;

    Ok(Some(CacheStatus {
        age_days: snapshot.generated_at.map(|at| days_between(at, now)),
        cached_releases: snapshot.releases.len(),
        cached_latest: snapshot.latest().map(|r| r.version.clone()),
        live_latest: live_latest.version,
        is_fresh: is_fresh(&snapshot.releases, &recent),
        repository,
    }))
}

fn unavailable(repository: &str, source: SourceError) -> AnalysisError {
    AnalysisError::SourceUnavailable {
        repository: repository.to_string(),
        source,
    }
}
