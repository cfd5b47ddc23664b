//! Release cache: embedded snapshots and user-supplied cache files
//!
//! A snapshot is a JSON document:
//!
//! ```json
//! {
//!   "generated_at": "2025-10-15T06:00:00Z",
//!   "repository": "actions/runner",
//!   "releases": [
//!     { "version": "2.329.0", "published_at": "2025-10-14T14:36:05Z", "url": "https://..." }
//!   ]
//! }
//! ```
//!
//! Entries that fail to parse are skipped; a document that is not valid JSON
//! fails the load.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::RepositoryConfig;
use crate::version::error::CacheError;
use crate::version::release::{Release, latest_release};
use crate::version::semver::parse_version;

/// Snapshots compiled into the binary, by name
const EMBEDDED_SNAPSHOTS: &[(&str, &str)] = &[(
    "actions-runner.json",
    include_str!("../../data/actions-runner.json"),
)];

/// A list of releases captured at a point in time
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    pub releases: Vec<Release>,
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    repository: Option<String>,
    #[serde(default)]
    releases: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CachedRelease {
    version: String,
    published_at: DateTime<Utc>,
    url: String,
}

impl CachedRelease {
    fn into_release(self) -> Option<Release> {
        let version = parse_version(&self.version).ok()?;
        if self.published_at.timestamp() <= 0 {
            return None;
        }
        let release = Release::new(version, self.published_at, self.url);
        release.is_stable().then_some(release)
    }
}

impl Snapshot {
    pub fn new(repository: Option<String>, releases: Vec<Release>) -> Self {
        Self {
            generated_at: Some(Utc::now()),
            repository,
            releases,
        }
    }

    /// Parses a snapshot document, skipping invalid release entries
    pub fn parse(content: &str, origin: &str) -> Result<Self, CacheError> {
        let raw: RawSnapshot =
            serde_json::from_str(content).map_err(|source| CacheError::Malformed {
                origin: origin.to_string(),
                source,
            })?;

        let total = raw.releases.len();
        let releases: Vec<Release> = raw
            .releases
            .into_iter()
            .filter_map(|entry| serde_json::from_value::<CachedRelease>(entry).ok())
            .filter_map(CachedRelease::into_release)
            .collect();

        if releases.len() < total {
            debug!(
                "Skipped {} invalid entries in cache {}",
                total - releases.len(),
                origin
            );
        }

        Ok(Self {
            generated_at: raw.generated_at,
            repository: raw.repository,
            releases,
        })
    }

    /// Reads a snapshot from a file
    pub fn read(path: &Path) -> Result<Self, CacheError> {
        let content = std::fs::read_to_string(path).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Loads a snapshot compiled into the binary
    pub fn embedded(name: &str) -> Result<Self, CacheError> {
        let content = EMBEDDED_SNAPSHOTS
            .iter()
            .find(|(embedded, _)| *embedded == name)
            .map(|(_, content)| *content)
            .ok_or_else(|| CacheError::UnknownSnapshot(name.to_string()))?;
        Self::parse(content, &format!("embedded:{name}"))
    }

    /// Writes the snapshot as pretty-printed JSON
    pub fn write(&self, path: &Path) -> Result<(), CacheError> {
        let mut content = serde_json::to_string_pretty(self).map_err(CacheError::Encode)?;
        content.push('\n');
        std::fs::write(path, content).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The release with the greatest version
    pub fn latest(&self) -> Option<&Release> {
        latest_release(&self.releases)
    }
}

/// Trait for loading previously captured releases of a repository
pub trait CacheLoader: Send + Sync {
    /// Returns `None` when no cache applies to the repository
    fn load(&self, config: &RepositoryConfig) -> Result<Option<Snapshot>, CacheError>;
}

/// Loads a user-supplied cache file, falling back to the embedded snapshot
///
/// Precedence:
/// 1. the user file, when set
/// 2. the embedded snapshot named by `cache_path`, when the cache is enabled
/// 3. nothing
#[derive(Debug, Clone, Default)]
pub struct SnapshotLoader {
    user_path: Option<PathBuf>,
}

impl SnapshotLoader {
    pub fn new(user_path: Option<PathBuf>) -> Self {
        Self { user_path }
    }
}

impl CacheLoader for SnapshotLoader {
    fn load(&self, config: &RepositoryConfig) -> Result<Option<Snapshot>, CacheError> {
        if let Some(path) = &self.user_path {
            info!("Loading release cache from {:?}", path);
            let snapshot = Snapshot::read(path)?;
            let full_name = config.full_name();
            match &snapshot.repository {
                Some(repository) if !repository.eq_ignore_ascii_case(&full_name) => {
                    warn!(
                        "Cache file {:?} was generated for {}, not {}",
                        path, repository, full_name
                    );
                }
                _ => {}
            }
            return Ok(Some(snapshot));
        }

        match (&config.cache_path, config.cache_enabled) {
            (Some(name), true) => {
                debug!("Loading embedded snapshot {}", name);
                Snapshot::embedded(name).map(Some)
            }
            _ => Ok(None),
        }
    }
}

/// Whether the greatest cached version is still among the recent releases
///
/// An empty cache is never fresh.
pub fn is_fresh(cached: &[Release], recent: &[Release]) -> bool {
    latest_release(cached)
        .is_some_and(|greatest| recent.iter().any(|r| r.version == greatest.version))
}

/// Merges cached and recent releases, de-duplicated by version
///
/// On conflict the recent copy wins.
pub fn merge_releases(cached: &[Release], recent: &[Release]) -> Vec<Release> {
    let mut merged: IndexMap<String, Release> =
        IndexMap::with_capacity(cached.len() + recent.len());
    for release in cached.iter().chain(recent) {
        merged.insert(release.version.to_string(), release.clone());
    }
    merged.into_values().collect()
}
