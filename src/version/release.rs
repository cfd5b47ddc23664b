//! Release record shared by the cache, the release sources and the analyzer

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};

/// A published release: version, publication instant and canonical URL.
///
/// Two releases are equal when their versions are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub version: Version,
    pub published_at: DateTime<Utc>,
    pub url: String,
}

impl Release {
    pub fn new(version: Version, published_at: DateTime<Utc>, url: impl Into<String>) -> Self {
        Self {
            version,
            published_at,
            url: url.into(),
        }
    }

    /// Whether this is a stable release (no pre-release label)
    pub fn is_stable(&self) -> bool {
        self.version.pre.is_empty()
    }
}

impl PartialEq for Release {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
    }
}

impl Eq for Release {}

/// Returns the release with the greatest semantic version
pub fn latest_release(releases: &[Release]) -> Option<&Release> {
    releases.iter().max_by(|a, b| a.version.cmp(&b.version))
}

/// Oldest publication first; releases published together sort by version
pub fn by_publication(a: &Release, b: &Release) -> Ordering {
    a.published_at
        .cmp(&b.published_at)
        .then_with(|| a.version.cmp(&b.version))
}
