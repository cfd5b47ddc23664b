//! Release source trait for fetching releases from a remote project

#[cfg(test)]
use mockall::automock;

use crate::version::error::SourceError;
use crate::version::release::Release;

/// Trait for fetching published releases of a single repository
///
/// Implementations exclude drafts and pre-releases. No ordering is guaranteed
/// across calls; callers sort as needed.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetches the most recent published release
    async fn latest(&self) -> Result<Release, SourceError>;

    /// Fetches up to `count` most recent releases, newest first
    async fn recent(&self, count: usize) -> Result<Vec<Release>, SourceError>;

    /// Fetches every published release, following pagination
    async fn all(&self) -> Result<Vec<Release>, SourceError>;
}
