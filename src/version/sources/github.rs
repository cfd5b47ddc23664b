//! GitHub Releases API release source

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{MAX_RELEASE_PAGES, RELEASES_PER_PAGE};
use crate::version::error::SourceError;
use crate::version::release::Release;
use crate::version::semver::parse_version;
use crate::version::source::ReleaseSource;

/// Default base URL for GitHub API
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Release object returned by the GitHub Releases API
#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
    html_url: String,
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    prerelease: bool,
}

impl GitHubRelease {
    /// Converts to a [`Release`], dropping drafts, pre-releases and non-semver tags
    fn into_release(self) -> Option<Release> {
        if self.draft || self.prerelease {
            return None;
        }
        let published_at = self.published_at?;
        let Ok(version) = parse_version(&self.tag_name) else {
            debug!("Skipping non-semver tag {}", self.tag_name);
            return None;
        };
        let release = Release::new(version, published_at, self.html_url);
        release.is_stable().then_some(release)
    }
}

/// Release source backed by the GitHub Releases API
pub struct GitHubSource {
    client: reqwest::Client,
    base_url: String,
    owner: String,
    repo: String,
    token: Option<String>,
}

impl GitHubSource {
    /// Creates a new GitHubSource against a custom base URL
    pub fn new(
        base_url: &str,
        owner: &str,
        repo: &str,
        token: Option<String>,
    ) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("release-audit/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Creates a GitHubSource against api.github.com
    pub fn for_repository(
        owner: &str,
        repo: &str,
        token: Option<String>,
    ) -> Result<Self, SourceError> {
        Self::new(DEFAULT_BASE_URL, owner, repo, token)
    }

    fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    async fn get(&self, path_and_query: &str) -> Result<reqwest::Response, SourceError> {
        let url = format!(
            "{}/repos/{}/{}/{}",
            self.base_url, self.owner, self.repo, path_and_query
        );
        debug!("GET {}", url);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        match status {
            reqwest::StatusCode::NOT_FOUND => Err(SourceError::NotFound(self.full_name())),
            reqwest::StatusCode::UNAUTHORIZED => Err(SourceError::Unauthorized(
                "GitHub rejected the supplied token".to_string(),
            )),
            reqwest::StatusCode::TOO_MANY_REQUESTS => Err(SourceError::RateLimited {
                retry_after_secs: header("retry-after").and_then(|v| v.parse().ok()),
            }),
            reqwest::StatusCode::FORBIDDEN
                if header("x-ratelimit-remaining").as_deref() == Some("0") =>
            {
                Err(SourceError::RateLimited {
                    retry_after_secs: header("retry-after").and_then(|v| v.parse().ok()),
                })
            }
            reqwest::StatusCode::FORBIDDEN => Err(SourceError::Unauthorized(format!(
                "access to {} is forbidden",
                self.full_name()
            ))),
            _ => {
                warn!("GitHub API returned status {}: {}", status, url);
                Err(SourceError::InvalidResponse(format!(
                    "Unexpected status: {}",
                    status
                )))
            }
        }
    }

    async fn fetch_page(
        &self,
        per_page: usize,
        page: usize,
    ) -> Result<Vec<GitHubRelease>, SourceError> {
        let response = self
            .get(&format!("releases?per_page={}&page={}", per_page, page))
            .await?;

        response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub releases response: {}", e);
            SourceError::InvalidResponse(e.to_string())
        })
    }
}

/// Sorts newest first by publication, breaking ties by greater version
fn sort_newest_first(releases: &mut [Release]) {
    releases.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| b.version.cmp(&a.version))
    });
}

#[async_trait::async_trait]
impl ReleaseSource for GitHubSource {
    async fn latest(&self) -> Result<Release, SourceError> {
        let response = self.get("releases/latest").await?;
        let release: GitHubRelease = response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub latest release response: {}", e);
            SourceError::InvalidResponse(e.to_string())
        })?;

        let tag = release.tag_name.clone();
        release.into_release().ok_or_else(|| {
            SourceError::InvalidResponse(format!(
                "latest release tag {tag:?} is not a stable semantic version"
            ))
        })
    }

    async fn recent(&self, count: usize) -> Result<Vec<Release>, SourceError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        // Over-fetch so filtered drafts and pre-releases do not starve the result
        let per_page = (count * 2).min(RELEASES_PER_PAGE);
        let mut releases: Vec<Release> = self
            .fetch_page(per_page, 1)
            .await?
            .into_iter()
            .filter_map(GitHubRelease::into_release)
            .collect();

        sort_newest_first(&mut releases);
        releases.truncate(count);
        debug!(
            "Fetched {} recent releases for {}",
            releases.len(),
            self.full_name()
        );

        Ok(releases)
    }

    async fn all(&self) -> Result<Vec<Release>, SourceError> {
        let mut releases = Vec::new();

        for page in 1..=MAX_RELEASE_PAGES {
            let batch = self.fetch_page(RELEASES_PER_PAGE, page).await?;
            let batch_len = batch.len();
            releases.extend(batch.into_iter().filter_map(GitHubRelease::into_release));

            if batch_len < RELEASES_PER_PAGE {
                debug!(
                    "Fetched {} releases for {} in {} pages",
                    releases.len(),
                    self.full_name(),
                    page
                );
                sort_newest_first(&mut releases);
                return Ok(releases);
            }
        }

        warn!(
            "Stopped paginating releases for {} after {} pages",
            self.full_name(),
            MAX_RELEASE_PAGES
        );
        sort_newest_first(&mut releases);
        Ok(releases)
    }
}
