use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("critical days must not be negative (got {0})")]
    NegativeThreshold(i64),

    #[error("critical days ({critical_days}) must be lower than max days ({max_days})")]
    MisorderedThresholds { critical_days: i64, max_days: i64 },

    #[error("max days must not exceed {limit} (got {max_days})")]
    ThresholdTooLarge { max_days: i64, limit: i64 },

    #[error("max versions behind must be at least 1 (got {0})")]
    InvalidMaxVersions(u64),

    #[error("invalid repository reference: {0:?} (expected an alias, owner/repo or a GitHub URL)")]
    InvalidRepository(String),

    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("authentication failed: {0}")]
    Unauthorized(String),

    #[error("rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("repository not found: {0}")]
    NotFound(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to read cache file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache {origin} is not valid JSON: {source}")]
    Malformed {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode cache: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("no embedded snapshot named {0:?}")]
    UnknownSnapshot(String),
}

/// Failures surfaced by [`crate::version::analyzer::Analyzer`]
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("{input:?} is not a valid semantic version")]
    InvalidComparisonVersion {
        input: String,
        #[source]
        source: semver::Error,
    },

    #[error("version {version} was not found among the releases of {repository} (latest is {latest})")]
    ComparisonNotFound {
        version: String,
        repository: String,
        latest: String,
    },

    #[error("no releases are available for {0}")]
    DatasetEmpty(String),

    #[error("failed to fetch releases for {repository}")]
    SourceUnavailable {
        repository: String,
        #[source]
        source: SourceError,
    },

    #[error("failed to load the release cache")]
    CacheMalformed(#[from] CacheError),

    #[error("analysis was cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SourceError::Unauthorized("bad credentials".to_string()).to_string())]
    #[case(SourceError::RateLimited { retry_after_secs: Some(60) }.to_string())]
    #[case(SourceError::NotFound("actions/runner".to_string()).to_string())]
    #[case(SourceError::InvalidResponse("missing tag_name".to_string()).to_string())]
    #[case(ConfigError::ThresholdTooLarge { max_days: 100_000, limit: 36_500 }.to_string())]
    #[case(CacheError::UnknownSnapshot("k8s.json".to_string()).to_string())]
    #[case(AnalysisError::Cancelled.to_string())]
    fn messages_start_lowercase(#[case] message: String) {
        assert!(message.starts_with(|c: char| c.is_ascii_lowercase()), "{message}");
    }
}
