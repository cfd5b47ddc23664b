use chrono::{DateTime, Utc};
use semver::{BuildMetadata, Version};

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Strips a leading `v`, pads partial versions with zeros and drops build
/// metadata, which carries no precedence.
///
/// Examples:
/// - "v2.329.0" -> Version(2, 329, 0)
/// - "1" -> Version(1, 0, 0)
/// - "1.2" -> Version(1, 2, 0)
pub fn parse_version(version: &str) -> Result<Version, semver::Error> {
    let trimmed = version.trim();
    let stripped = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    let parts: Vec<&str> = stripped.split('.').collect();
    let normalized = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => stripped.to_string(),
    };
    let mut parsed = Version::parse(&normalized)?;
    parsed.build = BuildMetadata::EMPTY;
    Ok(parsed)
}

/// Whole days elapsed between two instants, truncated toward zero.
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_days()
}
