//! Plain-text report with a release timeline table

use crate::config::PolicyType;
use crate::version::analysis::{AnalysisResult, TimelineEntry};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(super) fn render(result: &AnalysisResult) -> String {
    let Some(comparison) = &result.comparison_version else {
        return result.message.clone();
    };

    let mut lines = vec![
        format!(
            "{} {}: {}",
            result.repository,
            comparison,
            result.status().as_str().to_uppercase()
        ),
        result.message.clone(),
        String::new(),
        format!("  Latest version:        {}", result.latest_version),
    ];

    if let Some(released) = result.comparison_released_at {
        lines.push(format!(
            "  Your version released: {}",
            released.format(DATE_FORMAT)
        ));
    }
    if !result.is_latest {
        lines.push(format!("  Releases behind:       {}", result.releases_behind));
        lines.push(format!(
            "  Days since update:     {}",
            result.days_since_update
        ));
    }
    if let Some(minors) = result.minor_versions_behind {
        lines.push(format!("  Minor versions behind: {}", minors));
    }
    if let Some(policy) = policy_line(result) {
        lines.push(format!("  Policy:                {}", policy));
    }

    if !result.recent_releases.is_empty() {
        lines.push(String::new());
        lines.push(format!("  {:<12} {:<11} {}", "VERSION", "RELEASED", "EXPIRES"));
        lines.extend(
            result
                .recent_releases
                .iter()
                .map(|entry| timeline_row(entry, result)),
        );
    }

    lines.join("\n").trim_end().to_string()
}

fn policy_line(result: &AnalysisResult) -> Option<String> {
    match result.policy_type? {
        PolicyType::Days => Some(format!(
            "days (critical after {}, expired after {})",
            result.critical_age_days, result.max_age_days
        )),
        PolicyType::Versions => Some(format!(
            "versions (at most {} minor versions behind)",
            result.max_versions_behind.unwrap_or_default()
        )),
    }
}

fn timeline_row(entry: &TimelineEntry, result: &AnalysisResult) -> String {
    let expires = entry
        .expires_at
        .map_or_else(|| "n/a".to_string(), |at| at.format(DATE_FORMAT).to_string());

    let mut markers = Vec::new();
    if entry.is_latest {
        markers.push("latest".to_string());
    }
    if result.comparison_version.as_ref() == Some(&entry.version) {
        markers.push("your version".to_string());
    }
    if entry.is_expired {
        markers.push("expired".to_string());
    } else if entry.expires_at.is_some() {
        markers.push(format!("{} days left", entry.days_until_expiry));
    }

    format!(
        "  {:<12} {:<11} {:<11} {}",
        entry.version.to_string(),
        entry.released_at.format(DATE_FORMAT).to_string(),
        expires,
        markers.join(", ")
    )
    .trim_end()
    .to_string()
}
