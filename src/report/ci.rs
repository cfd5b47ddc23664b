//! GitHub Actions workflow commands
//!
//! Expired versions are reported as errors, critical and warning versions as
//! warnings, everything else as a notice.

use crate::version::analysis::{AnalysisResult, Status};

const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");

pub(super) fn render(result: &AnalysisResult) -> String {
    let command = match result.status() {
        Status::Expired => "error",
        Status::Critical | Status::Warning => "warning",
        Status::Current => "notice",
    };

    let title = match &result.comparison_version {
        Some(version) => format!(
            "{}: {} {} is {}",
            PACKAGE_NAME,
            result.repository,
            version,
            result.status()
        ),
        None => format!("{}: {}", PACKAGE_NAME, result.repository),
    };

    format!(
        "::{} title={}::{}",
        command,
        escape_property(&title),
        escape_data(&result.message)
    )
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}
