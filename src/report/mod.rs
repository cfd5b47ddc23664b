//! Renders analysis results for people, scripts and CI systems
//!
//! Formatters only read [`AnalysisResult`]; they never reach into the analyzer.

mod ci;
mod json;
mod terminal;

use std::fmt;
use std::str::FromStr;

use crate::version::analysis::AnalysisResult;

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
    /// GitHub Actions workflow commands
    Ci,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Terminal => "terminal",
            OutputFormat::Json => "json",
            OutputFormat::Ci => "ci",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "terminal" | "text" => Ok(OutputFormat::Terminal),
            "json" => Ok(OutputFormat::Json),
            "ci" | "github" => Ok(OutputFormat::Ci),
            other => Err(format!(
                "unknown output format {other:?} (expected terminal, json or ci)"
            )),
        }
    }
}

/// Renders `result` in the given format, without a trailing newline
pub fn render(format: OutputFormat, result: &AnalysisResult) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Terminal => Ok(terminal::render(result)),
        OutputFormat::Json => json::render(result),
        OutputFormat::Ci => Ok(ci::render(result)),
    }
}
