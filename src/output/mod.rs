//! Output formatting for update reports
//!
//! This module provides:
//! - Text output for human-readable display
//! - JSON output for machine processing

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::{TextFormatter, VersionChangeType};

use crate::domain::UpdateReport;
use crate::error::AppError;
use std::io::Write;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for machine processing
    Json,
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Summary line only
    Quiet,
    #[default]
    Normal,
    /// Also list unchanged module types
    Verbose,
}

/// Configuration for output formatting
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub verbosity: Verbosity,
    /// Whether to use colors (when supported)
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            verbosity: Verbosity::default(),
            color: true,
        }
    }
}

impl OutputConfig {
    pub fn new(format: OutputFormat, verbosity: Verbosity) -> Self {
        Self {
            format,
            verbosity,
            color: true,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

/// Trait for report formatters
pub trait ReportFormatter {
    /// Format and write an update report
    fn format_report(&self, report: &UpdateReport, writer: &mut dyn Write) -> std::io::Result<()>;

    /// Format and write a failed operation
    fn format_error(&self, error: &AppError, writer: &mut dyn Write) -> std::io::Result<()>;
}

/// Create a report formatter based on configuration
pub fn create_formatter(config: OutputConfig) -> Box<dyn ReportFormatter> {
    match config.format {
        OutputFormat::Text => Box::new(TextFormatter::with_color(config.verbosity, config.color)),
        OutputFormat::Json => Box::new(JsonFormatter::new(config.verbosity)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChangeKind;

    #[test]
    fn test_output_config_default() {
        let config = OutputConfig::default();
        assert_eq!(config.format, OutputFormat::Text);
        assert_eq!(config.verbosity, Verbosity::Normal);
        assert!(config.color);
    }

    #[test]
    fn test_create_formatter() {
        let mut report = UpdateReport::new("app-1.0.0", "app-1.0.1");
        report
            .modules
            .record(ChangeKind::Added, "mod-b", None, Some("1.0.0".into()));

        let formatter = create_formatter(OutputConfig::new(OutputFormat::Json, Verbosity::Normal));
        let mut buf = Vec::new();
        formatter.format_report(&report, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["applicationId"], "app-1.0.1");

        let formatter = create_formatter(
            OutputConfig::new(OutputFormat::Text, Verbosity::Normal).with_color(false),
        );
        let mut buf = Vec::new();
        formatter.format_report(&report, &mut buf).unwrap();
        assert!(String::from_utf8(buf).unwrap().contains("mod-b"));
    }
}
