//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Per module type change listing with colors
//! - Semantic version change type indication (major/minor/patch)
//! - Batched error rendering

use crate::domain::{ChangeKind, ModuleChangeEntry, ModuleType, UpdateReport};
use crate::error::AppError;
use crate::output::{ReportFormatter, Verbosity};
use crate::version::parse_version;
use colored::Colorize;
use std::io::Write;

/// Semantic version change type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionChangeType {
    /// Major version change (breaking)
    Major,
    /// Minor version change (features)
    Minor,
    /// Patch or prerelease change
    Patch,
    /// Unknown or unparseable
    Unknown,
}

impl VersionChangeType {
    /// Determine the change type between two versions
    pub fn from_versions(old: &str, new: &str) -> Self {
        match (parse_version(old), parse_version(new)) {
            (Some(old), Some(new)) => {
                if old.major != new.major {
                    VersionChangeType::Major
                } else if old.minor != new.minor {
                    VersionChangeType::Minor
                } else {
                    VersionChangeType::Patch
                }
            }
            _ => VersionChangeType::Unknown,
        }
    }

    pub fn colored_label(&self) -> String {
        match self {
            VersionChangeType::Major => "major".red().bold().to_string(),
            VersionChangeType::Minor => "minor".yellow().to_string(),
            VersionChangeType::Patch => "patch".green().to_string(),
            VersionChangeType::Unknown => "?".dimmed().to_string(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VersionChangeType::Major => "major",
            VersionChangeType::Minor => "minor",
            VersionChangeType::Patch => "patch",
            VersionChangeType::Unknown => "?",
        }
    }
}

const KIND_ORDER: [ChangeKind; 4] = [
    ChangeKind::Added,
    ChangeKind::Upgraded,
    ChangeKind::Downgraded,
    ChangeKind::Removed,
];

/// Text formatter for human-readable output
pub struct TextFormatter {
    verbosity: Verbosity,
    color: bool,
}

impl TextFormatter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            color: true,
        }
    }

    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn kind_marker(&self, kind: ChangeKind) -> String {
        let marker = match kind {
            ChangeKind::Added => "+",
            ChangeKind::Upgraded => "↑",
            ChangeKind::Downgraded => "↓",
            ChangeKind::Removed => "-",
        };
        if !self.color {
            return marker.to_string();
        }
        match kind {
            ChangeKind::Added => marker.green().to_string(),
            ChangeKind::Upgraded => marker.cyan().to_string(),
            ChangeKind::Downgraded => marker.yellow().to_string(),
            ChangeKind::Removed => marker.red().to_string(),
        }
    }

    fn format_entry(
        &self,
        kind: ChangeKind,
        entry: &ModuleChangeEntry,
        max_name_len: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let marker = self.kind_marker(kind);
        let name = format!("{:width$}", entry.name, width = max_name_len);
        let from = entry.from.as_deref().unwrap_or("");
        let to = entry.to.as_deref().unwrap_or("");

        match kind {
            ChangeKind::Upgraded | ChangeKind::Downgraded => {
                let change_type = VersionChangeType::from_versions(from, to);
                if self.color {
                    writeln!(
                        writer,
                        "  {} {} {} {} {} [{}]",
                        marker,
                        name,
                        from.dimmed(),
                        "→".dimmed(),
                        to.bright_white().bold(),
                        change_type.colored_label()
                    )
                } else {
                    writeln!(
                        writer,
                        "  {} {} {} -> {} [{}]",
                        marker,
                        name,
                        from,
                        to,
                        change_type.label()
                    )
                }
            }
            ChangeKind::Added => writeln!(writer, "  {} {} {}", marker, name, to),
            ChangeKind::Removed => {
                if self.color {
                    writeln!(writer, "  {} {} {}", marker, name.dimmed(), from.dimmed())
                } else {
                    writeln!(writer, "  {} {} {}", marker, name, from)
                }
            }
        }
    }

    fn format_module_type(
        &self,
        report: &UpdateReport,
        module_type: ModuleType,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let changes = report.changes(module_type);
        if changes.is_empty() {
            if self.verbosity == Verbosity::Verbose {
                writeln!(writer, "{} modules: no changes", module_type.display_name())?;
            }
            return Ok(());
        }

        let header = format!("{} modules", module_type.display_name());
        if self.color {
            writeln!(writer, "{} ({})", header.bold(), changes.total())?;
        } else {
            writeln!(writer, "{} ({})", header, changes.total())?;
        }

        let max_name_len = KIND_ORDER
            .iter()
            .flat_map(|kind| changes.entries(*kind))
            .map(|e| e.name.len())
            .max()
            .unwrap_or(0)
            .max(20);

        for kind in KIND_ORDER {
            for entry in changes.entries(kind) {
                self.format_entry(kind, entry, max_name_len, writer)?;
            }
        }
        writeln!(writer)
    }

    fn format_summary_line(
        &self,
        report: &UpdateReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let total = report.total_changes();
        let noun = if total == 1 { "change" } else { "changes" };
        if self.color {
            writeln!(
                writer,
                "{} {} {} ({} {})",
                report.previous_id.dimmed(),
                "→".dimmed(),
                report.application_id.bold(),
                total.to_string().green(),
                noun
            )
        } else {
            writeln!(
                writer,
                "{} -> {} ({} {})",
                report.previous_id, report.application_id, total, noun
            )
        }
    }
}

impl ReportFormatter for TextFormatter {
    fn format_report(&self, report: &UpdateReport, writer: &mut dyn Write) -> std::io::Result<()> {
        self.format_summary_line(report, writer)?;
        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }
        writeln!(writer)?;
        for module_type in ModuleType::all() {
            self.format_module_type(report, *module_type, writer)?;
        }
        Ok(())
    }

    fn format_error(&self, error: &AppError, writer: &mut dyn Write) -> std::io::Result<()> {
        let kind = error.kind.to_string();
        if self.color {
            writeln!(writer, "{} {}", kind.red().bold(), error.render())
        } else {
            writeln!(writer, "{} {}", kind, error.render())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorDetail, ErrorKind};

    fn sample_report() -> UpdateReport {
        let mut report = UpdateReport::new("app-platform-1.0.0", "app-platform-1.0.1");
        report.modules.record(
            ChangeKind::Upgraded,
            "mod-users",
            Some("19.1.0".into()),
            Some("19.2.0".into()),
        );
        report
            .modules
            .record(ChangeKind::Added, "mod-notes", None, Some("5.0.0".into()));
        report.ui_modules.record(
            ChangeKind::Removed,
            "folio_inventory",
            Some("11.0.0".into()),
            None,
        );
        report
    }

    fn render(formatter: &TextFormatter, report: &UpdateReport) -> String {
        let mut buf = Vec::new();
        formatter.format_report(report, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_version_change_type() {
        assert_eq!(
            VersionChangeType::from_versions("1.0.0", "2.0.0"),
            VersionChangeType::Major
        );
        assert_eq!(
            VersionChangeType::from_versions("1.0.0", "1.1.0"),
            VersionChangeType::Minor
        );
        assert_eq!(
            VersionChangeType::from_versions("1.0.0", "1.0.1"),
            VersionChangeType::Patch
        );
        assert_eq!(
            VersionChangeType::from_versions("1.0.0", "1.0.0-SNAPSHOT.100001"),
            VersionChangeType::Patch
        );
        assert_eq!(
            VersionChangeType::from_versions("1.0.0", "not-a-version"),
            VersionChangeType::Unknown
        );
    }

    #[test]
    fn test_format_report_plain() {
        let output = render(&TextFormatter::with_color(Verbosity::Normal, false), &sample_report());
        assert!(output.starts_with("app-platform-1.0.0 -> app-platform-1.0.1 (3 changes)"));
        assert!(output.contains("backend modules (2)"));
        assert!(output.contains("19.1.0 -> 19.2.0 [minor]"));
        assert!(output.contains("+ mod-notes"));
        assert!(output.contains("- folio_inventory"));
    }

    #[test]
    fn test_quiet_prints_summary_only() {
        let output = render(&TextFormatter::with_color(Verbosity::Quiet, false), &sample_report());
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn test_verbose_lists_unchanged_types() {
        let report = UpdateReport::new("app-1.0.0", "app-1.0.1");
        let output = render(&TextFormatter::with_color(Verbosity::Verbose, false), &report);
        assert!(output.contains("(0 changes)"));
        assert!(output.contains("modules: no changes"));
    }

    #[test]
    fn test_format_error() {
        let error = AppError::module_not_found(
            "no version satisfies 1 dependency",
            vec![ErrorDetail::new(ErrorKind::ModuleNotFound, "no match").with_artifact("mod-a")],
        );
        let mut buf = Vec::new();
        TextFormatter::with_color(Verbosity::Normal, false)
            .format_error(&error, &mut buf)
            .unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert!(output.starts_with("MODULE_NOT_FOUND no version satisfies"));
        assert!(output.contains("  - mod-a: no match"));
    }
}
