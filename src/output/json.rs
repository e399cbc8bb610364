//! JSON output formatter for machine processing

use crate::domain::UpdateReport;
use crate::error::{AppError, ErrorDetail, ErrorKind};
use crate::output::{ReportFormatter, Verbosity};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    verbosity: Verbosity,
}

impl JsonFormatter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

/// Counts-only rendering used in quiet mode
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary<'a> {
    previous_id: &'a str,
    application_id: &'a str,
    changes: usize,
}

#[derive(Serialize)]
struct JsonError<'a> {
    kind: ErrorKind,
    message: &'a str,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    details: &'a [ErrorDetail],
}

fn write_pretty<T: Serialize>(value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    writeln!(writer, "{}", json)
}

impl ReportFormatter for JsonFormatter {
    fn format_report(&self, report: &UpdateReport, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            return write_pretty(
                &JsonSummary {
                    previous_id: &report.previous_id,
                    application_id: &report.application_id,
                    changes: report.total_changes(),
                },
                writer,
            );
        }
        write_pretty(report, writer)
    }

    fn format_error(&self, error: &AppError, writer: &mut dyn Write) -> std::io::Result<()> {
        write_pretty(
            &JsonError {
                kind: error.kind,
                message: &error.message,
                details: &error.details,
            },
            writer,
        )
    }
}
