//! CSV report sink.

use std::{
    io::{self, Write},
    path::Path,
};

use tempfile::NamedTempFile;
use tracing::info;

use crate::{domain::report::PageReport, infra::error::InfraError};

pub const REPORT_HEADER: [&str; 3] = ["url", "status", "details"];

/// Serialize `reports` as CSV: one header line, one row per report, every
/// line free of trailing whitespace and exactly one newline at the end.
pub fn render_csv(reports: &[PageReport]) -> io::Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(REPORT_HEADER)?;
    for report in reports {
        writer.write_record([report.url(), report.status().as_str(), report.details()])?;
    }

    let bytes = writer.into_inner().map_err(|err| err.into_error())?;
    let raw = String::from_utf8(bytes)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

    let mut lines: Vec<&str> = raw.split('\n').map(str::trim_end).collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    let mut out = lines.join("\n");
    out.push('\n');
    Ok(out)
}

/// Write the report to `path`, replacing any existing file only once the
/// whole report has been written.
pub fn write_report(path: &Path, reports: &[PageReport]) -> Result<(), InfraError> {
    let contents = render_csv(reports).map_err(|err| InfraError::report(path, err))?;

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file =
        NamedTempFile::new_in(directory).map_err(|err| InfraError::report(path, err))?;
    file.write_all(contents.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|err| InfraError::report(path, err))?;
    file.persist(path)
        .map_err(|err| InfraError::report(path, err.error))?;

    info!(
        target = "domcheck::report",
        path = %path.display(),
        rows = reports.len(),
        "report written"
    );
    Ok(())
}
