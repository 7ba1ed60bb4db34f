//! One report run: fetch → assemble → render → deliver.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{error, info};

use crate::assemble::{ReportData, assemble_report};
use crate::constants;
use crate::error::{AssemblyError, ReportError};
use crate::export::{Deliver, ExportFormat, render, report_file_name};
use crate::fetch::{DataSource, fetch_all};
use crate::types::{AuthToken, TimeSeriesInputs};
use crate::window::RunClock;

/// Output choices for a run.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub file_prefix: String,
    pub format: ExportFormat,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            file_prefix: constants::DEFAULT_FILE_PREFIX.to_string(),
            format: ExportFormat::default(),
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub path: PathBuf,
    pub file_name: String,
    pub sheet_names: Vec<String>,
    /// Cells that fell back to a placeholder.
    pub issues: Vec<AssemblyError>,
}

/// Generate and deliver the report for the current month.
pub async fn generate_report<S, D>(
    source: &S,
    token: &AuthToken,
    series: &TimeSeriesInputs,
    options: &ReportOptions,
    delivery: &D,
) -> Result<ReportOutcome, ReportError>
where
    S: DataSource,
    D: Deliver,
{
    let clock = RunClock::capture();
    generate_report_at(clock.now(), source, token, series, options, delivery).await
}

/// Same as [`generate_report`] with the run instant supplied by the caller.
pub async fn generate_report_at<S, D>(
    now: DateTime<Utc>,
    source: &S,
    token: &AuthToken,
    series: &TimeSeriesInputs,
    options: &ReportOptions,
    delivery: &D,
) -> Result<ReportOutcome, ReportError>
where
    S: DataSource,
    D: Deliver,
{
    let clock = RunClock::at(now);
    info!(month = %clock.current_month().label(), "Generating analytics report");

    let snapshot = fetch_all(source, token).await.map_err(|e| {
        error!(collection = %e.collection(), error = %e, "Fetch failed; no report written");
        e
    })?;

    let workbook = assemble_report(&ReportData {
        snapshot: &snapshot,
        series,
        clock: &clock,
    });
    info!(
        sheets = workbook.sheets.len(),
        issues = workbook.issues.len(),
        "Assembled workbook"
    );

    let file_name = report_file_name(&options.file_prefix, clock.today(), options.format);
    let contents = render(&workbook, options.format)?;
    let path = delivery.deliver(&file_name, &contents).map_err(|e| {
        error!(error = %e, file = %file_name, "Delivery failed");
        e
    })?;

    Ok(ReportOutcome {
        path,
        file_name,
        sheet_names: workbook.sheet_names(),
        issues: workbook.issues,
    })
}
