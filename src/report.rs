//! Automated profiling reports.
//!
//! [`generate`] profiles a frame (see [`profiler`]) and renders the result as a
//! single self-contained HTML page (see [`renderer`]). Reports are identified by
//! a SHA-256 fingerprint of the profiled data and the settings that shaped
//! them, which is what [`ReportCache`] keys on.

pub mod cache;
pub mod profiler;
pub mod renderer;

pub use cache::{ReportCache, fingerprint};
pub use profiler::{Profile, ProfileProgress, profile, profile_with_progress};
pub use renderer::render_html;

use crate::error::{QuickEdaError, Result};
use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How much work the profiler does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    /// Per-column summaries, missing values and a sample only
    Minimal,
    /// Adds correlations, duplicate rows and histograms
    #[default]
    Full,
}

impl ReportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the session's two frames a report describes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportTarget {
    /// The file exactly as uploaded
    Raw,
    /// The frame after coercions and transformations
    #[default]
    Working,
}

impl ReportTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Working => "working",
        }
    }
}

impl fmt::Display for ReportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered profiling report.
#[derive(Clone, Debug)]
pub struct Report {
    pub title: String,
    pub mode: ReportMode,
    pub target: ReportTarget,
    pub fingerprint: String,
    pub generated_at: DateTime<Utc>,
    pub profile: Profile,
    pub html: String,
}

impl Report {
    pub fn as_bytes(&self) -> &[u8] {
        self.html.as_bytes()
    }
}

/// Profiles `df` and renders the HTML page.
///
/// Any failure is reported as [`QuickEdaError::Report`]; the caller is expected
/// to cache only the successful result.
pub fn generate<F>(
    df: &DataFrame,
    title: &str,
    mode: ReportMode,
    target: ReportTarget,
    on_progress: F,
) -> Result<Report>
where
    F: FnMut(ProfileProgress<'_>),
{
    if df.width() == 0 {
        return Err(QuickEdaError::Report("no columns to profile".to_owned()));
    }

    let started = std::time::Instant::now();
    let fingerprint = fingerprint(df, mode, target).map_err(as_report_error)?;
    let profile = profile_with_progress(df, mode, on_progress).map_err(as_report_error)?;
    let generated_at = Utc::now();
    let html = render_html(&profile, title, generated_at);

    tracing::info!(
        "Generated {mode} report for {} columns in {:.2?}",
        df.width(),
        started.elapsed()
    );

    Ok(Report {
        title: title.to_owned(),
        mode,
        target,
        fingerprint,
        generated_at,
        profile,
        html,
    })
}

fn as_report_error(err: QuickEdaError) -> QuickEdaError {
    match err {
        QuickEdaError::Report(_) => err,
        other => QuickEdaError::Report(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_generate_produces_html_page() -> anyhow::Result<()> {
        let df = df!(
            "age" => &[Some(25i64), None, Some(30)],
            "city" => &["NY", "LA", "NY"]
        )?;
        let mut seen = Vec::new();
        let report = generate(&df, "people", ReportMode::Full, ReportTarget::Working, |p| {
            seen.push(p.column.to_owned());
        })?;

        assert!(report.html.starts_with("<!DOCTYPE html>"));
        assert!(report.html.contains("people"));
        assert!(report.html.contains("city"));
        assert_eq!(report.fingerprint.len(), 64);
        assert_eq!(seen, vec!["age", "city"]);
        Ok(())
    }

    #[test]
    fn test_generate_rejects_empty_frame() {
        let df = DataFrame::empty();
        let result = generate(&df, "empty", ReportMode::Minimal, ReportTarget::Raw, |_| {});
        assert!(matches!(result, Err(QuickEdaError::Report(_))));
    }

    #[test]
    fn test_mode_serializes_lowercase() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&ReportMode::Minimal)?, "\"minimal\"");
        assert_eq!(ReportMode::default(), ReportMode::Full);
        assert_eq!(ReportTarget::default().to_string(), "working");
        Ok(())
    }
}
