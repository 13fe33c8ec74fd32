//! HTML rendering for profiles.
//!
//! The output is one standalone page: styles are inline, histograms are inline
//! SVG, nothing is fetched at view time. Every piece of user data goes through
//! [`escape_html`].

use super::ReportMode;
use super::profiler::{
    Alert, BooleanStats, CorrelationMatrix, NumericStats, Overview, Profile, SampleTable,
    TextStats, TimestampStats, VariableProfile, VariableStats,
};
use crate::utils::{fmt_count, fmt_opt, fmt_pct};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Roboto, Helvetica, Arial, sans-serif; margin: 0; background: #f5f6f8; color: #1f2328; }
header { background: #1f2937; color: #fff; padding: 24px 40px; }
header h1 { margin: 0 0 4px 0; font-size: 26px; }
header .meta { color: #9ca3af; font-size: 13px; }
nav { background: #111827; padding: 8px 40px; }
nav a { color: #d1d5db; margin-right: 18px; text-decoration: none; font-size: 14px; }
main { padding: 20px 40px 60px 40px; }
section { background: #fff; border: 1px solid #e5e7eb; border-radius: 8px; padding: 18px 24px; margin-bottom: 20px; }
h2 { margin-top: 0; font-size: 20px; }
h3 { margin: 0 0 8px 0; font-size: 17px; }
table { border-collapse: collapse; font-size: 13px; }
th, td { padding: 4px 10px; border-bottom: 1px solid #eef0f3; text-align: left; }
th { background: #f9fafb; }
td.num { text-align: right; font-variant-numeric: tabular-nums; }
.grid { display: flex; flex-wrap: wrap; gap: 24px; }
.variable { border-top: 1px solid #e5e7eb; padding-top: 14px; margin-top: 14px; }
.badge { display: inline-block; font-size: 11px; padding: 2px 8px; border-radius: 10px; background: #e0e7ff; color: #3730a3; margin-left: 8px; vertical-align: middle; }
.alert { display: inline-block; font-size: 11px; padding: 2px 8px; border-radius: 10px; background: #fee2e2; color: #991b1b; margin-right: 8px; }
.muted { color: #6b7280; }
.null { color: #9ca3af; font-style: italic; }
.scroll { overflow-x: auto; }
footer { color: #6b7280; font-size: 12px; padding: 0 40px 30px 40px; }
"#;

/// Escapes the five HTML-significant characters.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Renders a full HTML document for `profile`.
pub fn render_html(profile: &Profile, title: &str, generated_at: DateTime<Utc>) -> String {
    let mut html = String::new();
    let title = escape_html(title);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>Profiling Report: {title}</title>");
    let _ = writeln!(html, "<style>{STYLE}</style>\n</head>\n<body>");

    let _ = writeln!(
        html,
        "<header><h1>Profiling Report: {title}</h1><div class=\"meta\">{} mode, generated {}</div></header>",
        profile.mode,
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    html.push_str("<nav><a href=\"#overview\">Overview</a><a href=\"#alerts\">Alerts</a><a href=\"#variables\">Variables</a>");
    if profile.mode == ReportMode::Full {
        html.push_str("<a href=\"#correlations\">Correlations</a>");
    }
    html.push_str("<a href=\"#missing\">Missing values</a><a href=\"#sample\">Sample</a></nav>\n<main>\n");

    render_overview(&mut html, &profile.overview);
    render_alerts(&mut html, &profile.alerts);

    html.push_str("<section id=\"variables\"><h2>Variables</h2>\n");
    for variable in &profile.variables {
        render_variable(&mut html, variable);
    }
    html.push_str("</section>\n");

    if profile.mode == ReportMode::Full {
        render_correlations(&mut html, profile.correlations.as_ref());
    }
    render_missing(&mut html, profile);
    render_sample(&mut html, &profile.sample);

    let _ = writeln!(
        html,
        "</main>\n<footer>Generated by quickeda {}</footer>\n</body>\n</html>",
        env!("CARGO_PKG_VERSION")
    );
    html
}

fn stat_row(html: &mut String, label: &str, value: &str) {
    let _ = writeln!(
        html,
        "<tr><th>{label}</th><td class=\"num\">{}</td></tr>",
        escape_html(value)
    );
}

fn render_overview(html: &mut String, overview: &Overview) {
    html.push_str("<section id=\"overview\"><h2>Overview</h2><div class=\"grid\">\n");

    html.push_str("<table><caption class=\"muted\">Dataset statistics</caption>\n");
    stat_row(html, "Rows", &fmt_count(overview.rows));
    stat_row(html, "Columns", &fmt_count(overview.columns));
    stat_row(html, "Missing cells", &fmt_count(overview.missing_cells));
    stat_row(html, "Missing cells (%)", &fmt_pct(overview.missing_pct));
    if let Some(dups) = overview.duplicate_rows {
        stat_row(html, "Duplicate rows", &fmt_count(dups));
        let pct = if overview.rows == 0 {
            0.0
        } else {
            dups as f64 * 100.0 / overview.rows as f64
        };
        stat_row(html, "Duplicate rows (%)", &fmt_pct(pct));
    }
    html.push_str("</table>\n");

    html.push_str("<table><caption class=\"muted\">Variable types</caption>\n");
    for (kind, count) in &overview.kinds {
        stat_row(html, kind.as_str(), &count.to_string());
    }
    html.push_str("</table>\n</div></section>\n");
}

fn render_alerts(html: &mut String, alerts: &[Alert]) {
    let _ = writeln!(
        html,
        "<section id=\"alerts\"><h2>Alerts <span class=\"badge\">{}</span></h2>",
        alerts.len()
    );
    if alerts.is_empty() {
        html.push_str("<p class=\"muted\">No alerts.</p>\n");
    } else {
        html.push_str("<table>\n");
        for alert in alerts {
            let _ = writeln!(
                html,
                "<tr><td><span class=\"alert\">{}</span></td><td>{}</td></tr>",
                alert.kind.label(),
                escape_html(&alert.message)
            );
        }
        html.push_str("</table>\n");
    }
    html.push_str("</section>\n");
}

fn render_variable(html: &mut String, v: &VariableProfile) {
    let _ = writeln!(
        html,
        "<div class=\"variable\"><h3>{}<span class=\"badge\">{}</span></h3><div class=\"grid\">",
        escape_html(&v.name),
        v.kind
    );

    html.push_str("<table>\n");
    stat_row(html, "Distinct", &fmt_count(v.distinct));
    stat_row(html, "Missing", &fmt_count(v.missing));
    stat_row(html, "Missing (%)", &fmt_pct(v.missing_pct));
    html.push_str("</table>\n");

    match &v.stats {
        VariableStats::Numeric(s) => render_numeric(html, s),
        VariableStats::Text(s) => render_text(html, s),
        VariableStats::Timestamp(s) => render_timestamp(html, s),
        VariableStats::Boolean(s) => render_boolean(html, s),
    }
    html.push_str("</div></div>\n");
}

fn render_numeric(html: &mut String, s: &NumericStats) {
    html.push_str("<table>\n");
    stat_row(html, "Mean", &fmt_opt(s.mean));
    stat_row(html, "Std. deviation", &fmt_opt(s.std_dev));
    stat_row(html, "Minimum", &fmt_opt(s.min));
    stat_row(html, "Q1", &fmt_opt(s.q1));
    stat_row(html, "Median", &fmt_opt(s.median));
    stat_row(html, "Q3", &fmt_opt(s.q3));
    stat_row(html, "Maximum", &fmt_opt(s.max));
    html.push_str("</table>\n<table>\n");
    stat_row(html, "Zeros", &fmt_count(s.zeros));
    stat_row(html, "Negative", &fmt_count(s.negatives));
    stat_row(html, "Skewness", &fmt_opt(s.skew));
    html.push_str("</table>\n");

    if !s.histogram.is_empty() {
        render_histogram(html, &s.histogram, s.bin_width);
    }
}

/// Bar chart of `(bin start, count)` pairs as inline SVG.
fn render_histogram(html: &mut String, bins: &[(f64, usize)], bin_width: f64) {
    const WIDTH: f64 = 360.0;
    const HEIGHT: f64 = 140.0;

    let peak = bins.iter().map(|b| b.1).max().unwrap_or(0).max(1) as f64;
    let bar = WIDTH / bins.len() as f64;

    let _ = writeln!(
        html,
        "<svg width=\"{WIDTH}\" height=\"{}\" role=\"img\" aria-label=\"Histogram\">",
        HEIGHT + 18.0
    );
    for (i, (start, count)) in bins.iter().enumerate() {
        let h = *count as f64 / peak * HEIGHT;
        let _ = writeln!(
            html,
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{h:.1}\" fill=\"#6366f1\"><title>[{}, {}): {count}</title></rect>",
            i as f64 * bar,
            HEIGHT - h,
            (bar - 1.0).max(1.0),
            fmt_opt(Some(*start)),
            fmt_opt(Some(start + bin_width)),
        );
    }
    if let (Some(first), Some(last)) = (bins.first(), bins.last()) {
        let _ = writeln!(
            html,
            "<text x=\"0\" y=\"{}\" font-size=\"10\" fill=\"#6b7280\">{}</text><text x=\"{WIDTH}\" y=\"{}\" font-size=\"10\" fill=\"#6b7280\" text-anchor=\"end\">{}</text>",
            HEIGHT + 14.0,
            fmt_opt(Some(first.0)),
            HEIGHT + 14.0,
            fmt_opt(Some(last.0 + bin_width)),
        );
    }
    html.push_str("</svg>\n");
}

fn render_text(html: &mut String, s: &TextStats) {
    html.push_str("<table>\n");
    stat_row(html, "Min length", &s.min_length.to_string());
    stat_row(html, "Max length", &s.max_length.to_string());
    stat_row(html, "Mean length", &format!("{:.2}", s.mean_length));
    html.push_str("</table>\n");

    if !s.top_values.is_empty() {
        html.push_str("<table><tr><th>Value</th><th>Count</th></tr>\n");
        for (value, count) in &s.top_values {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td class=\"num\">{}</td></tr>",
                escape_html(value),
                fmt_count(*count)
            );
        }
        html.push_str("</table>\n");
    }
}

fn render_timestamp(html: &mut String, s: &TimestampStats) {
    html.push_str("<table>\n");
    stat_row(html, "Minimum", s.min.as_deref().unwrap_or("-"));
    stat_row(html, "Maximum", s.max.as_deref().unwrap_or("-"));
    html.push_str("</table>\n");
}

fn render_boolean(html: &mut String, s: &BooleanStats) {
    html.push_str("<table>\n");
    stat_row(html, "True", &fmt_count(s.true_count));
    stat_row(html, "False", &fmt_count(s.false_count));
    html.push_str("</table>\n");
}

/// Blue for positive, red for negative, intensity by magnitude.
fn correlation_color(r: f64) -> String {
    let strength = r.abs().clamp(0.0, 1.0);
    let fade = |c: f64| (255.0 - (255.0 - c) * strength).round() as u8;
    if r >= 0.0 {
        format!("rgb({},{},{})", fade(59.0), fade(130.0), fade(246.0))
    } else {
        format!("rgb({},{},{})", fade(239.0), fade(68.0), fade(68.0))
    }
}

fn render_correlations(html: &mut String, matrix: Option<&CorrelationMatrix>) {
    html.push_str("<section id=\"correlations\"><h2>Correlations</h2>\n");
    let Some(matrix) = matrix else {
        html.push_str("<p class=\"muted\">At least two numeric columns are needed for a correlation matrix.</p></section>\n");
        return;
    };

    html.push_str("<p class=\"muted\">Pearson's r over pairwise complete observations.</p>\n");
    html.push_str("<div class=\"scroll\"><table><tr><th></th>");
    for name in &matrix.columns {
        let _ = write!(html, "<th>{}</th>", escape_html(name));
    }
    html.push_str("</tr>\n");
    for (name, row) in matrix.columns.iter().zip(&matrix.data) {
        let _ = write!(html, "<tr><th>{}</th>", escape_html(name));
        for r in row {
            match r {
                Some(r) => {
                    let _ = write!(
                        html,
                        "<td class=\"num\" style=\"background:{}\">{r:.2}</td>",
                        correlation_color(*r)
                    );
                }
                None => html.push_str("<td class=\"num null\">n/a</td>"),
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table></div></section>\n");
}

fn render_missing(html: &mut String, profile: &Profile) {
    html.push_str("<section id=\"missing\"><h2>Missing values</h2>\n");
    html.push_str("<table><tr><th>Column</th><th>Missing</th><th>%</th></tr>\n");
    for (name, count, pct) in profile.missing_table() {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td></tr>",
            escape_html(name),
            fmt_count(count),
            fmt_pct(pct)
        );
    }
    html.push_str("</table></section>\n");
}

fn render_sample(html: &mut String, sample: &SampleTable) {
    html.push_str("<section id=\"sample\"><h2>Sample</h2>\n");
    let _ = writeln!(
        html,
        "<p class=\"muted\">First {} rows.</p>",
        sample.rows.len()
    );
    html.push_str("<div class=\"scroll\"><table><tr>");
    for name in &sample.columns {
        let _ = write!(html, "<th>{}</th>", escape_html(name));
    }
    html.push_str("</tr>\n");
    for row in &sample.rows {
        html.push_str("<tr>");
        for cell in row {
            match cell {
                Some(v) => {
                    let _ = write!(html, "<td>{}</td>", escape_html(v));
                }
                None => html.push_str("<td class=\"null\">null</td>"),
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table></div></section>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::profile;
    use polars::prelude::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"Tom\" & 'Jerry'</b>"),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_user_data_is_escaped() -> anyhow::Result<()> {
        let df = df!("<script>" => &["<img src=x>", "ok"])?;
        let html = render_html(&profile(&df, ReportMode::Minimal)?, "a&b", Utc::now());
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<img"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Profiling Report: a&amp;b"));
        Ok(())
    }

    #[test]
    fn test_sections_follow_mode() -> anyhow::Result<()> {
        let df = df!("x" => &[1.0, 2.0, 3.0], "y" => &[3.0, 1.0, 2.0])?;

        let full = render_html(&profile(&df, ReportMode::Full)?, "t", Utc::now());
        assert!(full.contains("id=\"correlations\""));
        assert!(full.contains("<svg"));
        assert!(full.contains("Duplicate rows"));

        let minimal = render_html(&profile(&df, ReportMode::Minimal)?, "t", Utc::now());
        assert!(!minimal.contains("id=\"correlations\""));
        assert!(!minimal.contains("<svg"));
        assert!(minimal.contains("id=\"missing\""));
        assert!(minimal.contains("id=\"sample\""));
        Ok(())
    }

    #[test]
    fn test_correlation_colors() {
        assert_eq!(correlation_color(0.0), "rgb(255,255,255)");
        assert_eq!(correlation_color(1.0), "rgb(59,130,246)");
        assert_eq!(correlation_color(-1.0), "rgb(239,68,68)");
    }
}
