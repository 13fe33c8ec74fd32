//! Descriptive statistics for a whole frame.
//!
//! Every column gets a kind-specific summary. Full mode adds the expensive
//! parts: histograms, a Pearson correlation matrix over numeric columns and a
//! duplicate-row count. The profiler never mutates the frame it is given.

use super::ReportMode;
use crate::dataset::{ColumnKind, column_names, float_chunked, text_values};
use crate::error::Result;
use chrono::DateTime;
use polars::prelude::cov::pearson_corr;
use polars::prelude::*;
use std::collections::BTreeMap;

/// Rows shown in the sample table.
pub const SAMPLE_ROWS: usize = 10;
/// Most frequent text values listed per column.
pub const TOP_VALUES: usize = 10;

const HIGH_MISSING_PCT: f64 = 20.0;
const HIGH_CARDINALITY: usize = 50;
const SKEW_THRESHOLD: f64 = 1.0;
const HIGH_CORRELATION: f64 = 0.9;

#[derive(Clone, Debug, PartialEq)]
pub struct Overview {
    pub rows: usize,
    pub columns: usize,
    pub missing_cells: usize,
    pub missing_pct: f64,
    /// Only counted in full mode
    pub duplicate_rows: Option<usize>,
    pub kinds: BTreeMap<ColumnKind, usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NumericStats {
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
    pub zeros: usize,
    pub negatives: usize,
    pub skew: Option<f64>,
    pub bin_width: f64,
    /// `(bin start, count)`; empty in minimal mode
    pub histogram: Vec<(f64, usize)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextStats {
    pub top_values: Vec<(String, usize)>,
    pub min_length: usize,
    pub max_length: usize,
    pub mean_length: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimestampStats {
    pub min: Option<String>,
    pub max: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BooleanStats {
    pub true_count: usize,
    pub false_count: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum VariableStats {
    Numeric(NumericStats),
    Text(TextStats),
    Timestamp(TimestampStats),
    Boolean(BooleanStats),
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariableProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub distinct: usize,
    pub missing: usize,
    pub missing_pct: f64,
    pub stats: VariableStats,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertKind {
    HighMissing,
    Constant,
    HighCardinality,
    Skewed,
    Unique,
    Duplicates,
    HighCorrelation,
}

impl AlertKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::HighMissing => "Missing",
            Self::Constant => "Constant",
            Self::HighCardinality => "High cardinality",
            Self::Skewed => "Skewed",
            Self::Unique => "Unique",
            Self::Duplicates => "Duplicates",
            Self::HighCorrelation => "High correlation",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Alert {
    pub kind: AlertKind,
    pub column: Option<String>,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub data: Vec<Vec<Option<f64>>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SampleTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub mode: ReportMode,
    pub overview: Overview,
    pub variables: Vec<VariableProfile>,
    pub alerts: Vec<Alert>,
    pub correlations: Option<CorrelationMatrix>,
    pub sample: SampleTable,
}

impl Profile {
    /// `(column, missing count, missing %)` for every column.
    pub fn missing_table(&self) -> Vec<(&str, usize, f64)> {
        self.variables
            .iter()
            .map(|v| (v.name.as_str(), v.missing, v.missing_pct))
            .collect()
    }
}

/// Reported once per column, before it is summarized.
#[derive(Clone, Copy, Debug)]
pub struct ProfileProgress<'a> {
    pub column: &'a str,
    pub index: usize,
    pub total: usize,
}

pub fn profile(df: &DataFrame, mode: ReportMode) -> Result<Profile> {
    profile_with_progress(df, mode, |_| {})
}

pub fn profile_with_progress<F>(df: &DataFrame, mode: ReportMode, mut on_progress: F) -> Result<Profile>
where
    F: FnMut(ProfileProgress<'_>),
{
    let full = mode == ReportMode::Full;
    let total = df.width();
    let rows = df.height();

    let mut variables = Vec::with_capacity(total);
    for (index, column) in df.get_columns().iter().enumerate() {
        let name = column.name().as_str();
        on_progress(ProfileProgress {
            column: name,
            index,
            total,
        });
        variables.push(analyse_column(column.as_materialized_series(), full)?);
    }

    let missing_cells: usize = variables.iter().map(|v| v.missing).sum();
    let cells = rows * total;
    let mut kinds = BTreeMap::new();
    for v in &variables {
        *kinds.entry(v.kind).or_insert(0) += 1;
    }

    let duplicate_rows = if full { Some(count_duplicate_rows(df)?) } else { None };
    let correlations = if full { correlation_matrix(df)? } else { None };

    let overview = Overview {
        rows,
        columns: total,
        missing_cells,
        missing_pct: percent(missing_cells, cells),
        duplicate_rows,
        kinds,
    };
    let alerts = collect_alerts(&overview, &variables, correlations.as_ref());

    Ok(Profile {
        mode,
        overview,
        variables,
        alerts,
        correlations,
        sample: sample_table(df, SAMPLE_ROWS)?,
    })
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

fn analyse_column(series: &Series, full: bool) -> Result<VariableProfile> {
    let kind = ColumnKind::of(series.dtype());
    let series = if series.dtype().is_float() {
        float_chunked(series)?.into_series()
    } else {
        series.clone()
    };
    let missing = series.null_count();
    let distinct = series.drop_nulls().n_unique()?;

    let stats = match kind {
        ColumnKind::Integer | ColumnKind::Float => {
            VariableStats::Numeric(analyse_numeric(&float_chunked(&series)?, full)?)
        }
        ColumnKind::Timestamp => VariableStats::Timestamp(analyse_timestamp(&series)?),
        ColumnKind::Boolean => VariableStats::Boolean(analyse_boolean(&series)?),
        ColumnKind::Text => VariableStats::Text(analyse_text(&series)?),
    };

    Ok(VariableProfile {
        name: series.name().to_string(),
        kind,
        distinct,
        missing,
        missing_pct: percent(missing, series.len()),
        stats,
    })
}

pub fn analyse_numeric(ca: &Float64Chunked, with_histogram: bool) -> Result<NumericStats> {
    let mut stats = NumericStats {
        mean: ca.mean(),
        std_dev: ca.std(1),
        min: ca.min(),
        q1: ca.quantile(0.25, QuantileMethod::Linear)?,
        median: ca.median(),
        q3: ca.quantile(0.75, QuantileMethod::Linear)?,
        max: ca.max(),
        zeros: ca.into_iter().flatten().filter(|v| *v == 0.0).count(),
        negatives: ca.into_iter().flatten().filter(|v| *v < 0.0).count(),
        skew: None,
        bin_width: 0.0,
        histogram: Vec::new(),
    };
    stats.skew = stats.skewness();
    if with_histogram {
        (stats.bin_width, stats.histogram) = calculate_histogram(ca, &stats);
    }
    Ok(stats)
}

impl NumericStats {
    /// Mean of Pearson's median skewness and Bowley's quartile skewness.
    /// Pearson's alone when the quartiles coincide; `None` without spread.
    pub fn skewness(&self) -> Option<f64> {
        let median = self.median?;
        let std = self.std_dev.filter(|s| *s > 0.0)?;
        let pearson = 3.0 * (self.mean? - median) / std;
        let bowley = self
            .q1
            .zip(self.q3)
            .filter(|(q1, q3)| q3 > q1)
            .map(|(q1, q3)| (q3 + q1 - 2.0 * median) / (q3 - q1));
        Some(bowley.map_or(pearson, |b| f64::midpoint(pearson, b)))
    }
}

/// Freedman-Diaconis bins over `[min, max]`, between 5 and 50 of them. A
/// constant column gets 20 unit-wide bins centred on its value.
pub fn calculate_histogram(ca: &Float64Chunked, stats: &NumericStats) -> (f64, Vec<(f64, usize)>) {
    let (Some(lo), Some(hi)) = (stats.min, stats.max) else {
        return (0.0, Vec::new());
    };
    let n = ca.len() - ca.null_count();

    if (hi - lo).abs() < f64::EPSILON {
        let start = lo - 10.0;
        let bins = (0..20)
            .map(|i| (start + f64::from(i), if i == 10 { n } else { 0 }))
            .collect();
        return (1.0, bins);
    }

    let spread = match (stats.q1, stats.q3) {
        (Some(q1), Some(q3)) if q3 > q1 => 2.0 * (q3 - q1) / (n as f64).cbrt(),
        _ => (hi - lo) / (n as f64).sqrt(),
    };
    let count = (((hi - lo) / spread).ceil() as usize).clamp(5, 50);
    let width = (hi - lo) / count as f64;

    let mut bins = vec![0; count];
    for v in ca.into_iter().flatten() {
        let idx = (((v - lo) / width).floor() as usize).min(count - 1);
        if let Some(bin) = bins.get_mut(idx) {
            *bin += 1;
        }
    }
    let starts = (0..count).map(|i| lo + i as f64 * width);
    (width, starts.zip(bins).collect())
}

fn analyse_text(series: &Series) -> Result<TextStats> {
    let text = series.cast(&DataType::String)?.drop_nulls();
    let counts = text
        .clone()
        .with_name("value".into())
        .value_counts(true, false, "counts".into(), false)?;
    let values = counts.column("value")?.str()?;
    let freq = counts.column("counts")?.cast(&DataType::UInt64)?;
    let mut top_values: Vec<(String, usize)> = values
        .into_iter()
        .zip(freq.u64()?)
        .filter_map(|(v, c)| Some((v?.to_owned(), c? as usize)))
        .collect();
    top_values.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_values.truncate(TOP_VALUES);

    let lengths = text.str()?.str_len_chars();
    Ok(TextStats {
        top_values,
        min_length: lengths.min().unwrap_or(0) as usize,
        max_length: lengths.max().unwrap_or(0) as usize,
        mean_length: lengths.mean().unwrap_or(0.0),
    })
}

fn format_millis(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn analyse_timestamp(series: &Series) -> Result<TimestampStats> {
    let millis = series
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        .cast(&DataType::Int64)?;
    let millis = millis.i64()?;
    Ok(TimestampStats {
        min: millis.min().map(format_millis),
        max: millis.max().map(format_millis),
    })
}

fn analyse_boolean(series: &Series) -> Result<BooleanStats> {
    let ca = series.bool()?;
    Ok(BooleanStats {
        true_count: ca.num_trues(),
        false_count: ca.num_falses(),
    })
}

/// Rows identical to an earlier row in every column.
fn count_duplicate_rows(df: &DataFrame) -> Result<usize> {
    if df.width() == 0 {
        return Ok(0);
    }
    let distinct = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
    Ok(df.height() - distinct.height())
}

/// Pearson's r on pairwise complete observations; `None` when either side
/// has no spread.
pub fn pearson(a: &Float64Chunked, b: &Float64Chunked) -> Option<f64> {
    pearson_corr(a, b).filter(|r| r.is_finite())
}

pub fn correlation_matrix(df: &DataFrame) -> Result<Option<CorrelationMatrix>> {
    let mut columns = Vec::new();
    let mut values = Vec::new();
    for column in df.get_columns() {
        if ColumnKind::of(column.dtype()).is_numeric() {
            columns.push(column.name().to_string());
            values.push(float_chunked(column.as_materialized_series())?);
        }
    }
    if columns.len() < 2 {
        return Ok(None);
    }

    let data = values
        .iter()
        .enumerate()
        .map(|(i, a)| {
            values
                .iter()
                .enumerate()
                .map(|(j, b)| if i == j { Some(1.0) } else { pearson(a, b) })
                .collect()
        })
        .collect();
    Ok(Some(CorrelationMatrix { columns, data }))
}

fn sample_table(df: &DataFrame, n: usize) -> Result<SampleTable> {
    let head = df.head(Some(n));
    let cells = head
        .get_columns()
        .iter()
        .map(|c| text_values(c.as_materialized_series()))
        .collect::<Result<Vec<_>>>()?;
    let rows = (0..head.height())
        .map(|row| {
            cells
                .iter()
                .map(|col| col.get(row).cloned().flatten())
                .collect()
        })
        .collect();
    Ok(SampleTable {
        columns: column_names(&head),
        rows,
    })
}

fn collect_alerts(
    overview: &Overview,
    variables: &[VariableProfile],
    correlations: Option<&CorrelationMatrix>,
) -> Vec<Alert> {
    let mut alerts = Vec::new();
    let mut push = |kind: AlertKind, column: Option<&str>, message: String| {
        alerts.push(Alert {
            kind,
            column: column.map(str::to_owned),
            message,
        });
    };

    if let Some(dups) = overview.duplicate_rows.filter(|d| *d > 0) {
        push(
            AlertKind::Duplicates,
            None,
            format!(
                "Dataset has {dups} duplicate rows ({:.1}%)",
                percent(dups, overview.rows)
            ),
        );
    }

    for v in variables {
        let name = Some(v.name.as_str());
        let present = overview.rows - v.missing;
        if v.missing_pct >= HIGH_MISSING_PCT {
            push(
                AlertKind::HighMissing,
                name,
                format!("{} has {} ({:.1}%) missing values", v.name, v.missing, v.missing_pct),
            );
        }
        if v.distinct == 1 {
            push(AlertKind::Constant, name, format!("{} has a constant value", v.name));
        }
        if v.kind == ColumnKind::Text && v.distinct > HIGH_CARDINALITY {
            push(
                AlertKind::HighCardinality,
                name,
                format!("{} has a high cardinality: {} distinct values", v.name, v.distinct),
            );
        }
        if present > 1 && v.distinct == present && v.kind != ColumnKind::Boolean {
            push(AlertKind::Unique, name, format!("{} has unique values", v.name));
        }
        if let VariableStats::Numeric(stats) = &v.stats
            && let Some(skew) = stats.skew.filter(|s| s.abs() > SKEW_THRESHOLD)
        {
            push(
                AlertKind::Skewed,
                name,
                format!("{} is highly skewed (skew = {skew:.2})", v.name),
            );
        }
    }

    if let Some(matrix) = correlations {
        for (i, row) in matrix.data.iter().enumerate() {
            for (j, r) in row.iter().enumerate().skip(i + 1) {
                if let (Some(r), Some(a), Some(b)) = (r, matrix.columns.get(i), matrix.columns.get(j))
                    && r.abs() >= HIGH_CORRELATION
                {
                    push(
                        AlertKind::HighCorrelation,
                        Some(a.as_str()),
                        format!("{a} is highly correlated with {b} (r = {r:.2})"),
                    );
                }
            }
        }
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> anyhow::Result<DataFrame> {
        Ok(df!(
            "age" => &[Some(25i64), None, Some(30), Some(41), Some(25)],
            "city" => &[Some("NY"), Some("LA"), Some("NY"), None, Some("NY")],
            "income" => &[50.0, 60.0, 70.0, 80.0, 55.0],
            "member" => &[true, false, true, true, true]
        )?)
    }

    fn variable<'a>(p: &'a Profile, name: &str) -> Option<&'a VariableProfile> {
        p.variables.iter().find(|v| v.name == name)
    }

    #[test]
    fn test_overview_counts() -> anyhow::Result<()> {
        let p = profile(&frame()?, ReportMode::Full)?;
        assert_eq!(p.overview.rows, 5);
        assert_eq!(p.overview.columns, 4);
        assert_eq!(p.overview.missing_cells, 2);
        assert!((p.overview.missing_pct - 10.0).abs() < 1e-9);
        assert_eq!(p.overview.duplicate_rows, Some(0));
        assert_eq!(p.overview.kinds.get(&ColumnKind::Integer), Some(&1));
        assert_eq!(p.overview.kinds.get(&ColumnKind::Boolean), Some(&1));
        Ok(())
    }

    #[test]
    fn test_per_kind_statistics() -> anyhow::Result<()> {
        let p = profile(&frame()?, ReportMode::Full)?;

        let age = variable(&p, "age").ok_or_else(|| anyhow::anyhow!("no age"))?;
        assert_eq!(age.distinct, 3);
        assert_eq!(age.missing, 1);
        match &age.stats {
            VariableStats::Numeric(s) => {
                assert_eq!(s.min, Some(25.0));
                assert_eq!(s.max, Some(41.0));
                assert_eq!(s.median, Some(27.5));
                assert!(!s.histogram.is_empty());
                assert_eq!(s.histogram.iter().map(|b| b.1).sum::<usize>(), 4);
            }
            other => panic!("expected numeric stats, got {other:?}"),
        }

        let city = variable(&p, "city").ok_or_else(|| anyhow::anyhow!("no city"))?;
        match &city.stats {
            VariableStats::Text(s) => {
                assert_eq!(s.top_values[0], ("NY".to_owned(), 3));
                assert_eq!(s.max_length, 2);
            }
            other => panic!("expected text stats, got {other:?}"),
        }

        let member = variable(&p, "member").ok_or_else(|| anyhow::anyhow!("no member"))?;
        assert_eq!(
            member.stats,
            VariableStats::Boolean(BooleanStats {
                true_count: 4,
                false_count: 1
            })
        );
        Ok(())
    }

    #[test]
    fn test_minimal_mode_skips_expensive_parts() -> anyhow::Result<()> {
        let p = profile(&frame()?, ReportMode::Minimal)?;
        assert!(p.correlations.is_none());
        assert_eq!(p.overview.duplicate_rows, None);
        for v in &p.variables {
            if let VariableStats::Numeric(s) = &v.stats {
                assert!(s.histogram.is_empty());
            }
        }
        assert_eq!(p.sample.rows.len(), 5);
        Ok(())
    }

    #[test]
    fn test_correlation_and_duplicates() -> anyhow::Result<()> {
        let df = df!(
            "x" => &[1.0, 2.0, 3.0, 4.0, 4.0],
            "y" => &[2.0, 4.0, 6.0, 8.0, 8.0],
            "z" => &[5.0, 3.0, 4.0, 1.0, 1.0]
        )?;
        let p = profile(&df, ReportMode::Full)?;
        let matrix = p.correlations.clone().ok_or_else(|| anyhow::anyhow!("no matrix"))?;
        let r = matrix.data[0][1].unwrap_or_default();
        assert!((r - 1.0).abs() < 1e-12);
        assert_eq!(p.overview.duplicate_rows, Some(1));
        assert!(p.alerts.iter().any(|a| a.kind == AlertKind::HighCorrelation));
        assert!(p.alerts.iter().any(|a| a.kind == AlertKind::Duplicates));
        Ok(())
    }

    #[test]
    fn test_alerts_for_constant_and_missing() -> anyhow::Result<()> {
        let df = df!(
            "same" => &["a", "a", "a", "a"],
            "gappy" => &[Some(1.0), None, None, Some(2.0)]
        )?;
        let p = profile(&df, ReportMode::Minimal)?;
        assert!(p.alerts.iter().any(|a| a.kind == AlertKind::Constant
            && a.column.as_deref() == Some("same")));
        assert!(p.alerts.iter().any(|a| a.kind == AlertKind::HighMissing
            && a.column.as_deref() == Some("gappy")));
        Ok(())
    }

    #[test]
    fn test_histogram_counts_every_value() -> anyhow::Result<()> {
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        let stats = analyse_numeric(&Float64Chunked::from_slice("v".into(), &values), true)?;
        assert!(stats.bin_width > 0.0);
        assert!((5..=50).contains(&stats.histogram.len()));
        assert_eq!(stats.histogram.iter().map(|b| b.1).sum::<usize>(), 100);
        assert_eq!(stats.q1, Some(24.75));

        let flat = analyse_numeric(&Float64Chunked::from_slice("v".into(), &[3.0, 3.0]), true)?;
        assert_eq!(flat.histogram.len(), 20);
        assert_eq!(flat.histogram[10], (3.0, 2));
        assert_eq!(flat.skew, None);
        Ok(())
    }

    #[test]
    fn test_skew_sign_follows_the_long_tail() -> anyhow::Result<()> {
        let right = analyse_numeric(&Float64Chunked::from_slice("v".into(), &[1.0, 1.0, 2.0, 2.0, 3.0, 40.0]), false)?;
        assert!(right.skew.is_some_and(|s| s > 0.0), "{:?}", right.skew);
        let left = analyse_numeric(&Float64Chunked::from_slice("v".into(), &[-40.0, 1.0, 2.0, 2.0, 3.0, 3.0]), false)?;
        assert!(left.skew.is_some_and(|s| s < 0.0), "{:?}", left.skew);
        Ok(())
    }

    #[test]
    fn test_pearson_needs_variation() {
        let a = Float64Chunked::new("a".into(), &[Some(1.0), Some(2.0), None, Some(3.0)]);
        let b = Float64Chunked::new("b".into(), &[Some(3.0), Some(2.0), Some(9.0), Some(1.0)]);
        let r = pearson(&a, &b).unwrap_or_default();
        assert!((r + 1.0).abs() < 1e-12, "{r}");
        let flat = Float64Chunked::new("c".into(), &[Some(1.0); 4]);
        assert_eq!(pearson(&a, &flat), None);
    }

    #[test]
    fn test_nan_counts_as_missing() -> anyhow::Result<()> {
        let df = df!("v" => &[Some(1.0), Some(f64::NAN), None, Some(3.0)])?;
        let p = profile(&df, ReportMode::Full)?;
        let v = variable(&p, "v").ok_or_else(|| anyhow::anyhow!("no v"))?;
        assert_eq!(v.missing, 2);
        assert_eq!(v.distinct, 2);
        match &v.stats {
            VariableStats::Numeric(s) => {
                assert_eq!(s.mean, Some(2.0));
                assert_eq!(s.max, Some(3.0));
            }
            other => panic!("expected numeric stats, got {other:?}"),
        }
        Ok(())
    }
}
