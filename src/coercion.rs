//! Per-column type coercion.
//!
//! Each requested column is converted on its own. A column that cannot be
//! converted is left untouched and reported as a [`CoercionWarning`]; the
//! other columns still convert. Timestamp parsing is permissive: a value no
//! known format accepts becomes null instead of failing the column.

use crate::dataset::{ColumnKind, float_chunked, text_values, timestamp_series};
use crate::error::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

const DATETIME_FORMATS: [&str; 10] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d.%m.%Y", "%d-%m-%Y", "%Y%m%d",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CoercionWarning {
    pub column: String,
    pub message: String,
}

impl std::fmt::Display for CoercionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.column, self.message)
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct CoercionReport {
    /// Columns that now have the requested kind
    pub converted: Vec<String>,
    /// Columns that were skipped, or converted with lost values
    pub warnings: Vec<CoercionWarning>,
}

impl CoercionReport {
    fn warn(&mut self, column: &str, message: impl Into<String>) {
        let warning = CoercionWarning {
            column: column.to_owned(),
            message: message.into(),
        };
        tracing::warn!("Type coercion: {warning}");
        self.warnings.push(warning);
    }
}

/// Converts every column named in `targets`, collecting per-column failures
/// instead of aborting.
pub fn coerce_types(
    df: &DataFrame,
    targets: &BTreeMap<String, ColumnKind>,
) -> Result<(DataFrame, CoercionReport)> {
    let mut out = df.clone();
    let mut report = CoercionReport::default();

    for (name, &target) in targets {
        let Ok(column) = df.column(name) else {
            report.warn(name, "column not found");
            continue;
        };
        let series = column.as_materialized_series();

        match coerce_series(series, target) {
            Ok(Coerced { series, unparsed }) => {
                out.with_column(series)?;
                if unparsed > 0 {
                    report.warn(
                        name,
                        format!("{unparsed} value(s) could not be parsed and were set to missing"),
                    );
                }
                report.converted.push(name.clone());
            }
            Err(reason) => report.warn(name, format!("kept as {}: {reason}", ColumnKind::of(series.dtype()))),
        }
    }

    Ok((out, report))
}

pub struct Coerced {
    pub series: Series,
    /// Non-null inputs that became null (timestamp parsing only)
    pub unparsed: usize,
}

impl From<Series> for Coerced {
    fn from(series: Series) -> Self {
        Self {
            series,
            unparsed: 0,
        }
    }
}

/// Converts one series; the error string explains why the column was skipped.
pub fn coerce_series(series: &Series, target: ColumnKind) -> std::result::Result<Coerced, String> {
    let source = ColumnKind::of(series.dtype());
    if source == target {
        return Ok(series.clone().into());
    }
    match target {
        ColumnKind::Integer => to_integer(series, source).map(Coerced::from),
        ColumnKind::Float => to_float(series, source).map(Coerced::from),
        ColumnKind::Text => series
            .cast(&DataType::String)
            .map(Coerced::from)
            .map_err(|e| e.to_string()),
        ColumnKind::Timestamp => to_timestamp(series, source),
        ColumnKind::Boolean => Err("boolean is not a supported target type".to_owned()),
    }
}

fn to_integer(series: &Series, source: ColumnKind) -> std::result::Result<Series, String> {
    let name = series.name().as_str();
    if series.null_count() > 0 {
        return Err(format!(
            "{} missing value(s) cannot be represented as integers",
            series.null_count()
        ));
    }
    match source {
        ColumnKind::Integer | ColumnKind::Boolean => {
            series.cast(&DataType::Int64).map_err(|e| e.to_string())
        }
        // Truncates toward zero; NaN, infinity and anything past the i64
        // range reject the column.
        ColumnKind::Float => series
            .strict_cast(&DataType::Int64)
            .map_err(|_| "some values are NaN, infinite or outside the integer range".to_owned()),
        ColumnKind::Text => {
            let values = text_values(series).map_err(|e| e.to_string())?;
            let mut out = Vec::with_capacity(values.len());
            for raw in values.into_iter().flatten() {
                let parsed = raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| format!("value '{raw}' is not an integer"))?;
                out.push(parsed);
            }
            Ok(Series::new(name.into(), out))
        }
        ColumnKind::Timestamp => Err("timestamps cannot be converted to integers".to_owned()),
    }
}

fn to_float(series: &Series, source: ColumnKind) -> std::result::Result<Series, String> {
    let name = series.name().as_str();
    match source {
        ColumnKind::Integer | ColumnKind::Float | ColumnKind::Boolean => {
            series.cast(&DataType::Float64).map_err(|e| e.to_string())
        }
        ColumnKind::Text => {
            let values = text_values(series).map_err(|e| e.to_string())?;
            let mut out = Vec::with_capacity(values.len());
            for raw in values {
                let parsed = match raw.as_deref().map(str::trim) {
                    None | Some("") => None,
                    Some(text) => Some(
                        text.parse::<f64>()
                            .map_err(|_| format!("value '{text}' is not a number"))?,
                    ),
                };
                out.push(parsed);
            }
            Ok(Series::new(name.into(), out))
        }
        ColumnKind::Timestamp => Err("timestamps cannot be converted to floats".to_owned()),
    }
}

fn to_timestamp(series: &Series, source: ColumnKind) -> std::result::Result<Coerced, String> {
    let name = series.name().as_str();
    let (millis, unparsed): (Vec<Option<i64>>, usize) = match source {
        ColumnKind::Text => {
            let values = text_values(series).map_err(|e| e.to_string())?;
            let mut unparsed = 0;
            let millis = values
                .iter()
                .map(|raw| {
                    let raw = raw.as_deref()?;
                    let parsed = parse_timestamp(raw).map(|dt| dt.and_utc().timestamp_millis());
                    if parsed.is_none() && !raw.trim().is_empty() {
                        unparsed += 1;
                    }
                    parsed
                })
                .collect();
            (millis, unparsed)
        }
        // Numbers are read as Unix seconds
        ColumnKind::Integer | ColumnKind::Float => {
            let secs = float_chunked(series).map_err(|e| e.to_string())?;
            let millis = (&secs * 1000.0)
                .apply_values(f64::round)
                .into_series()
                .strict_cast(&DataType::Int64)
                .map_err(|_| "some values are outside the timestamp range".to_owned())?;
            let series = millis
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
                .map_err(|e| e.to_string())?
                .with_name(name.into());
            return Ok(series.into());
        }
        ColumnKind::Timestamp => {
            let cast = series
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
                .map_err(|e| e.to_string())?;
            return Ok(cast.into());
        }
        ColumnKind::Boolean => return Err("booleans cannot be converted to timestamps".to_owned()),
    };
    let series = timestamp_series(name, millis).map_err(|e| e.to_string())?;
    Ok(Coerced { series, unparsed })
}

/// Parses a timestamp in any of the commonly seen layouts; dates become
/// midnight. Offsets are normalised to UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt);
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{kind_of, timestamp_millis};

    fn targets(pairs: &[(&str, ColumnKind)]) -> BTreeMap<String, ColumnKind> {
        pairs
            .iter()
            .map(|(name, kind)| ((*name).to_owned(), *kind))
            .collect()
    }

    #[test]
    fn test_failed_column_is_skipped_and_others_convert() -> anyhow::Result<()> {
        let df = df!(
            "code" => &["1", "2", "x"],
            "amount" => &["1.5", "2", "3.25"],
            "n" => &[1i64, 2, 3]
        )?;

        let (out, report) = coerce_types(
            &df,
            &targets(&[
                ("code", ColumnKind::Integer),
                ("amount", ColumnKind::Float),
                ("n", ColumnKind::Text),
            ]),
        )?;

        assert_eq!(kind_of(&out, "code")?, ColumnKind::Text);
        assert_eq!(kind_of(&out, "amount")?, ColumnKind::Float);
        assert_eq!(kind_of(&out, "n")?, ColumnKind::Text);
        assert_eq!(report.converted, vec!["amount", "n"]);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].column, "code");
        assert!(report.warnings[0].message.contains("'x'"));
        Ok(())
    }

    #[test]
    fn test_integer_rejects_missing_values() -> anyhow::Result<()> {
        let df = df!("age" => &[Some(25.0), None, Some(30.0)])?;
        let (out, report) = coerce_types(&df, &targets(&[("age", ColumnKind::Integer)]))?;
        assert_eq!(kind_of(&out, "age")?, ColumnKind::Float);
        assert_eq!(report.warnings.len(), 1);
        Ok(())
    }

    #[test]
    fn test_float_to_integer_truncates() -> anyhow::Result<()> {
        let df = df!("v" => &[1.9, -2.7, 3.0])?;
        let (out, report) = coerce_types(&df, &targets(&[("v", ColumnKind::Integer)]))?;
        assert!(report.warnings.is_empty());
        let values: Vec<Option<i64>> = out.column("v")?.as_materialized_series().i64()?.into_iter().collect();
        assert_eq!(values, vec![Some(1), Some(-2), Some(3)]);
        Ok(())
    }

    #[test]
    fn test_float_outside_integer_range_keeps_column() -> anyhow::Result<()> {
        let df = df!("big" => &[1.0, 1e30], "nan" => &[f64::NAN, 2.0])?;
        let (out, report) = coerce_types(
            &df,
            &targets(&[("big", ColumnKind::Integer), ("nan", ColumnKind::Integer)]),
        )?;
        assert_eq!(kind_of(&out, "big")?, ColumnKind::Float);
        assert_eq!(kind_of(&out, "nan")?, ColumnKind::Float);
        assert!(report.converted.is_empty());
        assert_eq!(report.warnings.len(), 2);
        Ok(())
    }

    #[test]
    fn test_numbers_become_timestamps_as_unix_seconds() -> anyhow::Result<()> {
        let df = df!("secs" => &[Some(0.0), Some(1.5), None], "huge" => &[1e300, 0.0, 1.0])?;
        let (out, report) = coerce_types(
            &df,
            &targets(&[("secs", ColumnKind::Timestamp), ("huge", ColumnKind::Timestamp)]),
        )?;
        assert_eq!(report.converted, vec!["secs"]);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].column, "huge");
        assert_eq!(kind_of(&out, "huge")?, ColumnKind::Float);

        let millis = timestamp_millis(out.column("secs")?.as_materialized_series())?;
        assert_eq!(millis, vec![Some(0), Some(1500), None]);
        Ok(())
    }

    #[test]
    fn test_timestamp_parsing_is_permissive() -> anyhow::Result<()> {
        let df = df!("when" => &[Some("2024-03-01"), Some("not a date"), None, Some("2024-03-01T12:30:00Z")])?;
        let (out, report) = coerce_types(&df, &targets(&[("when", ColumnKind::Timestamp)]))?;

        assert_eq!(kind_of(&out, "when")?, ColumnKind::Timestamp);
        assert_eq!(report.converted, vec!["when"]);
        assert_eq!(report.warnings.len(), 1, "one unparsed value is reported");

        let millis = timestamp_millis(out.column("when")?.as_materialized_series())?;
        assert_eq!(millis[0], Some(1_709_251_200_000));
        assert_eq!(millis[1], None);
        assert_eq!(millis[2], None);
        assert_eq!(millis[3], Some(1_709_296_200_000));
        Ok(())
    }

    #[test]
    fn test_unknown_column_is_a_warning() -> anyhow::Result<()> {
        let df = df!("a" => &[1i64])?;
        let (out, report) = coerce_types(&df, &targets(&[("b", ColumnKind::Float)]))?;
        assert!(out.equals(&df));
        assert_eq!(report.warnings[0].message, "column not found");
        Ok(())
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-01-02 03:04:05").is_some());
        assert!(parse_timestamp("2024-01-02 03:04:05.123").is_some());
        assert!(parse_timestamp("02/01/2024").is_some());
        assert!(parse_timestamp("2024-01-02T03:04:05+02:00").is_some());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
