use super::{Transform, Transformed};
use crate::dataset::{ColumnKind, float_chunked};
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How to treat nulls in the selected columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Drop every row with a null in any selected column
    Drop,
    FillMean,
    FillMedian,
    /// Most frequent value per column; works for text too
    FillMode,
}

impl MissingPolicy {
    pub const ALL: [Self; 4] = [Self::Drop, Self::FillMean, Self::FillMedian, Self::FillMode];

    pub fn label(self) -> &'static str {
        match self {
            Self::Drop => "Drop rows",
            Self::FillMean => "Fill with mean",
            Self::FillMedian => "Fill with median",
            Self::FillMode => "Fill with mode",
        }
    }
}

impl fmt::Display for MissingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub struct MissingValues {
    columns: Vec<String>,
    policy: MissingPolicy,
}

impl MissingValues {
    pub fn new(columns: Vec<String>, policy: MissingPolicy) -> Self {
        Self { columns, policy }
    }

    fn drop_rows(&self, df: &DataFrame) -> Result<Transformed> {
        let mut keep = BooleanChunked::full("keep".into(), true, df.height());
        for name in &self.columns {
            keep = &keep & &present(df.column(name)?.as_materialized_series())?;
        }
        let out = df.filter(&keep)?;
        tracing::debug!("Dropping {} rows with missing values", df.height() - out.height());
        Ok(Transformed::new(out))
    }

    fn fill_statistic<F>(&self, df: &DataFrame, what: &str, stat: F) -> Result<Transformed>
    where
        F: Fn(&Float64Chunked) -> Option<f64>,
    {
        let mut out = df.clone();
        let mut warnings = Vec::new();
        for name in &self.columns {
            let series = df.column(name)?.as_materialized_series();
            let kind = ColumnKind::of(series.dtype());
            if !kind.is_numeric() {
                warnings.push(format!(
                    "Skipped '{name}': cannot fill a {kind} column with the {what}"
                ));
                continue;
            }
            let ca = float_chunked(series)?;
            let Some(fill) = stat(&ca) else {
                warnings.push(format!("Skipped '{name}': column has no values"));
                continue;
            };
            out.with_column(ca.fill_null_with_values(fill)?.into_series())?;
        }
        Ok(Transformed { df: out, warnings })
    }

    fn fill_mode(&self, df: &DataFrame) -> Result<Transformed> {
        let mut out = df.clone();
        let mut warnings = Vec::new();
        for name in &self.columns {
            let series = df.column(name)?.as_materialized_series();
            match mode_filled(series)? {
                Some(filled) => {
                    out.with_column(filled)?;
                }
                None => warnings.push(format!("Skipped '{name}': column has no values")),
            }
        }
        Ok(Transformed { df: out, warnings })
    }
}

/// `true` where the cell holds a value. NaN counts as missing.
fn present(series: &Series) -> Result<BooleanChunked> {
    if series.dtype().is_float() {
        Ok(float_chunked(series)?.is_not_null())
    } else {
        Ok(series.is_not_null())
    }
}

/// Fills nulls with the column's mode, keeping the column's dtype. Ties go to
/// the smallest value. `None` when the column has no values at all.
fn mode_filled(series: &Series) -> Result<Option<Series>> {
    let dtype = series.dtype().clone();
    let values = if dtype.is_float() {
        float_chunked(series)?.into_series()
    } else {
        series.clone()
    };
    let modes = mode::mode(&values.drop_nulls())?.sort(SortOptions::default())?;
    if modes.is_empty() {
        return Ok(None);
    }
    let fill = modes.new_from_index(0, values.len());
    let filled = values.zip_with(&values.is_not_null(), &fill)?;
    Ok(Some(filled.cast(&dtype)?))
}

impl Transform for MissingValues {
    fn apply(&self, df: &DataFrame) -> Result<Transformed> {
        match self.policy {
            MissingPolicy::Drop => self.drop_rows(df),
            MissingPolicy::FillMean => self.fill_statistic(df, "mean", |ca| ca.mean()),
            MissingPolicy::FillMedian => self.fill_statistic(df, "median", |ca| ca.median()),
            MissingPolicy::FillMode => self.fill_mode(df),
        }
    }

    fn name(&self) -> &'static str {
        "missing"
    }

    fn description(&self) -> String {
        format!(
            "Missing values: {} in {}",
            self.policy.label().to_lowercase(),
            self.columns.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::timestamp_series;

    fn people() -> anyhow::Result<DataFrame> {
        Ok(df!(
            "age" => &[Some(25i64), None, Some(30)],
            "city" => &[Some("NY"), Some("LA"), Some("NY")]
        )?)
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_fill_mean_widens_to_float() -> anyhow::Result<()> {
        let df = people()?;
        let out = MissingValues::new(cols(&["age"]), MissingPolicy::FillMean).apply(&df)?;
        let age: Vec<Option<f64>> = out.df.column("age")?.f64()?.into_iter().collect();
        assert_eq!(age, vec![Some(25.0), Some(27.5), Some(30.0)]);
        assert!(
            out.df
                .column("city")?
                .as_materialized_series()
                .equals_missing(df.column("city")?.as_materialized_series())
        );
        Ok(())
    }

    #[test]
    fn test_fill_median_skips_text_with_warning() -> anyhow::Result<()> {
        let df = df!(
            "v" => &[Some(1.0), None, Some(3.0), Some(10.0)],
            "s" => &[Some("a"), None, Some("b"), Some("c")]
        )?;
        let out = MissingValues::new(cols(&["v", "s"]), MissingPolicy::FillMedian).apply(&df)?;
        let v: Vec<Option<f64>> = out.df.column("v")?.f64()?.into_iter().collect();
        assert_eq!(v[1], Some(3.0));
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("'s'"));
        assert_eq!(out.df.column("s")?.null_count(), 1);
        Ok(())
    }

    #[test]
    fn test_drop_removes_rows_with_any_null() -> anyhow::Result<()> {
        let df = df!(
            "a" => &[Some(1i64), None, Some(3), Some(4)],
            "b" => &[Some("x"), Some("y"), None, Some("z")],
            "c" => &[None, Some(1.0), Some(2.0), Some(3.0)]
        )?;
        let out = MissingValues::new(cols(&["a", "b"]), MissingPolicy::Drop).apply(&df)?;
        assert_eq!(out.df.height(), 2);
        // Nulls outside the selection survive.
        assert_eq!(out.df.column("c")?.null_count(), 1);
        Ok(())
    }

    #[test]
    fn test_fill_mode_per_column_keeps_dtype() -> anyhow::Result<()> {
        let df = df!(
            "n" => &[Some(2i64), Some(1), None, Some(2), Some(1)],
            "s" => &[Some("b"), None, Some("b"), Some("a"), Some("a")]
        )?;
        let out = MissingValues::new(cols(&["n", "s"]), MissingPolicy::FillMode).apply(&df)?;
        let n: Vec<Option<i64>> = out.df.column("n")?.i64()?.into_iter().collect();
        assert_eq!(n[2], Some(1));
        let s: Vec<Option<&str>> = out.df.column("s")?.str()?.into_iter().collect();
        assert_eq!(s[1], Some("a"));
        Ok(())
    }

    #[test]
    fn test_fill_mode_on_all_null_column_warns() -> anyhow::Result<()> {
        let df = df!("n" => &[None::<f64>, None])?;
        let out = MissingValues::new(cols(&["n"]), MissingPolicy::FillMode).apply(&df)?;
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.df.column("n")?.null_count(), 2);
        Ok(())
    }

    #[test]
    fn test_nan_cells_are_filled_like_nulls() -> anyhow::Result<()> {
        let df = df!("v" => &[Some(1.0), None, Some(3.0), Some(f64::NAN)])?;
        let out = MissingValues::new(cols(&["v"]), MissingPolicy::FillMean).apply(&df)?;
        let v: Vec<Option<f64>> = out.df.column("v")?.f64()?.into_iter().collect();
        assert_eq!(v, vec![Some(1.0), Some(2.0), Some(3.0), Some(2.0)]);

        let out = MissingValues::new(cols(&["v"]), MissingPolicy::FillMode).apply(&df)?;
        let v: Vec<Option<f64>> = out.df.column("v")?.f64()?.into_iter().collect();
        assert_eq!(v, vec![Some(1.0), Some(1.0), Some(3.0), Some(1.0)]);

        let out = MissingValues::new(cols(&["v"]), MissingPolicy::Drop).apply(&df)?;
        assert_eq!(out.df.height(), 2);
        Ok(())
    }

    #[test]
    fn test_fill_mode_on_timestamps() -> anyhow::Result<()> {
        let day = 86_400_000_i64;
        let t = timestamp_series("t", vec![Some(day), None, Some(2 * day), Some(day)])?;
        let df = DataFrame::new(vec![t.into_column()])?;
        let out = MissingValues::new(cols(&["t"]), MissingPolicy::FillMode).apply(&df)?;
        assert_eq!(out.df.column("t")?.dtype(), df.column("t")?.dtype());
        assert_eq!(out.df.column("t")?.null_count(), 0);
        Ok(())
    }
}
