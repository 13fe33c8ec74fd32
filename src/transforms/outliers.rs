use super::{Transform, Transformed};
use crate::dataset::numeric_column;
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    ZScore,
    Iqr,
}

impl OutlierMethod {
    pub const ALL: [Self; 2] = [Self::ZScore, Self::Iqr];

    pub fn label(self) -> &'static str {
        match self {
            Self::ZScore => "Z-score",
            Self::Iqr => "IQR",
        }
    }
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inclusive range of values considered inliers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    /// `mean ± threshold · σ` with the population standard deviation.
    pub fn z_score(ca: &Float64Chunked, threshold: f64) -> Option<Self> {
        let m = ca.mean()?;
        let sd = ca.std(0)?;
        Some(Self {
            lower: m - threshold * sd,
            upper: m + threshold * sd,
        })
    }

    /// `[Q1 - factor · IQR, Q3 + factor · IQR]` with linearly interpolated quartiles.
    pub fn iqr(ca: &Float64Chunked, factor: f64) -> Result<Option<Self>> {
        let q1 = ca.quantile(0.25, QuantileMethod::Linear)?;
        let q3 = ca.quantile(0.75, QuantileMethod::Linear)?;
        let (Some(q1), Some(q3)) = (q1, q3) else {
            return Ok(None);
        };
        let iqr = q3 - q1;
        Ok(Some(Self {
            lower: q1 - factor * iqr,
            upper: q3 + factor * iqr,
        }))
    }

    /// Row mask that is `true` inside the bounds and for missing cells.
    pub fn inliers(&self, ca: &Float64Chunked) -> Result<BooleanChunked> {
        let inside = &ca.gt_eq(self.lower) & &ca.lt_eq(self.upper);
        Ok(inside.fill_null_with_values(true)?)
    }
}

/// Drops rows that are outliers on any selected column.
pub struct OutlierFilter {
    columns: Vec<String>,
    method: OutlierMethod,
    z_threshold: f64,
    iqr_factor: f64,
}

impl OutlierFilter {
    pub fn new(columns: Vec<String>, method: OutlierMethod, z_threshold: f64, iqr_factor: f64) -> Self {
        Self {
            columns,
            method,
            z_threshold,
            iqr_factor,
        }
    }

    fn bounds(&self, ca: &Float64Chunked) -> Result<Option<Bounds>> {
        match self.method {
            OutlierMethod::ZScore => Ok(Bounds::z_score(ca, self.z_threshold)),
            OutlierMethod::Iqr => Bounds::iqr(ca, self.iqr_factor),
        }
    }
}

impl Transform for OutlierFilter {
    fn apply(&self, df: &DataFrame) -> Result<Transformed> {
        let mut keep = BooleanChunked::full("keep".into(), true, df.height());
        let mut warnings = Vec::new();

        for name in &self.columns {
            let ca = numeric_column(df, name)?;
            let Some(bounds) = self.bounds(&ca)? else {
                warnings.push(format!("Column '{name}' has no values; nothing removed"));
                continue;
            };
            keep = &keep & &bounds.inliers(&ca)?;
        }

        let out = df.filter(&keep)?;
        tracing::debug!(
            "{} outlier filter removes {} rows",
            self.method,
            df.height() - out.height()
        );
        Ok(Transformed { df: out, warnings })
    }

    fn name(&self) -> &'static str {
        "outliers"
    }

    fn description(&self) -> String {
        format!(
            "Outlier removal ({}) on {}",
            self.method,
            self.columns.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl Bounds {
        fn contains(&self, v: f64) -> bool {
            v >= self.lower && v <= self.upper
        }
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    fn floats(df: &DataFrame, name: &str) -> anyhow::Result<Vec<Option<f64>>> {
        Ok(df.column(name)?.f64()?.into_iter().collect())
    }

    #[test]
    fn test_iqr_keeps_exactly_the_rows_within_bounds() -> anyhow::Result<()> {
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 100.0, -50.0, 4.5];
        let b = vec![10.0, 11.0, 12.0, 13.0, 500.0, 12.5, 11.5, 12.0, 11.0, 10.5];
        let df = df!("a" => &a, "b" => &b, "label" => (0..10).collect::<Vec<i32>>())?;

        let out = OutlierFilter::new(cols(&["a", "b"]), OutlierMethod::Iqr, 3.0, 1.5).apply(&df)?;

        let ba = Bounds::iqr(&Float64Chunked::from_slice("a".into(), &a), 1.5)?
            .ok_or_else(|| anyhow::anyhow!("no bounds for a"))?;
        let bb = Bounds::iqr(&Float64Chunked::from_slice("b".into(), &b), 1.5)?
            .ok_or_else(|| anyhow::anyhow!("no bounds for b"))?;
        let expected = a
            .iter()
            .zip(&b)
            .filter(|(x, y)| ba.contains(**x) && bb.contains(**y))
            .count();
        assert_eq!(out.df.height(), expected);

        for v in floats(&out.df, "a")?.into_iter().flatten() {
            assert!(ba.contains(v), "{v} outside {ba:?}");
        }
        for v in floats(&out.df, "b")?.into_iter().flatten() {
            assert!(bb.contains(v), "{v} outside {bb:?}");
        }
        // 100 and -50 in `a`, 500 in `b`
        assert_eq!(out.df.height(), 7);
        Ok(())
    }

    #[test]
    fn test_z_score_drops_far_values_and_keeps_nulls() -> anyhow::Result<()> {
        let mut values: Vec<Option<f64>> = (0..20).map(|i| Some(f64::from(i % 3))).collect();
        values.push(Some(1000.0));
        values.push(None);
        let df = df!("v" => &values)?;

        let out = OutlierFilter::new(cols(&["v"]), OutlierMethod::ZScore, 3.0, 1.5).apply(&df)?;
        assert_eq!(out.df.height(), 21);
        assert_eq!(out.df.column("v")?.null_count(), 1);
        Ok(())
    }

    #[test]
    fn test_z_score_drops_a_row_flagged_by_any_column() -> anyhow::Result<()> {
        let mut a: Vec<f64> = (0..20).map(|i| f64::from(i % 4)).collect();
        let mut b: Vec<f64> = (0..20).map(|i| f64::from(i % 5)).collect();
        a.extend([500.0, 1.0]);
        b.extend([2.0, -800.0]);
        let id: Vec<i32> = (0..22).collect();
        let df = df!("a" => &a, "b" => &b, "id" => &id)?;

        let only_a = OutlierFilter::new(cols(&["a"]), OutlierMethod::ZScore, 3.0, 1.5).apply(&df)?;
        assert_eq!(only_a.df.height(), 21);

        let both = OutlierFilter::new(cols(&["a", "b"]), OutlierMethod::ZScore, 3.0, 1.5).apply(&df)?;
        let kept: Vec<Option<i32>> = both.df.column("id")?.i32()?.into_iter().collect();
        assert_eq!(kept.len(), 20);
        assert!(!kept.contains(&Some(20)), "row with a = 500 is gone");
        assert!(!kept.contains(&Some(21)), "row with b = -800 is gone");
        Ok(())
    }

    #[test]
    fn test_nan_cells_are_kept_and_ignored_when_fitting() -> anyhow::Result<()> {
        let df = df!("v" => &[1.0, 2.0, 3.0, f64::NAN])?;
        let out = OutlierFilter::new(cols(&["v"]), OutlierMethod::Iqr, 3.0, 1.5).apply(&df)?;
        assert_eq!(out.df.height(), 4);

        let mut values: Vec<f64> = (0..20).map(|i| f64::from(i % 3)).collect();
        values.extend([f64::NAN, 1000.0]);
        let df = df!("v" => &values)?;
        let out = OutlierFilter::new(cols(&["v"]), OutlierMethod::ZScore, 3.0, 1.5).apply(&df)?;
        assert_eq!(out.df.height(), 21, "only the 1000 row goes");
        Ok(())
    }

    #[test]
    fn test_all_missing_column_warns_and_keeps_rows() -> anyhow::Result<()> {
        let df = df!("v" => &[None::<f64>, None], "w" => &[1.0, 2.0])?;
        let out = OutlierFilter::new(cols(&["v"]), OutlierMethod::Iqr, 3.0, 1.5).apply(&df)?;
        assert_eq!(out.df.height(), 2);
        assert_eq!(out.warnings.len(), 1);
        Ok(())
    }

    #[test]
    fn test_bounds_are_inclusive() -> anyhow::Result<()> {
        let b = Bounds { lower: 1.0, upper: 2.0 };
        let ca = Float64Chunked::new("v".into(), &[Some(1.0), Some(2.0), Some(2.000_001), None]);
        let mask: Vec<Option<bool>> = b.inliers(&ca)?.into_iter().collect();
        assert_eq!(mask, vec![Some(true), Some(true), Some(false), Some(true)]);
        Ok(())
    }

    #[test]
    fn test_method_json_names() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&OutlierMethod::ZScore)?, "\"z_score\"");
        assert_eq!(serde_json::to_string(&OutlierMethod::Iqr)?, "\"iqr\"");
        Ok(())
    }
}
