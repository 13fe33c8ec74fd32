//! Label and one-hot encoding of categorical columns.

use super::{Transform, Transformed};
use crate::dataset::float_chunked;
use crate::error::{QuickEdaError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingMethod {
    /// Sorted distinct values become `0..k` in place
    Label,
    /// One boolean indicator column per distinct value
    OneHot,
}

impl EncodingMethod {
    pub const ALL: [Self; 2] = [Self::Label, Self::OneHot];

    pub fn label(self) -> &'static str {
        match self {
            Self::Label => "Label encoding",
            Self::OneHot => "One-hot encoding",
        }
    }
}

impl fmt::Display for EncodingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sorted distinct values of a column, nulls and NaN left out. Numbers sort
/// numerically, text lexicographically, timestamps chronologically.
struct Categories {
    values: Series,
    labels: Vec<String>,
}

impl Categories {
    fn of(series: &Series) -> Result<(Series, Self)> {
        let series = if series.dtype().is_float() {
            float_chunked(series)?.into_series()
        } else {
            series.clone()
        };
        let values = series
            .unique()?
            .drop_nulls()
            .sort(SortOptions::default())?;
        let labels = values
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_owned())
            .collect();
        Ok((series, Self { values, labels }))
    }

    fn len(&self) -> usize {
        self.labels.len()
    }

    /// `true` where `series` holds the `i`-th category; missing cells are `false`.
    fn matches(&self, series: &Series, i: usize) -> Result<BooleanChunked> {
        let value = self.values.slice(i as i64, 1);
        Ok(series.equal(&value)?.fill_null_with_values(false)?)
    }
}

pub struct CategoricalEncoding {
    columns: Vec<String>,
    method: EncodingMethod,
}

impl CategoricalEncoding {
    pub fn new(columns: Vec<String>, method: EncodingMethod) -> Self {
        Self { columns, method }
    }

    fn label_encode(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut out = df.clone();
        for name in &self.columns {
            let (series, categories) = Categories::of(df.column(name)?.as_materialized_series())?;
            let mut codes = Int64Chunked::full_null(name.as_str().into(), series.len());
            for (i, code) in (0..categories.len()).zip(0_i64..) {
                codes = codes.set(&categories.matches(&series, i)?, Some(code))?;
            }
            out.with_column(codes.into_series())?;
        }
        Ok(out)
    }

    fn one_hot(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut out = df.clone();
        for name in &self.columns {
            let (series, categories) = Categories::of(df.column(name)?.as_materialized_series())?;
            out = out.drop(name)?;

            let mut taken: HashSet<String> = out
                .get_column_names()
                .iter()
                .map(|n| n.to_string())
                .collect();
            let mut indicators = Vec::with_capacity(categories.len());
            for (i, label) in categories.labels.iter().enumerate() {
                let indicator = format!("{name}_{label}");
                if !taken.insert(indicator.clone()) {
                    return Err(QuickEdaError::Precondition(format!(
                        "one-hot column '{indicator}' would collide with an existing column"
                    )));
                }
                let flags = categories.matches(&series, i)?;
                indicators.push(flags.with_name(indicator.into()).into_series());
            }
            for indicator in indicators {
                out.with_column(indicator)?;
            }
        }
        Ok(out)
    }
}

impl Transform for CategoricalEncoding {
    fn apply(&self, df: &DataFrame) -> Result<Transformed> {
        let out = match self.method {
            EncodingMethod::Label => self.label_encode(df)?,
            EncodingMethod::OneHot => self.one_hot(df)?,
        };
        Ok(Transformed::new(out))
    }

    fn name(&self) -> &'static str {
        "encode"
    }

    fn description(&self) -> String {
        format!("{} on {}", self.method, self.columns.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::column_names;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    fn flags(df: &DataFrame, name: &str) -> anyhow::Result<Vec<Option<bool>>> {
        Ok(df.column(name)?.bool()?.into_iter().collect())
    }

    #[test]
    fn test_one_hot_city() -> anyhow::Result<()> {
        let df = df!(
            "age" => &[Some(25i64), None, Some(30)],
            "city" => &["NY", "LA", "NY"]
        )?;
        let out = CategoricalEncoding::new(cols(&["city"]), EncodingMethod::OneHot).apply(&df)?;

        assert_eq!(column_names(&out.df), vec!["age", "city_LA", "city_NY"]);
        assert_eq!(flags(&out.df, "city_NY")?, vec![Some(true), Some(false), Some(true)]);
        assert_eq!(flags(&out.df, "city_LA")?, vec![Some(false), Some(true), Some(false)]);
        Ok(())
    }

    #[test]
    fn test_one_hot_exactly_one_true_per_row() -> anyhow::Result<()> {
        let colors = ["red", "green", "blue", "green", "red", "red", "blue"];
        let df = df!("color" => &colors)?;
        let out = CategoricalEncoding::new(cols(&["color"]), EncodingMethod::OneHot).apply(&df)?;
        assert_eq!(out.df.width(), 3);

        for row in 0..colors.len() {
            let mut hot = 0;
            for column in out.df.get_columns() {
                if column.bool()?.get(row) == Some(true) {
                    hot += 1;
                }
            }
            assert_eq!(hot, 1, "row {row}");
        }
        Ok(())
    }

    #[test]
    fn test_one_hot_null_row_is_all_false() -> anyhow::Result<()> {
        let df = df!("c" => &[Some("a"), None, Some("b")])?;
        let out = CategoricalEncoding::new(cols(&["c"]), EncodingMethod::OneHot).apply(&df)?;
        assert_eq!(flags(&out.df, "c_a")?[1], Some(false));
        assert_eq!(flags(&out.df, "c_b")?[1], Some(false));
        Ok(())
    }

    #[test]
    fn test_one_hot_name_collision_is_rejected() -> anyhow::Result<()> {
        let df = df!("c" => &["a", "b"], "c_a" => &[1, 2])?;
        let result = CategoricalEncoding::new(cols(&["c"]), EncodingMethod::OneHot).apply(&df);
        assert!(matches!(result, Err(QuickEdaError::Precondition(_))));
        Ok(())
    }

    #[test]
    fn test_label_encoding_sorts_values() -> anyhow::Result<()> {
        let df = df!(
            "city" => &[Some("NY"), Some("LA"), None, Some("SF"), Some("LA")],
            "size" => &[Some(10i64), Some(2), Some(10), None, Some(33)]
        )?;
        let out = CategoricalEncoding::new(cols(&["city", "size"]), EncodingMethod::Label).apply(&df)?;

        let city: Vec<Option<i64>> = out.df.column("city")?.i64()?.into_iter().collect();
        assert_eq!(city, vec![Some(1), Some(0), None, Some(2), Some(0)]);
        // Numeric order, not lexicographic ("10" < "2").
        let size: Vec<Option<i64>> = out.df.column("size")?.i64()?.into_iter().collect();
        assert_eq!(size, vec![Some(1), Some(0), Some(1), None, Some(2)]);
        assert_eq!(column_names(&out.df), vec!["city", "size"]);
        Ok(())
    }

    #[test]
    fn test_nan_is_not_a_category() -> anyhow::Result<()> {
        let df = df!("v" => &[Some(2.5), Some(f64::NAN), None, Some(-1.0)])?;
        let out = CategoricalEncoding::new(cols(&["v"]), EncodingMethod::Label).apply(&df)?;
        let v: Vec<Option<i64>> = out.df.column("v")?.i64()?.into_iter().collect();
        assert_eq!(v, vec![Some(1), None, None, Some(0)]);

        let out = CategoricalEncoding::new(cols(&["v"]), EncodingMethod::OneHot).apply(&df)?;
        assert_eq!(out.df.width(), 2);
        Ok(())
    }
}
