//! Per-column numeric rescaling: `ln(1 + v)`, z-standardization and min-max
//! normalization. Each is fit on the column it rewrites, every invocation.
//! NaN cells count as missing and come out as nulls.

use super::{Transform, Transformed};
use crate::dataset::numeric_column;
use crate::error::{QuickEdaError, Result};
use polars::prelude::*;

fn rewrite_columns<F>(df: &DataFrame, columns: &[String], mut rewrite: F) -> Result<Transformed>
where
    F: FnMut(&str, Float64Chunked, &mut Vec<String>) -> Result<Float64Chunked>,
{
    let mut out = df.clone();
    let mut warnings = Vec::new();
    for name in columns {
        let ca = numeric_column(df, name)?;
        let rewritten = rewrite(name, ca, &mut warnings)?;
        out.with_column(rewritten.with_name(name.as_str().into()).into_series())?;
    }
    Ok(Transformed { df: out, warnings })
}

fn columns_label(columns: &[String]) -> String {
    columns.join(", ")
}

pub struct LogTransform {
    columns: Vec<String>,
}

impl LogTransform {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }
}

impl Transform for LogTransform {
    fn apply(&self, df: &DataFrame) -> Result<Transformed> {
        rewrite_columns(df, &self.columns, |name, ca, _| {
            if let Some(bad) = ca.min().filter(|min| *min <= -1.0) {
                return Err(QuickEdaError::Precondition(format!(
                    "log transform needs values greater than -1, column '{name}' contains {bad}"
                )));
            }
            Ok(ca.apply_values(f64::ln_1p))
        })
    }

    fn name(&self) -> &'static str {
        "log"
    }

    fn description(&self) -> String {
        format!("Log transform ln(1 + x) on {}", columns_label(&self.columns))
    }
}

pub struct Standardize {
    columns: Vec<String>,
}

impl Standardize {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }
}

impl Transform for Standardize {
    fn apply(&self, df: &DataFrame) -> Result<Transformed> {
        rewrite_columns(df, &self.columns, |name, ca, warnings| {
            let Some(mean) = ca.mean() else {
                warnings.push(format!("Column '{name}' has no values to standardize"));
                return Ok(ca);
            };
            let std = match ca.std(1) {
                Some(sd) if sd > 0.0 => sd,
                _ => {
                    warnings.push(format!(
                        "Column '{name}' is constant; standardized values are all 0"
                    ));
                    1.0
                }
            };
            Ok((&ca - mean) / std)
        })
    }

    fn name(&self) -> &'static str {
        "standardize"
    }

    fn description(&self) -> String {
        format!("Standardization (z-score) on {}", columns_label(&self.columns))
    }
}

pub struct Normalize {
    columns: Vec<String>,
}

impl Normalize {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }
}

impl Transform for Normalize {
    fn apply(&self, df: &DataFrame) -> Result<Transformed> {
        rewrite_columns(df, &self.columns, |name, ca, warnings| {
            let (Some(min), Some(max)) = (ca.min(), ca.max()) else {
                warnings.push(format!("Column '{name}' has no values to normalize"));
                return Ok(ca);
            };
            let range = max - min;
            if range == 0.0 {
                warnings.push(format!(
                    "Column '{name}' is constant; normalized values are all 0"
                ));
                return Ok(ca.apply_values(|_| 0.0));
            }
            Ok((&ca - min) / range)
        })
    }

    fn name(&self) -> &'static str {
        "normalize"
    }

    fn description(&self) -> String {
        format!("Min-max normalization on {}", columns_label(&self.columns))
    }
}
