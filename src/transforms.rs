//! The fixed menu of cleaning and transformation operations.
//!
//! A [`TransformRequest`] is the serializable description of one user action:
//! which operation, which columns, which method. Applying it instantiates a
//! concrete [`Transform`] and runs it against a borrowed frame, producing a new
//! frame. The input is never modified, so a failed request leaves the caller's
//! working dataset exactly as it was.

pub mod encoding;
pub mod missing;
pub mod outliers;
pub mod pipeline;
pub mod scaling;

pub use encoding::{CategoricalEncoding, EncodingMethod};
pub use missing::{MissingPolicy, MissingValues};
pub use outliers::{OutlierFilter, OutlierMethod};
pub use pipeline::{PipelineStep, TransformPipeline};
pub use scaling::{LogTransform, Normalize, Standardize};

use crate::dataset::ensure_columns;
use crate::error::{QuickEdaError, Result};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// Result of a successful transformation.
#[derive(Clone, Debug)]
pub struct Transformed {
    pub df: DataFrame,
    /// Non-fatal notes, e.g. columns skipped because they are not numeric
    pub warnings: Vec<String>,
}

impl Transformed {
    pub fn new(df: DataFrame) -> Self {
        Self {
            df,
            warnings: Vec::new(),
        }
    }
}

/// Tunables shared by the operations that need them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformOptions {
    pub z_threshold: f64,
    pub iqr_factor: f64,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            z_threshold: 3.0,
            iqr_factor: 1.5,
        }
    }
}

/// A single operation bound to its columns and parameters.
///
/// Implementations must be deterministic and must not mutate their input.
pub trait Transform {
    fn apply(&self, df: &DataFrame) -> Result<Transformed>;

    fn name(&self) -> &'static str;

    fn description(&self) -> String;
}

/// One user action against the working dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransformRequest {
    Log {
        columns: Vec<String>,
    },
    Standardize {
        columns: Vec<String>,
    },
    Normalize {
        columns: Vec<String>,
    },
    Missing {
        columns: Vec<String>,
        policy: MissingPolicy,
    },
    Outliers {
        columns: Vec<String>,
        method: OutlierMethod,
    },
    Encode {
        columns: Vec<String>,
        method: EncodingMethod,
    },
}

impl TransformRequest {
    pub fn columns(&self) -> &[String] {
        match self {
            Self::Log { columns }
            | Self::Standardize { columns }
            | Self::Normalize { columns }
            | Self::Missing { columns, .. }
            | Self::Outliers { columns, .. }
            | Self::Encode { columns, .. } => columns,
        }
    }

    /// Checks the request against `df` without running it.
    pub fn validate(&self, df: &DataFrame) -> Result<()> {
        if self.columns().is_empty() {
            return Err(QuickEdaError::Precondition("no columns selected".to_owned()));
        }
        ensure_columns(df, self.columns())
    }

    pub fn instantiate(&self, options: &TransformOptions) -> Box<dyn Transform> {
        match self {
            Self::Log { columns } => Box::new(LogTransform::new(columns.clone())),
            Self::Standardize { columns } => Box::new(Standardize::new(columns.clone())),
            Self::Normalize { columns } => Box::new(Normalize::new(columns.clone())),
            Self::Missing { columns, policy } => {
                Box::new(MissingValues::new(columns.clone(), *policy))
            }
            Self::Outliers { columns, method } => Box::new(OutlierFilter::new(
                columns.clone(),
                *method,
                options.z_threshold,
                options.iqr_factor,
            )),
            Self::Encode { columns, method } => {
                Box::new(CategoricalEncoding::new(columns.clone(), *method))
            }
        }
    }

    /// Validates, then runs the operation against `df`.
    pub fn apply(&self, df: &DataFrame, options: &TransformOptions) -> Result<Transformed> {
        self.validate(df)?;
        let transform = self.instantiate(options);
        tracing::debug!("Applying {}", transform.description());
        transform.apply(df)
    }

    pub fn description(&self) -> String {
        self.instantiate(&TransformOptions::default()).description()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_request_json_shape() -> anyhow::Result<()> {
        let request = TransformRequest::Outliers {
            columns: vec!["price".to_owned()],
            method: OutlierMethod::Iqr,
        };
        let json = serde_json::to_value(&request)?;
        assert_eq!(
            json,
            serde_json::json!({"op": "outliers", "columns": ["price"], "method": "iqr"})
        );
        let back: TransformRequest = serde_json::from_value(json)?;
        assert_eq!(back, request);
        Ok(())
    }

    #[test]
    fn test_empty_selection_is_rejected() -> anyhow::Result<()> {
        let df = df!("a" => &[1.0, 2.0])?;
        let request = TransformRequest::Standardize { columns: vec![] };
        assert!(matches!(
            request.apply(&df, &TransformOptions::default()),
            Err(QuickEdaError::Precondition(_))
        ));
        Ok(())
    }

    #[test]
    fn test_unknown_columns_are_rejected_before_running() -> anyhow::Result<()> {
        let df = df!("a" => &[1.0, 2.0])?;
        let request = TransformRequest::Log {
            columns: vec!["a".to_owned(), "zzz".to_owned()],
        };
        match request.apply(&df, &TransformOptions::default()) {
            Err(QuickEdaError::UnknownColumns(names)) => assert_eq!(names, vec!["zzz"]),
            other => panic!("expected UnknownColumns, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_description_names_operation() {
        let request = TransformRequest::Encode {
            columns: vec!["city".to_owned()],
            method: EncodingMethod::OneHot,
        };
        assert!(request.description().contains("city"));
    }
}
