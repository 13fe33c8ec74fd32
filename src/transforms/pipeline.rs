use super::{TransformOptions, TransformRequest, Transformed};
use crate::coercion::coerce_types;
use crate::dataset::ColumnKind;
use crate::error::{Result, ResultExt as _};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One recorded action that changed the working dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PipelineStep {
    CoerceTypes { types: BTreeMap<String, ColumnKind> },
    Transform { request: TransformRequest },
}

impl PipelineStep {
    pub fn describe(&self) -> String {
        match self {
            Self::CoerceTypes { types } => {
                let pairs: Vec<String> = types.iter().map(|(c, k)| format!("{c} -> {k}")).collect();
                format!("Type coercion: {}", pairs.join(", "))
            }
            Self::Transform { request } => request.description(),
        }
    }
}

/// Accepted steps in the order they ran, replayable on another dataset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformPipeline {
    steps: Vec<PipelineStep>,
}

impl TransformPipeline {
    pub fn push(&mut self, step: PipelineStep) {
        self.steps.push(step);
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// Runs every step in sequence. Coercion warnings and transform warnings
    /// are collected; the first failing step aborts the run.
    pub fn apply(&self, df: &DataFrame, options: &TransformOptions) -> Result<Transformed> {
        let mut current = df.clone();
        let mut warnings = Vec::new();

        for (idx, step) in self.steps.iter().enumerate() {
            match step {
                PipelineStep::CoerceTypes { types } => {
                    let (next, report) = coerce_types(&current, types)
                        .with_context(|| format!("Step {}: type coercion failed", idx + 1))?;
                    warnings.extend(report.warnings.iter().map(ToString::to_string));
                    current = next;
                }
                PipelineStep::Transform { request } => {
                    // Keep the typed error (Precondition, UnknownColumns) intact.
                    let step_result = request.apply(&current, options).inspect_err(|e| {
                        tracing::warn!("Pipeline step {} failed: {e}", idx + 1);
                    })?;
                    warnings.extend(step_result.warnings);
                    current = step_result.df;
                }
            }
        }

        Ok(Transformed {
            df: current,
            warnings,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize pipeline")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse pipeline")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write pipeline {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PipelineStep> {
        self.steps.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::{EncodingMethod, MissingPolicy};
    use polars::prelude::*;

    fn sample_pipeline() -> TransformPipeline {
        let mut pipeline = TransformPipeline::default();
        pipeline.push(PipelineStep::CoerceTypes {
            types: BTreeMap::from([("age".to_owned(), ColumnKind::Float)]),
        });
        pipeline.push(PipelineStep::Transform {
            request: TransformRequest::Missing {
                columns: vec!["age".to_owned()],
                policy: MissingPolicy::FillMean,
            },
        });
        pipeline.push(PipelineStep::Transform {
            request: TransformRequest::Encode {
                columns: vec!["city".to_owned()],
                method: EncodingMethod::OneHot,
            },
        });
        pipeline
    }

    #[test]
    fn test_pipeline_json_round_trip() -> anyhow::Result<()> {
        let pipeline = sample_pipeline();
        let json = pipeline.to_json()?;
        assert!(json.contains("\"step\": \"coerce_types\""));
        assert!(json.contains("\"op\": \"missing\""));
        assert_eq!(TransformPipeline::from_json(&json)?, pipeline);
        Ok(())
    }

    #[test]
    fn test_pipeline_replays_steps_in_order() -> anyhow::Result<()> {
        let df = df!(
            "age" => &[Some(25i64), None, Some(30)],
            "city" => &["NY", "LA", "NY"]
        )?;
        let out = sample_pipeline().apply(&df, &TransformOptions::default())?;
        assert_eq!(out.df.shape(), (3, 3));
        assert_eq!(out.df.column("age")?.null_count(), 0);
        assert!(out.df.column("city_NY").is_ok());
        Ok(())
    }

    #[test]
    fn test_pipeline_stops_at_failing_step() -> anyhow::Result<()> {
        let df = df!("age" => &[1.0, 2.0])?;
        let result = sample_pipeline().apply(&df, &TransformOptions::default());
        assert!(matches!(
            result,
            Err(crate::error::QuickEdaError::UnknownColumns(_))
        ));
        Ok(())
    }

    #[test]
    fn test_pipeline_file_round_trip() -> anyhow::Result<()> {
        let path = std::env::temp_dir().join(format!("quickeda_pipeline_{}.json", std::process::id()));
        sample_pipeline().save(&path)?;
        let loaded = TransformPipeline::load(&path)?;
        std::fs::remove_file(&path)?;
        assert_eq!(loaded.len(), 3);
        Ok(())
    }
}
