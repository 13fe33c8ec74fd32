//! One user's working session.
//!
//! Every user action is a [`Command`]. [`Session::dispatch`] checks the
//! command's prerequisites, runs it against the owned dataset and returns an
//! [`Outcome`] with the diagnostics to show. A failed command never changes
//! the session: transformations run against a borrowed frame and the result is
//! swapped in only on success.

use crate::coercion::coerce_types;
use crate::config::AppSettings;
use crate::dataset::{ColumnKind, DatasetStore, load_bytes, preview_sample};
use crate::error::{QuickEdaError, Result};
use crate::export::{self, ExportFormat};
use crate::filter::ColumnFilter;
use crate::report::{self, ProfileProgress, Report, ReportCache, ReportMode, ReportTarget};
use crate::transforms::{PipelineStep, TransformOptions, TransformPipeline, TransformRequest};
use polars::prelude::DataFrame;
use std::collections::BTreeMap;

/// Seed for the upload preview sample, so the same file always previews the same rows.
pub const PREVIEW_SEED: u64 = 42;

#[derive(Clone, Debug)]
pub enum Command {
    /// Load a file, replacing any previous dataset
    Upload { file_name: String, bytes: Vec<u8> },
    CoerceTypes(BTreeMap<String, ColumnKind>),
    Transform(TransformRequest),
    /// Run a saved pipeline against the working dataset as a single step
    ReplayPipeline(TransformPipeline),
    /// Discard every coercion and transformation
    ResetWorking,
    SelectProfileColumns(Vec<String>),
    GenerateReport {
        target: ReportTarget,
        mode: ReportMode,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Upload { .. } => "upload",
            Self::CoerceTypes(_) => "coerce_types",
            Self::Transform(_) => "transform",
            Self::ReplayPipeline(_) => "replay_pipeline",
            Self::ResetWorking => "reset_working",
            Self::SelectProfileColumns(_) => "select_profile_columns",
            Self::GenerateReport { .. } => "generate_report",
        }
    }
}

/// What an accepted command did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub message: String,
    pub warnings: Vec<String>,
}

impl Outcome {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            warnings: Vec::new(),
        }
    }

    fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

#[derive(Debug)]
pub struct Session {
    store: DatasetStore,
    filter: ColumnFilter,
    reports: ReportCache,
    history: TransformPipeline,
    options: TransformOptions,
    infer_schema_length: usize,
    preview_rows: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&AppSettings::default())
    }
}

impl Session {
    pub fn new(settings: &AppSettings) -> Self {
        Self {
            options: TransformOptions {
                z_threshold: settings.z_threshold,
                iqr_factor: settings.iqr_factor,
            },
            infer_schema_length: settings.infer_schema_length,
            preview_rows: settings.preview_rows,
            store: DatasetStore::new(),
            filter: ColumnFilter::new(),
            reports: ReportCache::new(),
            history: TransformPipeline::default(),
        }
    }

    pub fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        self.dispatch_with_progress(command, |_| {})
    }

    /// Like [`Session::dispatch`], reporting per-column progress while a
    /// report is generated.
    pub fn dispatch_with_progress<F>(&mut self, command: Command, on_progress: F) -> Result<Outcome>
    where
        F: FnMut(ProfileProgress<'_>),
    {
        let name = command.name();
        let result = match command {
            Command::Upload { file_name, bytes } => self.upload(file_name, bytes),
            Command::CoerceTypes(types) => self.coerce(&types),
            Command::Transform(request) => self.transform(request),
            Command::ReplayPipeline(pipeline) => self.replay(pipeline),
            Command::ResetWorking => self.reset(),
            Command::SelectProfileColumns(columns) => self.select_columns(columns),
            Command::GenerateReport { target, mode } => {
                self.generate_report(target, mode, on_progress)
            }
        };

        match &result {
            Ok(outcome) => {
                tracing::info!("{name}: {}", outcome.message);
                for warning in &outcome.warnings {
                    tracing::warn!("{name}: {warning}");
                }
            }
            Err(err) => tracing::warn!("{name} rejected: {err}"),
        }
        result
    }

    fn upload(&mut self, file_name: String, bytes: Vec<u8>) -> Result<Outcome> {
        let df = load_bytes(&file_name, bytes, self.infer_schema_length)?;
        if df.width() == 0 {
            return Err(QuickEdaError::DataProcessing(format!(
                "'{file_name}' has no columns"
            )));
        }
        let (rows, cols) = df.shape();
        self.store.load(file_name.clone(), df);
        self.filter.reset();
        self.reports.clear();
        self.history.clear();
        Ok(Outcome::new(format!(
            "Loaded '{file_name}': {rows} rows x {cols} columns"
        )))
    }

    fn working_changed(&mut self, df: DataFrame) -> Result<()> {
        self.filter.sync(&df);
        self.store.replace_working(df)?;
        self.reports.invalidate(ReportTarget::Working);
        Ok(())
    }

    fn coerce(&mut self, types: &BTreeMap<String, ColumnKind>) -> Result<Outcome> {
        let working = self.store.working()?;
        if types.is_empty() {
            return Err(QuickEdaError::Precondition("no column types selected".to_owned()));
        }
        let (df, report) = coerce_types(working, types)?;

        let applied: BTreeMap<String, ColumnKind> = types
            .iter()
            .filter(|(name, _)| report.converted.contains(name))
            .map(|(name, kind)| (name.clone(), *kind))
            .collect();
        let converted = applied.len();
        if !applied.is_empty() {
            self.history.push(PipelineStep::CoerceTypes { types: applied });
        }
        self.working_changed(df)?;

        let warnings = report.warnings.iter().map(ToString::to_string).collect();
        Ok(Outcome::new(format!(
            "Converted {converted} of {} column(s)",
            types.len()
        ))
        .with_warnings(warnings))
    }

    fn transform(&mut self, request: TransformRequest) -> Result<Outcome> {
        let working = self.store.working()?;
        let result = request.apply(working, &self.options)?;

        let (rows, cols) = result.df.shape();
        let message = format!("{}: {rows} rows x {cols} columns", request.description());
        self.working_changed(result.df)?;
        self.history.push(PipelineStep::Transform { request });
        Ok(Outcome::new(message).with_warnings(result.warnings))
    }

    fn replay(&mut self, pipeline: TransformPipeline) -> Result<Outcome> {
        let working = self.store.working()?;
        if pipeline.is_empty() {
            return Err(QuickEdaError::Precondition("the pipeline has no steps".to_owned()));
        }
        let result = pipeline.apply(working, &self.options)?;

        let (rows, cols) = result.df.shape();
        let steps = pipeline.len();
        self.working_changed(result.df)?;
        for step in pipeline.iter() {
            self.history.push(step.clone());
        }
        Ok(Outcome::new(format!(
            "Replayed {steps} step(s): {rows} rows x {cols} columns"
        ))
        .with_warnings(result.warnings))
    }

    fn reset(&mut self) -> Result<Outcome> {
        self.store.reset_working()?;
        self.filter.sync(self.store.working()?);
        self.reports.invalidate(ReportTarget::Working);
        self.history.clear();
        Ok(Outcome::new("Working dataset reset to the uploaded data"))
    }

    fn select_columns(&mut self, columns: Vec<String>) -> Result<Outcome> {
        let working = self.store.working()?;
        self.filter.select(working, columns)?;
        let selected = self.filter.columns(working).len();
        Ok(Outcome::new(format!(
            "{selected} column(s) selected for profiling"
        )))
    }

    fn generate_report<F>(&mut self, target: ReportTarget, mode: ReportMode, on_progress: F) -> Result<Outcome>
    where
        F: FnMut(ProfileProgress<'_>),
    {
        let source = match target {
            ReportTarget::Raw => self.store.raw()?,
            ReportTarget::Working => self.store.working()?,
        };
        let df = self.filter.apply(source)?;
        let key = report::fingerprint(&df, mode, target)?;

        if self.reports.touch(&key).is_some() {
            return Ok(Outcome::new(format!(
                "{mode} report for the {target} dataset is up to date"
            )));
        }

        let title = self.store.file_name().unwrap_or("dataset").to_owned();
        let generated = report::generate(&df, &title, mode, target, on_progress)?;
        let alerts = generated.profile.alerts.len();
        self.reports.insert(generated);
        Ok(Outcome::new(format!(
            "Generated {mode} report for the {target} dataset ({} columns, {alerts} alerts)",
            df.width()
        )))
    }

    pub fn is_loaded(&self) -> bool {
        self.store.is_loaded()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.store.file_name()
    }

    pub fn raw(&self) -> Result<&DataFrame> {
        self.store.raw()
    }

    pub fn working(&self) -> Result<&DataFrame> {
        self.store.working()
    }

    /// Random rows of the working dataset, stable for a given dataset.
    pub fn preview(&self) -> Result<DataFrame> {
        preview_sample(self.store.working()?, self.preview_rows, PREVIEW_SEED)
    }

    pub fn filter(&self) -> &ColumnFilter {
        &self.filter
    }

    pub fn profile_columns(&self) -> Result<Vec<String>> {
        Ok(self.filter.columns(self.store.working()?))
    }

    pub fn history(&self) -> &TransformPipeline {
        &self.history
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// The report last generated or reused, until the data it describes
    /// changes.
    pub fn current_report(&self) -> Option<&Report> {
        self.reports.current()
    }

    fn base_name(&self) -> Result<&str> {
        self.store.base_name().ok_or_else(|| {
            QuickEdaError::MissingPrerequisite("Upload a dataset first".to_owned())
        })
    }

    /// The current report's HTML and its download name.
    pub fn report_download(&self) -> Result<(String, &[u8])> {
        let base = self.base_name()?;
        let report = self.reports.current().ok_or_else(|| {
            QuickEdaError::MissingPrerequisite("Generate a report first".to_owned())
        })?;
        Ok((export::report_file_name(base), report.as_bytes()))
    }

    pub fn dataset_file_name(&self, format: ExportFormat) -> Result<String> {
        Ok(export::dataset_file_name(self.base_name()?, format))
    }

    /// The working dataset serialized as `format`, with its download name.
    pub fn dataset_download(&self, format: ExportFormat) -> Result<(String, Vec<u8>)> {
        let name = self.dataset_file_name(format)?;
        let bytes = export::to_bytes(self.store.working()?, format)?;
        tracing::info!("Exported working dataset as {} ({} bytes)", format.extension(), bytes.len());
        Ok((name, bytes))
    }
}
