use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use quickeda::config::AppSettings;
use quickeda::dataset::{ColumnKind, schema_kinds};
use quickeda::export::{self, ExportFormat};
use quickeda::report::{ReportMode, ReportTarget};
use quickeda::session::{Command, Outcome, Session};
use quickeda::transforms::TransformPipeline;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "quickeda",
    version,
    about = "Upload a table, clean it, profile it, download the results",
    long_about = "Run without a subcommand to open the desktop app."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print shape, column types and a random preview of a file
    Info {
        /// CSV or spreadsheet file
        file: PathBuf,
    },
    /// Write an HTML profiling report
    Profile {
        /// CSV or spreadsheet file
        file: PathBuf,

        /// Skip correlations, duplicate detection and histograms
        #[arg(long)]
        minimal: bool,

        /// Profile only these columns (comma separated)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Apply this pipeline (JSON) before profiling
        #[arg(long)]
        pipeline: Option<PathBuf>,

        /// Output path. Defaults to `<name>_EDA.html`.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replay a saved transformation pipeline and save the result
    Transform {
        /// CSV or spreadsheet file
        file: PathBuf,

        /// Pipeline JSON, as saved from the app
        #[arg(long)]
        pipeline: PathBuf,

        /// Column types to apply first, as a JSON object of column -> type
        #[arg(long)]
        types: Option<PathBuf>,

        /// Output path (.csv or .xlsx). Defaults to `<name>_transformed.csv`.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn run_command(command: Commands, settings: &AppSettings) -> Result<()> {
    let mut session = Session::new(settings);
    match command {
        Commands::Info { file } => handle_info(&mut session, &file),
        Commands::Profile {
            file,
            minimal,
            columns,
            pipeline,
            output,
        } => {
            let mode = if minimal {
                ReportMode::Minimal
            } else {
                settings.default_report_mode
            };
            handle_profile(&mut session, &file, mode, columns, pipeline, output)
        }
        Commands::Transform {
            file,
            pipeline,
            types,
            output,
        } => handle_transform(&mut session, &file, &pipeline, types, output),
    }
}

fn print_outcome(outcome: &Outcome) {
    println!("{}", outcome.message);
    for warning in &outcome.warnings {
        println!("  warning: {warning}");
    }
}

fn upload(session: &mut Session, file: &Path) -> Result<()> {
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", file.display()))?
        .to_owned();
    let outcome = session.dispatch(Command::Upload { file_name, bytes })?;
    print_outcome(&outcome);
    Ok(())
}

fn replay(session: &mut Session, pipeline: &Path) -> Result<()> {
    let pipeline = TransformPipeline::load(pipeline)?;
    let outcome = session.dispatch(Command::ReplayPipeline(pipeline))?;
    print_outcome(&outcome);
    Ok(())
}

fn handle_info(session: &mut Session, file: &Path) -> Result<()> {
    upload(session, file)?;
    let df = session.working()?;

    println!();
    println!("{:<32} TYPE", "COLUMN");
    for (name, kind) in schema_kinds(df) {
        println!("{name:<32} {kind}");
    }
    println!();
    println!("Preview:");
    println!("{}", session.preview()?);
    Ok(())
}

fn handle_profile(
    session: &mut Session,
    file: &Path,
    mode: ReportMode,
    columns: Vec<String>,
    pipeline: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    upload(session, file)?;
    if let Some(pipeline) = pipeline {
        replay(session, &pipeline)?;
    }
    if !columns.is_empty() {
        print_outcome(&session.dispatch(Command::SelectProfileColumns(columns))?);
    }

    let outcome = session.dispatch_with_progress(
        Command::GenerateReport {
            target: ReportTarget::Working,
            mode,
        },
        |p| eprintln!("[{}/{}] {}", p.index + 1, p.total, p.column),
    )?;
    print_outcome(&outcome);

    let (name, html) = session.report_download()?;
    let path = output.unwrap_or_else(|| PathBuf::from(name));
    std::fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Report written to {}", path.display());
    Ok(())
}

fn handle_transform(
    session: &mut Session,
    file: &Path,
    pipeline: &Path,
    types: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    upload(session, file)?;

    if let Some(types) = types {
        let json = std::fs::read_to_string(&types)
            .with_context(|| format!("Failed to read {}", types.display()))?;
        let types: BTreeMap<String, ColumnKind> =
            serde_json::from_str(&json).context("Failed to parse column types")?;
        print_outcome(&session.dispatch(Command::CoerceTypes(types))?);
    }
    replay(session, pipeline)?;

    let path = match output {
        Some(path) => path,
        None => PathBuf::from(session.dataset_file_name(ExportFormat::Csv)?),
    };
    export::write_dataset(session.working()?, &path)?;
    println!("Dataset written to {}", path.display());
    Ok(())
}
