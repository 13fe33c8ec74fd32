//! Reading uploads into a [`DataFrame`].
//!
//! CSV goes through the Polars reader with date inference switched on.
//! Spreadsheets (`xlsx`, `xlsm`, `xls`, `ods`) go through calamine: the first
//! worksheet is read, its first row becomes the header and each column gets
//! the narrowest type that fits every non-empty cell.

use super::timestamp_series;
use crate::coercion::parse_timestamp;
use crate::error::{QuickEdaError, Result, ResultExt as _};
use calamine::{Data, Reader as _};
use polars::prelude::*;
use rand::SeedableRng as _;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

/// Upload formats quickeda understands, keyed by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Spreadsheet,
}

impl SourceFormat {
    pub const EXTENSIONS: [&'static str; 5] = ["csv", "xlsx", "xlsm", "xls", "ods"];

    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(Self::Spreadsheet),
            _ => Err(QuickEdaError::DataProcessing(format!(
                "Unsupported file type '{file_name}'; expected one of: {}",
                Self::EXTENSIONS.join(", ")
            ))),
        }
    }
}

/// Parses an uploaded file. The format is chosen from `file_name`'s extension.
pub fn load_bytes(file_name: &str, bytes: Vec<u8>, infer_schema_length: usize) -> Result<DataFrame> {
    let df = match SourceFormat::from_file_name(file_name)? {
        SourceFormat::Csv => read_csv(bytes, infer_schema_length)
            .with_context(|| format!("Failed to read CSV '{file_name}'"))?,
        SourceFormat::Spreadsheet => read_spreadsheet(bytes)
            .with_context(|| format!("Failed to read spreadsheet '{file_name}'"))?,
    };
    tracing::info!(
        "Loaded '{file_name}': {} rows x {} columns",
        df.height(),
        df.width()
    );
    Ok(df)
}

pub fn read_csv(bytes: Vec<u8>, infer_schema_length: usize) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(infer_schema_length))
        .map_parse_options(|opts| opts.with_try_parse_dates(true))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    Ok(df)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellKind {
    Empty,
    Int,
    Float,
    Bool,
    DateTime,
    Text,
}

impl CellKind {
    fn of(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => Self::Empty,
            Data::Int(_) => Self::Int,
            Data::Float(_) => Self::Float,
            Data::Bool(_) => Self::Bool,
            Data::DateTime(_) | Data::DateTimeIso(_) => Self::DateTime,
            Data::String(_) | Data::DurationIso(_) => Self::Text,
        }
    }

    /// Narrowest kind able to hold both.
    fn widen(self, other: Self) -> Self {
        match (self, other) {
            (Self::Empty, k) | (k, Self::Empty) => k,
            (a, b) if a == b => a,
            (Self::Int, Self::Float) | (Self::Float, Self::Int) => Self::Float,
            _ => Self::Text,
        }
    }
}

pub fn read_spreadsheet(bytes: Vec<u8>) -> Result<DataFrame> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| QuickEdaError::DataProcessing("No sheets found in workbook".to_owned()))?;

    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Err(QuickEdaError::DataProcessing(format!(
            "Sheet '{sheet_name}' is empty"
        )));
    };
    let names = header_names(header);
    let body: Vec<&[Data]> = rows.collect();

    let empty = Data::Empty;
    let mut columns = Vec::with_capacity(names.len());
    for (idx, name) in names.iter().enumerate() {
        let cells: Vec<&Data> = body
            .iter()
            .map(|row| row.get(idx).unwrap_or(&empty))
            .collect();
        columns.push(Column::from(build_series(name, &cells)?));
    }

    Ok(DataFrame::new(columns)?)
}

fn header_names(header: &[Data]) -> Vec<String> {
    let mut seen = HashSet::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let raw = match cell {
                Data::Empty => String::new(),
                other => other.to_string().trim().to_owned(),
            };
            let base = if raw.is_empty() {
                format!("Unnamed: {idx}")
            } else {
                raw
            };
            // Polars rejects duplicate names; suffix repeats the way pandas does.
            let mut name = base.clone();
            let mut n = 1;
            while !seen.insert(name.clone()) {
                name = format!("{base}.{n}");
                n += 1;
            }
            name
        })
        .collect()
}

fn build_series(name: &str, cells: &[&Data]) -> Result<Series> {
    let kind = cells
        .iter()
        .fold(CellKind::Empty, |acc, cell| acc.widen(CellKind::of(cell)));

    let series = match kind {
        CellKind::Int => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(i) => Some(*i),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        CellKind::Float => {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(i) => Some(*i as f64),
                    Data::Float(f) => Some(*f),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        CellKind::Bool => {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        CellKind::DateTime => {
            let millis: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::DateTime(dt) => dt.as_datetime(),
                    Data::DateTimeIso(s) => parse_timestamp(s),
                    _ => None,
                })
                .map(|dt| dt.map(|dt| dt.and_utc().timestamp_millis()))
                .collect();
            timestamp_series(name, millis)?
        }
        CellKind::Text | CellKind::Empty => {
            let values: Vec<Option<String>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Empty | Data::Error(_) => None,
                    Data::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                })
                .collect();
            Series::new(name.into(), values)
        }
    };
    Ok(series)
}

/// Up to `n` rows picked at random with a fixed seed, kept in frame order.
pub fn preview_sample(df: &DataFrame, n: usize, seed: u64) -> Result<DataFrame> {
    let height = df.height();
    let amount = n.min(height);
    if amount == height {
        return Ok(df.clone());
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = rand::seq::index::sample(&mut rng, height, amount).into_vec();
    picked.sort_unstable();

    let indices = picked
        .into_iter()
        .map(IdxSize::try_from)
        .collect::<std::result::Result<Vec<IdxSize>, _>>()
        .map_err(|e| QuickEdaError::DataProcessing(format!("row index out of range: {e}")))?;
    Ok(df.take(&IdxCa::from_vec("idx".into(), indices))?)
}
