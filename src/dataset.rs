//! The in-memory dataset a session works on.
//!
//! A dataset is a Polars [`DataFrame`]. This module adds the scalar type
//! vocabulary the rest of the crate speaks ([`ColumnKind`]) and the column
//! accessors every transformation uses to read values out and write them back.

pub mod io;
pub mod store;

pub use io::{load_bytes, preview_sample};
pub use store::DatasetStore;

use crate::error::{QuickEdaError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scalar type of a column as the user sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
    Timestamp,
    Boolean,
}

impl ColumnKind {
    /// Kinds a user may coerce a column into.
    pub const COERCIBLE: [Self; 4] = [Self::Integer, Self::Float, Self::Text, Self::Timestamp];

    pub fn of(dtype: &DataType) -> Self {
        if dtype.is_bool() {
            Self::Boolean
        } else if dtype.is_integer() {
            Self::Integer
        } else if dtype.is_float() {
            Self::Float
        } else if matches!(dtype, DataType::Date | DataType::Datetime(_, _)) {
            Self::Timestamp
        } else {
            Self::Text
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "text",
            Self::Timestamp => "timestamp",
            Self::Boolean => "boolean",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnKind {
    type Err = QuickEdaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "int" | "int64" | "integer" => Ok(Self::Integer),
            "float" | "float64" | "double" | "number" => Ok(Self::Float),
            "text" | "str" | "string" | "object" => Ok(Self::Text),
            "timestamp" | "datetime" | "date" | "datetime64" => Ok(Self::Timestamp),
            "bool" | "boolean" => Ok(Self::Boolean),
            other => Err(QuickEdaError::Config(format!("Unknown column type '{other}'"))),
        }
    }
}

/// Column names in frame order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// `(name, kind)` for every column in frame order.
pub fn schema_kinds(df: &DataFrame) -> Vec<(String, ColumnKind)> {
    df.get_columns()
        .iter()
        .map(|c| (c.name().to_string(), ColumnKind::of(c.dtype())))
        .collect()
}

pub fn kind_of(df: &DataFrame, name: &str) -> Result<ColumnKind> {
    Ok(ColumnKind::of(df.column(name)?.dtype()))
}

/// Fails with [`QuickEdaError::UnknownColumns`] listing every requested name
/// missing from `df`.
pub fn ensure_columns(df: &DataFrame, columns: &[String]) -> Result<()> {
    let missing: Vec<String> = columns
        .iter()
        .filter(|name| df.column(name.as_str()).is_err())
        .cloned()
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(QuickEdaError::UnknownColumns(missing))
    }
}

/// Reads a numeric column as `Float64`, rejecting anything that is not integer
/// or floating point. NaN cells come back as nulls.
pub fn numeric_column(df: &DataFrame, name: &str) -> Result<Float64Chunked> {
    let column = df.column(name)?;
    let kind = ColumnKind::of(column.dtype());
    if !kind.is_numeric() {
        return Err(QuickEdaError::Precondition(format!(
            "column '{name}' is {kind}, not numeric"
        )));
    }
    float_chunked(column.as_materialized_series())
}

/// Casts to `Float64` and turns NaN into null, so statistics skip NaN cells
/// the same way they skip missing ones.
pub fn float_chunked(series: &Series) -> Result<Float64Chunked> {
    let cast = series.cast(&DataType::Float64)?;
    let ca = cast.f64()?;
    Ok(ca.set(&ca.is_nan(), None)?)
}

/// Casts any series to `f64` values; non-castable cells become `None`.
pub fn series_as_f64(series: &Series) -> Result<Vec<Option<f64>>> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().collect())
}

/// Renders every cell as text; nulls stay `None`.
pub fn text_values(series: &Series) -> Result<Vec<Option<String>>> {
    let cast = series.cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_owned))
        .collect())
}

/// Reads a temporal series as Unix milliseconds.
pub fn timestamp_millis(series: &Series) -> Result<Vec<Option<i64>>> {
    let as_ms = series
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        .cast(&DataType::Int64)?;
    Ok(as_ms.i64()?.into_iter().collect())
}

/// Builds a `Datetime[ms]` series from Unix milliseconds.
pub fn timestamp_series(name: &str, millis: Vec<Option<i64>>) -> Result<Series> {
    Ok(Series::new(name.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?)
}
