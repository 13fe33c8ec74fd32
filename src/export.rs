//! Serializing the working dataset for download.

use crate::dataset::{ColumnKind, series_as_f64, text_values, timestamp_millis};
use crate::error::{QuickEdaError, Result, ResultExt as _};
use chrono::DateTime;
use polars::prelude::*;
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

/// Timestamp layout in CSV downloads.
pub const CSV_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";
/// Excel number format applied to timestamp cells.
pub const XLSX_DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("csv") => Ok(Self::Csv),
            Some("xlsx") => Ok(Self::Xlsx),
            _ => Err(QuickEdaError::Export(format!(
                "cannot tell the output format of '{}'; use .csv or .xlsx",
                path.display()
            ))),
        }
    }
}

pub fn report_file_name(base: &str) -> String {
    format!("{base}_EDA.html")
}

pub fn dataset_file_name(base: &str, format: ExportFormat) -> String {
    format!("{base}_transformed.{}", format.extension())
}

/// UTF-8, comma-delimited, with a header row.
pub fn to_csv_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut df = df.clone();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .with_datetime_format(Some(CSV_DATETIME_FORMAT.to_owned()))
        .finish(&mut df)?;
    Ok(buf)
}

fn excel_row(idx: usize) -> Result<u32> {
    // Row 0 holds the header.
    u32::try_from(idx + 1)
        .map_err(|_| QuickEdaError::Export(format!("row {idx} exceeds the worksheet limit")))
}

/// One worksheet: header row, typed cells, nulls left empty.
pub fn to_xlsx_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let datetime = Format::new().set_num_format(XLSX_DATETIME_FORMAT);
    let worksheet = workbook.add_worksheet();

    for (col_idx, column) in df.get_columns().iter().enumerate() {
        let col = u16::try_from(col_idx)
            .map_err(|_| QuickEdaError::Export("too many columns for a worksheet".to_owned()))?;
        let series = column.as_materialized_series();
        worksheet.write_string_with_format(0, col, series.name().as_str(), &header)?;

        match ColumnKind::of(series.dtype()) {
            ColumnKind::Integer | ColumnKind::Float => {
                for (i, v) in series_as_f64(series)?.into_iter().enumerate() {
                    if let Some(v) = v.filter(|v| v.is_finite()) {
                        worksheet.write_number(excel_row(i)?, col, v)?;
                    }
                }
            }
            ColumnKind::Boolean => {
                for (i, v) in series.bool()?.into_iter().enumerate() {
                    if let Some(v) = v {
                        worksheet.write_boolean(excel_row(i)?, col, v)?;
                    }
                }
            }
            ColumnKind::Timestamp => {
                for (i, ms) in timestamp_millis(series)?.into_iter().enumerate() {
                    if let Some(dt) = ms.and_then(DateTime::from_timestamp_millis) {
                        worksheet.write_datetime_with_format(
                            excel_row(i)?,
                            col,
                            &dt.naive_utc(),
                            &datetime,
                        )?;
                    }
                }
                worksheet.set_column_width(col, 20)?;
            }
            ColumnKind::Text => {
                for (i, v) in text_values(series)?.into_iter().enumerate() {
                    if let Some(v) = v {
                        worksheet.write_string(excel_row(i)?, col, v)?;
                    }
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

pub fn to_bytes(df: &DataFrame, format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => to_csv_bytes(df),
        ExportFormat::Xlsx => to_xlsx_bytes(df),
    }
}

/// Writes `df` to `path`, picking the format from the extension.
pub fn write_dataset(df: &DataFrame, path: &Path) -> Result<()> {
    let bytes = to_bytes(df, ExportFormat::from_path(path)?)?;
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::io::{read_csv, read_spreadsheet};
    use crate::dataset::timestamp_series;

    fn frame() -> anyhow::Result<DataFrame> {
        let mut df = df!(
            "age" => &[Some(25i64), None, Some(30)],
            "city" => &[Some("NY"), Some("LA"), None],
            "score" => &[1.5, 2.25, -3.0],
            "member" => &[Some(true), None, Some(false)]
        )?;
        df.with_column(timestamp_series(
            "joined",
            vec![Some(1_704_067_200_000), None, Some(1_709_296_200_123)],
        )?)?;
        Ok(df)
    }

    #[test]
    fn test_file_names() {
        assert_eq!(report_file_name("sales"), "sales_EDA.html");
        assert_eq!(
            dataset_file_name("sales", ExportFormat::Xlsx),
            "sales_transformed.xlsx"
        );
    }

    #[test]
    fn test_csv_round_trip_keeps_shape() -> anyhow::Result<()> {
        let df = frame()?;
        let bytes = to_csv_bytes(&df)?;
        let text = String::from_utf8(bytes.clone())?;
        assert!(text.starts_with("age,city,score,member,joined\n"));
        assert!(text.contains("2024-03-01T12:30:00.123"));

        let back = read_csv(bytes, 100)?;
        assert_eq!(back.shape(), df.shape());
        Ok(())
    }

    #[test]
    fn test_xlsx_round_trip_keeps_shape_and_types() -> anyhow::Result<()> {
        let df = frame()?;
        let bytes = to_xlsx_bytes(&df)?;
        assert!(bytes.starts_with(b"PK"));

        let back = read_spreadsheet(bytes)?;
        assert_eq!(back.shape(), df.shape());
        assert_eq!(ColumnKind::of(back.column("score")?.dtype()), ColumnKind::Float);
        assert_eq!(ColumnKind::of(back.column("member")?.dtype()), ColumnKind::Boolean);
        assert_eq!(
            ColumnKind::of(back.column("joined")?.dtype()),
            ColumnKind::Timestamp
        );
        assert_eq!(back.column("city")?.null_count(), 1);
        Ok(())
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ExportFormat::from_path(Path::new("out/clean.XLSX")).ok(),
            Some(ExportFormat::Xlsx)
        );
        assert!(ExportFormat::from_path(Path::new("out/clean.parquet")).is_err());
    }
}
