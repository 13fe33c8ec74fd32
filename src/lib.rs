//! # quickeda
//!
//! Exploratory data analysis for a single table: upload a CSV or spreadsheet,
//! fix column types, clean it with a stack of transformations, profile it into
//! a self-contained HTML report and download the results.
//!
//! Everything goes through a [`session::Session`]:
//!
//! ```no_run
//! use quickeda::config::AppSettings;
//! use quickeda::report::{ReportMode, ReportTarget};
//! use quickeda::session::{Command, Session};
//! use quickeda::transforms::{MissingPolicy, TransformRequest};
//!
//! # fn main() -> quickeda::error::Result<()> {
//! let mut session = Session::new(&AppSettings::default());
//! session.dispatch(Command::Upload {
//!     file_name: "people.csv".to_owned(),
//!     bytes: std::fs::read("people.csv")?,
//! })?;
//! session.dispatch(Command::Transform(TransformRequest::Missing {
//!     columns: vec!["age".to_owned()],
//!     policy: MissingPolicy::FillMean,
//! }))?;
//! session.dispatch(Command::GenerateReport {
//!     target: ReportTarget::Working,
//!     mode: ReportMode::Full,
//! })?;
//! let (name, html) = session.report_download()?;
//! std::fs::write(name, html)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`dataset`]: loading files and the raw/working dataset pair
//! - [`coercion`]: user-chosen column types
//! - [`transforms`]: scaling, missing values, outliers, encoding and saved pipelines
//! - [`filter`]: which columns a report covers
//! - [`report`]: profiling, HTML rendering and the report cache
//! - [`export`]: CSV and Excel downloads
//! - [`session`]: the command dispatcher tying it together

#![warn(clippy::all, rust_2018_idioms)]

pub mod coercion;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod filter;
pub mod logging;
pub mod report;
pub mod session;
pub mod transforms;
pub mod utils;
