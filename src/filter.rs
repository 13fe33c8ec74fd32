//! Column selection for profiling.

use crate::dataset::column_names;
use crate::error::{QuickEdaError, Result};
use polars::prelude::DataFrame;

/// Which columns take part in profiling.
///
/// `None` means "every column", so columns added later (one-hot indicators,
/// for instance) are included automatically until the user narrows the
/// selection. An explicit selection persists across reports; names that
/// disappear from the dataset are silently dropped from it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnFilter {
    selected: Option<Vec<String>>,
}

impl ColumnFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_all(&self) -> bool {
        self.selected.is_none()
    }

    pub fn reset(&mut self) {
        self.selected = None;
    }

    /// Replaces the selection. Unknown names are rejected and the previous
    /// selection is kept.
    pub fn select(&mut self, df: &DataFrame, columns: Vec<String>) -> Result<()> {
        let available = column_names(df);
        let unknown: Vec<String> = columns
            .iter()
            .filter(|c| !available.contains(c))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(QuickEdaError::UnknownColumns(unknown));
        }
        if columns.is_empty() {
            return Err(QuickEdaError::Precondition(
                "select at least one column to profile".to_owned(),
            ));
        }

        let mut deduped: Vec<String> = Vec::with_capacity(columns.len());
        for c in columns {
            if !deduped.contains(&c) {
                deduped.push(c);
            }
        }
        self.selected = Some(deduped);
        Ok(())
    }

    /// Drops selected names that no longer exist in `df`. If nothing is left
    /// the filter falls back to all columns.
    pub fn sync(&mut self, df: &DataFrame) {
        let available = column_names(df);
        if let Some(selected) = &mut self.selected {
            selected.retain(|c| {
                let keep = available.contains(c);
                if !keep {
                    tracing::debug!("Column '{c}' left the dataset; removed from profile selection");
                }
                keep
            });
            if selected.is_empty() {
                self.selected = None;
            }
        }
    }

    /// Selected columns in dataset order.
    pub fn columns(&self, df: &DataFrame) -> Vec<String> {
        let available = column_names(df);
        match &self.selected {
            None => available,
            Some(selected) => available
                .into_iter()
                .filter(|c| selected.contains(c))
                .collect(),
        }
    }

    /// The slice of `df` to profile.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        if self.is_all() {
            return Ok(df.clone());
        }
        Ok(df.select(self.columns(df))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn frame() -> anyhow::Result<DataFrame> {
        Ok(df!("a" => &[1, 2], "b" => &["x", "y"], "c" => &[0.5, 1.5])?)
    }

    #[test]
    fn test_defaults_to_all_columns() -> anyhow::Result<()> {
        let df = frame()?;
        let filter = ColumnFilter::new();
        assert_eq!(filter.columns(&df), vec!["a", "b", "c"]);
        assert_eq!(filter.apply(&df)?.width(), 3);
        Ok(())
    }

    #[test]
    fn test_selection_keeps_dataset_order() -> anyhow::Result<()> {
        let df = frame()?;
        let mut filter = ColumnFilter::new();
        filter.select(&df, vec!["c".to_owned(), "a".to_owned(), "c".to_owned()])?;
        assert_eq!(filter.columns(&df), vec!["a", "c"]);
        assert_eq!(filter.apply(&df)?.width(), 2);
        Ok(())
    }

    #[test]
    fn test_unknown_selection_is_rejected_and_previous_kept() -> anyhow::Result<()> {
        let df = frame()?;
        let mut filter = ColumnFilter::new();
        filter.select(&df, vec!["b".to_owned()])?;
        let result = filter.select(&df, vec!["b".to_owned(), "nope".to_owned()]);
        assert!(matches!(result, Err(QuickEdaError::UnknownColumns(_))));
        assert_eq!(filter.columns(&df), vec!["b"]);
        Ok(())
    }

    #[test]
    fn test_vanished_columns_are_dropped() -> anyhow::Result<()> {
        let df = frame()?;
        let mut filter = ColumnFilter::new();
        filter.select(&df, vec!["a".to_owned(), "b".to_owned()])?;

        let narrowed = df.drop("b")?;
        filter.sync(&narrowed);
        assert_eq!(filter.columns(&narrowed), vec!["a"]);

        let gone = narrowed.drop("a")?;
        filter.sync(&gone);
        assert!(filter.is_all());
        Ok(())
    }
}
