use crate::error::{QuickEdaError, Result};
use polars::prelude::DataFrame;
use std::path::Path;

/// An uploaded file: the frame as read plus the frame transformations act on.
#[derive(Clone, Debug)]
pub struct LoadedDataset {
    pub file_name: String,
    pub raw: DataFrame,
    pub working: DataFrame,
}

/// Holds at most one dataset for the lifetime of a session.
///
/// Every accessor fails with [`QuickEdaError::MissingPrerequisite`] until a
/// file has been loaded, so commands can be rejected before they run.
#[derive(Clone, Debug, Default)]
pub struct DatasetStore {
    loaded: Option<LoadedDataset>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever was loaded; the working frame starts as a copy of `raw`.
    pub fn load(&mut self, file_name: impl Into<String>, raw: DataFrame) {
        let working = raw.clone();
        self.loaded = Some(LoadedDataset {
            file_name: file_name.into(),
            raw,
            working,
        });
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    fn loaded(&self) -> Result<&LoadedDataset> {
        self.loaded.as_ref().ok_or_else(|| {
            QuickEdaError::MissingPrerequisite("Upload a dataset first".to_owned())
        })
    }

    pub fn raw(&self) -> Result<&DataFrame> {
        Ok(&self.loaded()?.raw)
    }

    pub fn working(&self) -> Result<&DataFrame> {
        Ok(&self.loaded()?.working)
    }

    pub fn file_name(&self) -> Option<&str> {
        self.loaded.as_ref().map(|d| d.file_name.as_str())
    }

    /// Upload name without its extension, used to name downloads.
    pub fn base_name(&self) -> Option<&str> {
        self.file_name().map(|name| {
            Path::new(name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(name)
        })
    }

    pub fn replace_working(&mut self, df: DataFrame) -> Result<()> {
        let loaded = self.loaded.as_mut().ok_or_else(|| {
            QuickEdaError::MissingPrerequisite("Upload a dataset first".to_owned())
        })?;
        loaded.working = df;
        Ok(())
    }

    /// Discards every transformation by copying the raw frame back.
    pub fn reset_working(&mut self) -> Result<()> {
        let raw = self.raw()?.clone();
        self.replace_working(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_empty_store_requires_upload() {
        let store = DatasetStore::new();
        assert!(!store.is_loaded());
        assert!(matches!(
            store.working(),
            Err(QuickEdaError::MissingPrerequisite(_))
        ));
        assert_eq!(store.base_name(), None);
    }

    #[test]
    fn test_working_is_independent_of_raw() -> anyhow::Result<()> {
        let mut store = DatasetStore::new();
        store.load("sales.2024.csv", df!("a" => &[1, 2, 3])?);
        assert_eq!(store.base_name(), Some("sales.2024"));

        store.replace_working(df!("a" => &[1])?)?;
        assert_eq!(store.working()?.height(), 1);
        assert_eq!(store.raw()?.height(), 3);

        store.reset_working()?;
        assert_eq!(store.working()?.height(), 3);
        Ok(())
    }
}
