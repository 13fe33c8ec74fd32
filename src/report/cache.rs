use super::{Report, ReportMode, ReportTarget};
use crate::error::Result;
use crate::export::to_csv_bytes;
use polars::prelude::DataFrame;
use sha2::{Digest as _, Sha256};
use std::collections::VecDeque;

/// Reports kept before the oldest is evicted.
const CAPACITY: usize = 8;

/// SHA-256 over the frame's CSV serialization plus the report settings,
/// as a lowercase hex string.
pub fn fingerprint(df: &DataFrame, mode: ReportMode, target: ReportTarget) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(to_csv_bytes(df)?);
    hasher.update([0u8]);
    hasher.update(mode.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(target.as_str().as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Successfully generated reports, oldest first, plus the one the user asked
/// for most recently.
#[derive(Debug, Default)]
pub struct ReportCache {
    entries: VecDeque<Report>,
    current: Option<String>,
}

impl ReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, fingerprint: &str) -> Option<&Report> {
        self.entries.iter().find(|r| r.fingerprint == fingerprint)
    }

    /// Stores `report`, replacing any entry with the same fingerprint, and
    /// makes it current.
    pub fn insert(&mut self, report: Report) {
        self.entries.retain(|r| r.fingerprint != report.fingerprint);
        if self.entries.len() >= CAPACITY {
            self.entries.pop_front();
        }
        self.current = Some(report.fingerprint.clone());
        self.entries.push_back(report);
    }

    /// Makes an existing entry current again and moves it to the back so it
    /// is evicted last.
    pub fn touch(&mut self, fingerprint: &str) -> Option<&Report> {
        let idx = self.entries.iter().position(|r| r.fingerprint == fingerprint)?;
        let report = self.entries.remove(idx)?;
        self.current = Some(report.fingerprint.clone());
        self.entries.push_back(report);
        self.entries.back()
    }

    /// The report last generated or reused. `None` once it has been
    /// invalidated, even when older reports are still cached.
    pub fn current(&self) -> Option<&Report> {
        self.get(self.current.as_deref()?)
    }

    /// Drops every report describing `target`.
    pub fn invalidate(&mut self, target: ReportTarget) {
        self.entries.retain(|r| r.target != target);
        if let Some(fingerprint) = &self.current
            && self.get(fingerprint).is_none()
        {
            self.current = None;
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.current = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::generate;
    use polars::prelude::*;

    fn report(df: &DataFrame, mode: ReportMode, target: ReportTarget) -> anyhow::Result<Report> {
        Ok(generate(df, "t", mode, target, |_| {})?)
    }

    #[test]
    fn test_fingerprint_depends_on_content_and_settings() -> anyhow::Result<()> {
        let a = df!("x" => &[1, 2, 3])?;
        let b = df!("x" => &[1, 2, 4])?;
        let fa = fingerprint(&a, ReportMode::Full, ReportTarget::Working)?;

        assert_eq!(fa, fingerprint(&a.clone(), ReportMode::Full, ReportTarget::Working)?);
        assert_ne!(fa, fingerprint(&b, ReportMode::Full, ReportTarget::Working)?);
        assert_ne!(fa, fingerprint(&a, ReportMode::Minimal, ReportTarget::Working)?);
        assert_ne!(fa, fingerprint(&a, ReportMode::Full, ReportTarget::Raw)?);
        Ok(())
    }

    #[test]
    fn test_cache_lookup_and_invalidation() -> anyhow::Result<()> {
        let df = df!("x" => &[1.0, 2.0])?;
        let mut cache = ReportCache::new();
        let working = report(&df, ReportMode::Full, ReportTarget::Working)?;
        let raw = report(&df, ReportMode::Full, ReportTarget::Raw)?;
        let key = working.fingerprint.clone();

        cache.insert(working);
        cache.insert(raw);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.current().map(|r| r.target), Some(ReportTarget::Raw));

        assert!(cache.touch(&key).is_some());
        assert_eq!(cache.current().map(|r| r.target), Some(ReportTarget::Working));

        cache.invalidate(ReportTarget::Working);
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.len(), 1);
        assert!(cache.current().is_none(), "older raw report is not current");
        Ok(())
    }

    #[test]
    fn test_invalidating_another_target_keeps_current() -> anyhow::Result<()> {
        let df = df!("x" => &[1.0, 2.0])?;
        let mut cache = ReportCache::new();
        cache.insert(report(&df, ReportMode::Full, ReportTarget::Working)?);
        cache.insert(report(&df, ReportMode::Minimal, ReportTarget::Raw)?);
        cache.invalidate(ReportTarget::Working);
        assert_eq!(cache.current().map(|r| r.mode), Some(ReportMode::Minimal));

        cache.clear();
        assert!(cache.current().is_none());
        assert!(cache.is_empty());
        Ok(())
    }

    #[test]
    fn test_reinsert_replaces_same_fingerprint() -> anyhow::Result<()> {
        let df = df!("x" => &[1.0, 2.0])?;
        let mut cache = ReportCache::new();
        cache.insert(report(&df, ReportMode::Minimal, ReportTarget::Working)?);
        cache.insert(report(&df, ReportMode::Minimal, ReportTarget::Working)?);
        assert_eq!(cache.len(), 1);
        Ok(())
    }
}
