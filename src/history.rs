//! Payloads received by the collector, kept in memory and
//! mirrored to timestamped files on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use crate::digest::ReceivedNews;

#[derive(Debug)]
pub struct NewsHistory {
    inner: RwLock<Vec<ReceivedNews>>,
    data_dir: Option<PathBuf>,
}

impl NewsHistory {
    /// Memory only.
    pub fn in_memory() -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
            data_dir: None,
        }
    }

    /// Memory plus `news_YYYYMMDD_HHMMSS.json` files under `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let dir = data_dir.into();
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!(error = %e, dir = %dir.display(), "cannot create data dir");
        }
        Self {
            inner: RwLock::new(Vec::new()),
            data_dir: Some(dir),
        }
    }

    /// Store in memory, then persist. A failed write is logged and otherwise ignored.
    pub fn push(&self, payload: ReceivedNews) {
        if let Some(dir) = &self.data_dir {
            if let Err(e) = persist(dir, &payload) {
                tracing::warn!(error = ?e, "Error saving data to disk");
            }
        }
        let mut v = self.inner.write().expect("news history poisoned");
        v.push(payload);
    }

    pub fn all(&self) -> Vec<ReceivedNews> {
        self.inner.read().expect("news history poisoned").clone()
    }

    pub fn latest(&self) -> Option<ReceivedNews> {
        self.inner.read().expect("news history poisoned").last().cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("news history poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `news_<YYYYMMDD_HHMMSS>.json` from the payload's own timestamp.
pub fn file_name_for(timestamp: &str) -> Result<String> {
    let ts = parse_iso(timestamp).with_context(|| format!("bad payload timestamp {timestamp:?}"))?;
    Ok(format!("news_{}.json", ts.format("%Y%m%d_%H%M%S")))
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

fn persist(dir: &Path, payload: &ReceivedNews) -> Result<()> {
    let path = dir.join(file_name_for(&payload.timestamp)?);
    let json = serde_json::to_string_pretty(payload)?;
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))
}
