//! dedup.rs: append-only log of handled notification ids.
//!
//! One id per line. Ids are only added once the notification was handled;
//! the log is never pruned.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;

#[derive(Debug)]
pub struct DedupStore {
    path: PathBuf,
    seen: HashSet<String>,
}

impl DedupStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let seen = match fs::read_to_string(&path) {
            Ok(s) => s
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), ids = seen.len(), "dedup store loaded");
        Ok(Self { path, seen })
    }

    pub fn seen(&self, id: &str) -> bool {
        self.seen.contains(id.trim())
    }

    /// Append `id` and flush it to disk. Already-seen ids are a no-op.
    pub fn mark_seen(&mut self, id: &str) -> Result<()> {
        let id = id.trim();
        if id.is_empty() || self.seen.contains(id) {
            return Ok(());
        }
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(f, "{id}")?;
        f.sync_data()?;
        self.seen.insert(id.to_string());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
