//! ledger.rs: durable per-author infraction tracking.
//!
//! Every mutation rewrites the JSON file (temp file + rename) before it
//! returns, so a count observed by the caller survives a crash.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::decision::InfractionEntry;
use crate::engine::InfractionView;
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfractionRecord {
    /// Equals `history.len()`.
    pub count: u32,
    #[serde(default)]
    pub history: Vec<InfractionEntry>,
}

#[derive(Debug)]
pub struct InfractionLedger {
    path: PathBuf,
    records: BTreeMap<String, InfractionRecord>,
}

impl InfractionLedger {
    /// Load the ledger at `path`; a missing file is an empty ledger. A corrupt
    /// file is moved aside to `*.corrupt` and the ledger starts empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = match fs::read_to_string(&path) {
            Ok(s) if s.trim().is_empty() => BTreeMap::new(),
            Ok(s) => match serde_json::from_str::<BTreeMap<String, InfractionRecord>>(&s) {
                Ok(r) => r,
                Err(e) => {
                    let aside = path.with_extension("json.corrupt");
                    warn!(path = %path.display(), error = %e, "infraction file unreadable, starting empty");
                    fs::rename(&path, &aside)?;
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), authors = records.len(), "infraction ledger loaded");
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one infraction and return the new count.
    ///
    /// On a persistence failure the in-memory state is rolled back so the
    /// count never runs ahead of what is on disk.
    pub fn record(&mut self, handle: &str, entry: InfractionEntry) -> Result<u32> {
        let previous = self.records.get(handle).cloned();
        let rec = self.records.entry(handle.to_string()).or_default();
        rec.history.push(entry);
        rec.count = rec.count.saturating_add(1);
        let count = rec.count;

        if let Err(e) = self.persist() {
            match previous {
                Some(p) => {
                    self.records.insert(handle.to_string(), p);
                }
                None => {
                    self.records.remove(handle);
                }
            }
            return Err(e.into());
        }
        Ok(count)
    }

    pub fn get(&self, handle: &str) -> Option<&InfractionRecord> {
        self.records.get(handle)
    }

    pub fn history(&self, handle: &str) -> &[InfractionEntry] {
        self.records
            .get(handle)
            .map(|r| r.history.as_slice())
            .unwrap_or(&[])
    }

    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Amnesty: drop the whole record. Returns whether one existed.
    pub fn reset(&mut self, handle: &str) -> Result<bool> {
        let Some(removed) = self.records.remove(handle) else {
            return Ok(false);
        };
        if let Err(e) = self.persist() {
            self.records.insert(handle.to_string(), removed);
            return Err(e.into());
        }
        info!(handle, "infraction record reset");
        Ok(true)
    }

    fn persist(&self) -> io::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(&self.records)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let mut f = File::create(&tmp)?;
        f.write_all(&json)?;
        f.sync_all()?;
        fs::rename(tmp, &self.path)?;
        Ok(())
    }
}

impl InfractionView for InfractionLedger {
    fn count(&self, handle: &str) -> u32 {
        self.records.get(handle).map(|r| r.count).unwrap_or(0)
    }
}
