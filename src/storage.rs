//! Persistence of tracked papers, known-title sets and citation logs.
//!
//! [`StateStore`] is the storage port; the synchronizer and paper store only see this
//! trait. [`JsonFileStore`] keeps one JSON file per logical table under a data
//! directory and replaces files atomically (write temp file, then rename), so a crash
//! mid-write leaves either the old or the new content. [`MemoryStore`] keeps everything
//! in process.

use crate::error::{CiteError, Result};
use crate::models::{CitationLogEntry, PaperId, TrackedPaper};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

const TRACKED_FILE: &str = "tracked_papers.json";

/// Storage port for all persisted state.
pub trait StateStore: Send + Sync {
    /// Tracked papers in insertion order; empty if nothing was saved yet.
    fn load_tracked(&self) -> Result<Vec<TrackedPaper>>;

    /// Replace the tracked-paper sequence.
    fn save_tracked(&self, papers: &[TrackedPaper]) -> Result<()>;

    /// Known citation titles for a paper in discovery order; empty if never synced.
    fn load_known_titles(&self, paper_id: &PaperId) -> Result<Vec<String>>;

    /// Replace the known-title set for a paper.
    fn save_known_titles(&self, paper_id: &PaperId, titles: &[String]) -> Result<()>;

    /// Append one entry to the paper's citation log. Never rewrites earlier entries.
    fn append_citation_log(&self, entry: &CitationLogEntry) -> Result<()>;

    /// Every log entry recorded for a paper, oldest first.
    fn load_citation_log(&self, paper_id: &PaperId) -> Result<Vec<CitationLogEntry>>;
}

/// JSON files under a data directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| CiteError::storage(&dir, e))?;
        info!("Using data directory {:?}", dir);
        Ok(Self { dir })
    }

    /// Root data directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn tracked_path(&self) -> PathBuf {
        self.dir.join(TRACKED_FILE)
    }

    fn known_titles_path(&self, paper_id: &PaperId) -> PathBuf {
        self.dir.join(format!("known_titles_{}.json", paper_id))
    }

    fn log_path(&self, paper_id: &PaperId) -> PathBuf {
        self.dir.join(format!("new_citations_log_{}.jsonl", paper_id))
    }

    /// Read a JSON document, or `T::default()` if the file does not exist.
    fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
        if !path.exists() {
            debug!("State file not found: {:?}", path);
            return Ok(T::default());
        }

        let content = fs::read_to_string(path).map_err(|e| CiteError::storage(path, e))?;
        serde_json::from_str(&content).map_err(|e| CiteError::storage(path, format!("invalid JSON: {}", e)))
    }

    /// Serialize to `<path>.tmp` and rename it over `path`.
    fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(value).map_err(|e| CiteError::storage(path, e))?;
        let temp_path = path.with_extension("json.tmp");

        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
            fs::rename(&temp_path, path)
        };

        write().map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            CiteError::storage(path, e)
        })
    }
}

impl StateStore for JsonFileStore {
    fn load_tracked(&self) -> Result<Vec<TrackedPaper>> {
        Self::read_json(&self.tracked_path())
    }

    fn save_tracked(&self, papers: &[TrackedPaper]) -> Result<()> {
        Self::write_json_atomic(&self.tracked_path(), papers)
    }

    fn load_known_titles(&self, paper_id: &PaperId) -> Result<Vec<String>> {
        Self::read_json(&self.known_titles_path(paper_id))
    }

    fn save_known_titles(&self, paper_id: &PaperId, titles: &[String]) -> Result<()> {
        Self::write_json_atomic(&self.known_titles_path(paper_id), titles)
    }

    fn append_citation_log(&self, entry: &CitationLogEntry) -> Result<()> {
        let path = self.log_path(&entry.paper_id);
        let mut line = serde_json::to_string(entry).map_err(|e| CiteError::storage(&path, e))?;
        line.push('\n');

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .and_then(|mut file| file.write_all(line.as_bytes()))
            .map_err(|e| CiteError::storage(&path, e))
    }

    fn load_citation_log(&self, paper_id: &PaperId) -> Result<Vec<CitationLogEntry>> {
        let path = self.log_path(paper_id);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).map_err(|e| CiteError::storage(&path, e))?;
        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .enumerate()
            .map(|(idx, line)| {
                serde_json::from_str(line)
                    .map_err(|e| CiteError::storage(&path, format!("invalid entry on line {}: {}", idx + 1, e)))
            })
            .collect()
    }
}

#[derive(Default)]
struct MemoryState {
    tracked: Vec<TrackedPaper>,
    known_titles: HashMap<PaperId, Vec<String>>,
    logs: HashMap<PaperId, Vec<CitationLogEntry>>,
}

/// In-process store. State is lost when dropped.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> Result<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| CiteError::storage("<memory>", "state lock poisoned"))?;
        Ok(f(&mut state))
    }
}

impl StateStore for MemoryStore {
    fn load_tracked(&self) -> Result<Vec<TrackedPaper>> {
        self.with_state(|s| s.tracked.clone())
    }

    fn save_tracked(&self, papers: &[TrackedPaper]) -> Result<()> {
        self.with_state(|s| s.tracked = papers.to_vec())
    }

    fn load_known_titles(&self, paper_id: &PaperId) -> Result<Vec<String>> {
        self.with_state(|s| s.known_titles.get(paper_id).cloned().unwrap_or_default())
    }

    fn save_known_titles(&self, paper_id: &PaperId, titles: &[String]) -> Result<()> {
        self.with_state(|s| {
            s.known_titles.insert(paper_id.clone(), titles.to_vec());
        })
    }

    fn append_citation_log(&self, entry: &CitationLogEntry) -> Result<()> {
        self.with_state(|s| s.logs.entry(entry.paper_id.clone()).or_default().push(entry.clone()))
    }

    fn load_citation_log(&self, paper_id: &PaperId) -> Result<Vec<CitationLogEntry>> {
        self.with_state(|s| s.logs.get(paper_id).cloned().unwrap_or_default())
    }
}
