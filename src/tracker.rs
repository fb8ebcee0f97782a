//! Paper store and synchronizer bundled behind one operation lock.
//!
//! Every state-mutating operation takes the lock, so the monitor and on-demand commands
//! never interleave their read-modify-write cycles on the same files.

use crate::error::Result;
use crate::inspire::LiteratureSource;
use crate::models::{Citation, PaperId, TrackedPaper};
use crate::normalize::NormalizationPolicy;
use crate::papers::PaperStore;
use crate::storage::StateStore;
use crate::sync::CitationSynchronizer;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Outcome of checking one paper.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub paper_id: PaperId,
    /// Title if the paper is tracked
    pub title: Option<String>,
    /// Citations not reported before; empty means "checked, nothing new"
    pub citations: Vec<Citation>,
}

pub struct Tracker {
    papers: PaperStore,
    sync: CitationSynchronizer,
    store: Arc<dyn StateStore>,
    op_lock: Mutex<()>,
}

impl Tracker {
    pub fn new(
        source: Arc<dyn LiteratureSource>,
        store: Arc<dyn StateStore>,
        policy: NormalizationPolicy,
    ) -> Self {
        Self {
            papers: PaperStore::new(source.clone(), store.clone()),
            sync: CitationSynchronizer::new(source, store.clone(), policy),
            store,
            op_lock: Mutex::new(()),
        }
    }

    /// Synchronize one paper and label the result with its tracked title.
    pub async fn check(&self, paper_id: &str) -> Result<CheckReport> {
        let paper_id = PaperId::parse(paper_id)?;
        let _guard = self.op_lock.lock().await;

        let citations = self.sync.synchronize(paper_id.as_str()).await?;
        let title = self.papers.get(&paper_id)?;

        Ok(CheckReport {
            paper_id,
            title,
            citations,
        })
    }

    pub async fn add(&self, paper_id: &str) -> Result<TrackedPaper> {
        let _guard = self.op_lock.lock().await;
        self.papers.add(paper_id).await
    }

    pub async fn remove(&self, paper_id: &str) -> Result<bool> {
        let _guard = self.op_lock.lock().await;
        self.papers.remove(paper_id)
    }

    pub fn list(&self) -> Result<Vec<TrackedPaper>> {
        self.papers.list()
    }

    /// Everything ever reported for a paper, oldest first.
    pub fn history(&self, paper_id: &str) -> Result<Vec<crate::models::CitationLogEntry>> {
        let paper_id = PaperId::parse(paper_id)?;
        self.store.load_citation_log(&paper_id)
    }
}
