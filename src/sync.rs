//! Citation synchronization: fetch citing records, diff against known titles,
//! persist, and report what is new.

use crate::error::Result;
use crate::inspire::LiteratureSource;
use crate::models::{Citation, CitationLogEntry, PaperId};
use crate::normalize::NormalizationPolicy;
use crate::storage::StateStore;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Turns a batch of citing records into the list of citations not seen before.
pub struct CitationSynchronizer {
    source: Arc<dyn LiteratureSource>,
    store: Arc<dyn StateStore>,
    policy: NormalizationPolicy,
}

impl CitationSynchronizer {
    pub fn new(
        source: Arc<dyn LiteratureSource>,
        store: Arc<dyn StateStore>,
        policy: NormalizationPolicy,
    ) -> Self {
        Self { source, store, policy }
    }

    /// Check `paper_id` for citations whose titles were never reported before.
    ///
    /// Upstream failures are returned as errors, never as an empty list, and leave the
    /// persisted state untouched. When something new is found one entry is appended to
    /// the paper's citation log, then the known-title set is rewritten.
    pub async fn synchronize(&self, paper_id: &str) -> Result<Vec<Citation>> {
        let paper_id = PaperId::parse(paper_id)?;

        let records = self.source.search_citing_records(&paper_id).await?;
        if records.is_empty() {
            info!(paper_id = %paper_id, "No citations found");
            return Ok(Vec::new());
        }

        let mut known_titles = self.store.load_known_titles(&paper_id)?;
        let mut seen: HashSet<String> = known_titles.iter().cloned().collect();
        let mut new_citations = Vec::new();

        for record in &records {
            let citation = self.policy.normalize(record);
            // insert() is false for titles already known or repeated within this batch
            if !seen.insert(citation.title.clone()) {
                continue;
            }
            known_titles.push(citation.title.clone());
            new_citations.push(citation);
        }

        if new_citations.is_empty() {
            debug!(paper_id = %paper_id, checked = records.len(), "No new citations");
            return Ok(new_citations);
        }

        // titles become known only once the log entry is written
        self.store.append_citation_log(&CitationLogEntry {
            checked_at: Utc::now(),
            paper_id: paper_id.clone(),
            citations: new_citations.clone(),
        })?;
        self.store.save_known_titles(&paper_id, &known_titles)?;

        info!(
            paper_id = %paper_id,
            new = new_citations.len(),
            known = known_titles.len(),
            "Found new citations"
        );
        Ok(new_citations)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::error::{CiteError, Result};
    use crate::inspire::{LiteratureSource, RawMetadata, RawRecord, RawTitle};
    use crate::models::PaperId;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Stub literature source with per-paper canned titles.
    #[derive(Default)]
    pub struct StubSource {
        pub citing: Mutex<HashMap<String, Vec<String>>>,
        pub titles: Mutex<HashMap<String, String>>,
        pub failing: Mutex<Vec<String>>,
    }

    impl StubSource {
        pub fn set_citing(&self, paper_id: &str, titles: &[&str]) {
            self.citing
                .lock()
                .expect("stub lock")
                .insert(paper_id.to_string(), titles.iter().map(|t| t.to_string()).collect());
        }

        pub fn set_title(&self, paper_id: &str, title: &str) {
            self.titles
                .lock()
                .expect("stub lock")
                .insert(paper_id.to_string(), title.to_string());
        }

        pub fn fail(&self, paper_id: &str) {
            self.failing.lock().expect("stub lock").push(paper_id.to_string());
        }

        fn check_failure(&self, paper_id: &PaperId) -> Result<()> {
            if self.failing.lock().expect("stub lock").iter().any(|p| p == paper_id.as_str()) {
                return Err(CiteError::Api {
                    code: 502,
                    message: "stubbed outage".to_string(),
                });
            }
            Ok(())
        }
    }

    pub fn record(title: &str) -> RawRecord {
        RawRecord {
            metadata: RawMetadata {
                titles: vec![RawTitle {
                    title: Some(title.to_string()),
                    source: Some("arXiv".to_string()),
                }],
                ..Default::default()
            },
        }
    }

    #[async_trait]
    impl LiteratureSource for StubSource {
        async fn search_citing_records(&self, paper_id: &PaperId) -> Result<Vec<RawRecord>> {
            self.check_failure(paper_id)?;
            let citing = self.citing.lock().expect("stub lock");
            Ok(citing
                .get(paper_id.as_str())
                .map(|titles| titles.iter().map(|t| record(t)).collect())
                .unwrap_or_default())
        }

        async fn fetch_record_title(&self, paper_id: &PaperId) -> Result<String> {
            self.check_failure(paper_id)?;
            self.titles
                .lock()
                .expect("stub lock")
                .get(paper_id.as_str())
                .cloned()
                .ok_or_else(|| CiteError::NotFound(format!("INSPIRE record {}", paper_id)))
        }
    }
}
