//! Tracked-paper store.

use crate::error::Result;
use crate::inspire::LiteratureSource;
use crate::models::{PaperId, TrackedPaper};
use crate::storage::StateStore;
use std::sync::Arc;
use tracing::info;

/// Add/remove/list over the set of papers being monitored.
pub struct PaperStore {
    source: Arc<dyn LiteratureSource>,
    store: Arc<dyn StateStore>,
}

impl PaperStore {
    pub fn new(source: Arc<dyn LiteratureSource>, store: Arc<dyn StateStore>) -> Self {
        Self { source, store }
    }

    /// Start tracking `paper_id`.
    ///
    /// The display title is looked up upstream first; if that fails nothing is stored.
    /// Adding an already tracked paper returns the existing entry unchanged.
    pub async fn add(&self, paper_id: &str) -> Result<TrackedPaper> {
        let paper_id = PaperId::parse(paper_id)?;
        let title = self.source.fetch_record_title(&paper_id).await?;

        let mut tracked = self.store.load_tracked()?;
        if let Some(existing) = tracked.iter().find(|p| p.paper_id == paper_id) {
            info!(paper_id = %paper_id, "Paper already tracked");
            return Ok(existing.clone());
        }

        let paper = TrackedPaper { paper_id, title };
        tracked.push(paper.clone());
        self.store.save_tracked(&tracked)?;

        info!(paper_id = %paper.paper_id, title = %paper.title, "Paper added");
        Ok(paper)
    }

    /// Stop tracking `paper_id`. Returns whether an entry was removed.
    pub fn remove(&self, paper_id: &str) -> Result<bool> {
        let paper_id = PaperId::parse(paper_id)?;

        let mut tracked = self.store.load_tracked()?;
        let before = tracked.len();
        tracked.retain(|p| p.paper_id != paper_id);

        if tracked.len() == before {
            info!(paper_id = %paper_id, "Paper was not tracked");
            return Ok(false);
        }

        self.store.save_tracked(&tracked)?;
        info!(paper_id = %paper_id, "Paper removed");
        Ok(true)
    }

    /// All tracked papers in insertion order.
    pub fn list(&self) -> Result<Vec<TrackedPaper>> {
        self.store.load_tracked()
    }

    /// Title of a tracked paper, without asking upstream.
    pub fn get(&self, paper_id: &PaperId) -> Result<Option<String>> {
        Ok(self
            .store
            .load_tracked()?
            .into_iter()
            .find(|p| &p.paper_id == paper_id)
            .map(|p| p.title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CiteError;
    use crate::storage::MemoryStore;
    use crate::sync::test_support::StubSource;

    fn setup() -> (Arc<StubSource>, PaperStore) {
        let source = Arc::new(StubSource::default());
        let papers = PaperStore::new(source.clone(), Arc::new(MemoryStore::new()));
        (source, papers)
    }

    #[tokio::test]
    async fn test_add_twice_tracks_once() -> Result<()> {
        let (source, papers) = setup();
        source.set_title("2670073", "Quantum phases of matter on a 256-atom simulator");

        let first = papers.add("2670073").await?;
        let second = papers.add("2670073").await?;

        assert_eq!(first, second);
        let list = papers.list()?;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].title, "Quantum phases of matter on a 256-atom simulator");
        Ok(())
    }

    #[tokio::test]
    async fn test_add_preserves_insertion_order() -> Result<()> {
        let (source, papers) = setup();
        source.set_title("30", "Thirty");
        source.set_title("4", "Four");

        papers.add("30").await?;
        papers.add("4").await?;

        let ids: Vec<String> = papers.list()?.into_iter().map(|p| p.paper_id.to_string()).collect();
        assert_eq!(ids, vec!["30", "4"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_rejects_invalid_id() {
        let (_source, papers) = setup();
        let err = papers.add("12a3").await.unwrap_err();
        assert!(matches!(err, CiteError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_add_aborts_when_title_lookup_fails() -> Result<()> {
        let (source, papers) = setup();
        source.fail("8");

        let err = papers.add("8").await.unwrap_err();
        assert!(matches!(err, CiteError::Api { .. }));

        let err = papers.add("9").await.unwrap_err();
        assert!(matches!(err, CiteError::NotFound(_)));

        assert!(papers.list()?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_is_total_and_idempotent() -> Result<()> {
        let (source, papers) = setup();
        source.set_title("1", "One");
        source.set_title("2", "Two");
        papers.add("1").await?;
        papers.add("2").await?;

        assert!(papers.remove("1")?);
        assert!(!papers.remove("1")?);
        assert!(!papers.remove("999")?);

        let list = papers.list()?;
        assert_eq!(list.len(), 1);
        assert!(list.iter().all(|p| p.paper_id.as_str() != "1"));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_title() -> Result<()> {
        let (source, papers) = setup();
        source.set_title("5", "Five");
        papers.add("5").await?;

        assert_eq!(papers.get(&PaperId::parse("5")?)?.as_deref(), Some("Five"));
        assert_eq!(papers.get(&PaperId::parse("6")?)?, None);
        Ok(())
    }
}
