//! Command surface consumed by the CLI and HTTP front-ends.
//!
//! Authorization and message delivery belong to the front-end; this layer only runs
//! the operations and owns the monitoring job state.

use crate::config::Config;
use crate::error::Result;
use crate::inspire::{InspireClient, LiteratureSource};
use crate::models::{CitationLogEntry, TrackedPaper};
use crate::monitor::{JobStatus, MonitorEvent, MonitorJob, MonitorSettings, StartOutcome, StopOutcome};
use crate::normalize::NormalizationPolicy;
use crate::storage::{JsonFileStore, StateStore};
use crate::tracker::{CheckReport, Tracker};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;

pub struct CitationService {
    tracker: Arc<Tracker>,
    monitor: Mutex<MonitorJob>,
    settings: MonitorSettings,
}

impl CitationService {
    /// Build a service backed by the INSPIRE API and JSON files under `config.data_dir`.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let source = Arc::new(InspireClient::new(&config.inspire)?);
        let store = Arc::new(JsonFileStore::open(&config.data_dir)?);
        Ok(Self::new(source, store, config.policy.clone(), config.monitor.clone()))
    }

    pub fn new(
        source: Arc<dyn LiteratureSource>,
        store: Arc<dyn StateStore>,
        policy: NormalizationPolicy,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            tracker: Arc::new(Tracker::new(source, store, policy)),
            monitor: Mutex::new(MonitorJob::new()),
            settings,
        }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub async fn check_citations(&self, paper_id: &str) -> Result<CheckReport> {
        self.tracker.check(paper_id).await
    }

    pub async fn add_paper(&self, paper_id: &str) -> Result<TrackedPaper> {
        self.tracker.add(paper_id).await
    }

    /// Returns whether the paper was tracked before.
    pub async fn remove_paper(&self, paper_id: &str) -> Result<bool> {
        self.tracker.remove(paper_id).await
    }

    pub fn list_tracked_papers(&self) -> Result<Vec<TrackedPaper>> {
        self.tracker.list()
    }

    pub fn citation_history(&self, paper_id: &str) -> Result<Vec<CitationLogEntry>> {
        self.tracker.history(paper_id)
    }

    /// Start the periodic job; progress is sent to `events`.
    pub async fn start_monitoring(&self, events: UnboundedSender<MonitorEvent>) -> Result<StartOutcome> {
        let mut job = self.monitor.lock().await;
        job.start(self.tracker.clone(), self.settings.clone(), events)
    }

    pub async fn stop_monitoring(&self) -> StopOutcome {
        self.monitor.lock().await.stop()
    }

    pub async fn monitoring_status(&self) -> JobStatus {
        self.monitor.lock().await.status()
    }
}
