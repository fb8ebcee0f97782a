//! Periodic monitoring of all tracked papers.
//!
//! The job state is an explicit value owned by whoever schedules the work. A running job
//! holds a [`CancellationToken`]; cancelling it stops the job before its next firing
//! but lets a sweep that already started finish.

use crate::error::{CiteError, ErrorKind};
use crate::models::{Citation, TrackedPaper};
use crate::tracker::Tracker;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Timing of the periodic job.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Time between sweeps
    pub interval: Duration,
    /// Pause between two papers within a sweep, to stay under upstream rate limits
    pub paper_delay: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 60 * 60),
            paper_delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
    NoTrackedPapers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

/// Progress reported by a sweep.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MonitorEvent {
    SweepStarted {
        papers: usize,
    },
    PaperChecked {
        paper: TrackedPaper,
        citations: Vec<Citation>,
    },
    PaperFailed {
        paper: TrackedPaper,
        #[serde(skip)]
        kind: ErrorKind,
        error: String,
    },
    SweepFinished {
        checked: usize,
        failed: usize,
    },
}

#[derive(Debug, Default)]
enum JobState {
    #[default]
    Idle,
    Running {
        cancel: CancellationToken,
    },
}

/// The periodic monitoring job.
#[derive(Debug, Default)]
pub struct MonitorJob {
    state: JobState,
}

impl MonitorJob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> JobStatus {
        match self.state {
            JobState::Idle => JobStatus::Idle,
            JobState::Running { .. } => JobStatus::Running,
        }
    }

    /// Start sweeping immediately and then every `settings.interval`.
    ///
    /// A zero interval is rejected with [`CiteError::Config`].
    pub fn start(
        &mut self,
        tracker: Arc<Tracker>,
        settings: MonitorSettings,
        events: UnboundedSender<MonitorEvent>,
    ) -> crate::Result<StartOutcome> {
        if matches!(self.state, JobState::Running { .. }) {
            return Ok(StartOutcome::AlreadyRunning);
        }

        if settings.interval.is_zero() {
            return Err(CiteError::Config("monitor interval must be positive".to_string()));
        }

        if tracker.list()?.is_empty() {
            return Ok(StartOutcome::NoTrackedPapers);
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(settings.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                sweep(&tracker, settings.paper_delay, &events).await;
            }

            info!("Monitoring loop exited");
        });

        self.state = JobState::Running { cancel };
        info!(interval_secs = settings.interval.as_secs(), "Monitoring started");
        Ok(StartOutcome::Started)
    }

    pub fn stop(&mut self) -> StopOutcome {
        match std::mem::take(&mut self.state) {
            JobState::Running { cancel } => {
                cancel.cancel();
                info!("Monitoring stopped");
                StopOutcome::Stopped
            }
            JobState::Idle => StopOutcome::NotRunning,
        }
    }
}

impl Drop for MonitorJob {
    fn drop(&mut self) {
        if let JobState::Running { cancel } = &self.state {
            cancel.cancel();
        }
    }
}

fn emit(events: &UnboundedSender<MonitorEvent>, event: MonitorEvent) {
    if events.send(event).is_err() {
        debug!("Monitor event receiver dropped");
    }
}

/// Check every tracked paper once, one after another.
///
/// A failing paper is reported and skipped; it never aborts the sweep.
pub async fn sweep(tracker: &Tracker, paper_delay: Duration, events: &UnboundedSender<MonitorEvent>) {
    let papers = match tracker.list() {
        Ok(papers) => papers,
        Err(e) => {
            error!(error = %e, "Could not load tracked papers");
            return;
        }
    };

    info!(papers = papers.len(), "Starting citation sweep");
    emit(events, MonitorEvent::SweepStarted { papers: papers.len() });

    let mut failed = 0;
    for (idx, paper) in papers.iter().enumerate() {
        if idx > 0 && !paper_delay.is_zero() {
            tokio::time::sleep(paper_delay).await;
        }

        match tracker.check(paper.paper_id.as_str()).await {
            Ok(report) => emit(
                events,
                MonitorEvent::PaperChecked {
                    paper: paper.clone(),
                    citations: report.citations,
                },
            ),
            Err(e) => {
                warn!(paper_id = %paper.paper_id, error = %e, "Citation check failed");
                failed += 1;
                emit(
                    events,
                    MonitorEvent::PaperFailed {
                        paper: paper.clone(),
                        kind: e.kind(),
                        error: e.to_string(),
                    },
                );
            }
        }
    }

    info!(checked = papers.len(), failed, "Citation sweep finished");
    emit(
        events,
        MonitorEvent::SweepFinished {
            checked: papers.len(),
            failed,
        },
    );
}
