//! User-facing message text for command replies and monitor reports.

use crate::error::{CiteError, ErrorKind};
use crate::models::{Citation, TrackedPaper};
use crate::monitor::{MonitorEvent, StartOutcome, StopOutcome};
use crate::tracker::CheckReport;
use std::fmt::Write;
use std::time::Duration;

/// Overview of the available commands.
pub fn help_text() -> String {
    [
        "Citation tracker for the INSPIRE-HEP literature database.",
        "",
        "PAPER_ID is the INSPIRE record id: for https://inspirehep.net/literature/2670073 it is 2670073.",
        "",
        "  check PAPER_ID   - Check a paper for new citations now (shares state with the monitor)",
        "  add PAPER_ID     - Add a paper to the monitored list",
        "  remove PAPER_ID  - Remove a paper from the monitored list",
        "  list             - Show the tracked papers with their titles and ids",
        "  history PAPER_ID - Show every citation reported so far for a paper",
        "  monitor          - Check all tracked papers now and then periodically",
        "  serve            - Run the HTTP command server",
        "  guide            - Show this overview",
    ]
    .join("\n")
}

fn write_citations(out: &mut String, citations: &[Citation]) {
    for c in citations {
        let _ = write!(out, "*{}*\n_{}_\n({}: {})\n\n", c.title, c.abstract_text, c.source, c.identifier);
    }
}

/// Reply for an on-demand check.
pub fn check_report(report: &CheckReport) -> String {
    if report.citations.is_empty() {
        return "No new citations found.".to_string();
    }

    let label = report.title.as_deref().unwrap_or(report.paper_id.as_str());
    let mut out = format!("*New \"{}\" citations found:*\n", label);
    write_citations(&mut out, &report.citations);
    out.trim_end().to_string()
}

pub fn tracked_list(papers: &[TrackedPaper]) -> String {
    if papers.is_empty() {
        return "No tracked papers found.".to_string();
    }

    let mut out = String::from("Currently tracking the papers:");
    for p in papers {
        let _ = write!(out, "\n{} (ID: {})", p.title, p.paper_id);
    }
    out
}

pub fn added(paper: &TrackedPaper) -> String {
    format!("Successfully started tracking: {}.", paper.title)
}

pub fn removed(was_tracked: bool) -> String {
    if was_tracked {
        "Successfully stopped tracking the paper.".to_string()
    } else {
        "That paper was not being tracked.".to_string()
    }
}

fn describe_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs >= 3600 && secs % 3600 == 0 {
        format!("{} hours", secs / 3600)
    } else if secs >= 60 && secs % 60 == 0 {
        format!("{} minutes", secs / 60)
    } else {
        format!("{} seconds", secs)
    }
}

pub fn start_outcome(outcome: StartOutcome, interval: Duration) -> String {
    match outcome {
        StartOutcome::Started => format!(
            "Monitoring started. Updates will occur every {}.",
            describe_interval(interval)
        ),
        StartOutcome::AlreadyRunning => "Monitoring is already running.".to_string(),
        StartOutcome::NoTrackedPapers => {
            "Unable to begin monitoring. Please add a paper to track before monitoring.".to_string()
        }
    }
}

pub fn stop_outcome(outcome: StopOutcome) -> String {
    match outcome {
        StopOutcome::Stopped => "Monitoring has been stopped.".to_string(),
        StopOutcome::NotRunning => "The monitor is not currently running.".to_string(),
    }
}

/// One distinct message per error kind.
pub fn error_message(error: &CiteError) -> String {
    match error.kind() {
        ErrorKind::InvalidArgument => {
            "Please provide a valid PAPER_ID (digits only). Example: check 2670073".to_string()
        }
        ErrorKind::NotFound => "No INSPIRE record exists with that PAPER_ID.".to_string(),
        ErrorKind::Upstream => "INSPIRE returned an error; could not check citations. Please try again later.".to_string(),
        ErrorKind::Network => "Could not reach INSPIRE. Please check the connection and try again.".to_string(),
        ErrorKind::Storage => format!("Local citation data could not be read or written: {}", error),
        ErrorKind::Config => format!("Configuration problem: {}", error),
    }
}

/// Text for a monitor progress event.
pub fn monitor_event(event: &MonitorEvent) -> String {
    match event {
        MonitorEvent::SweepStarted { papers } => {
            format!("Monitoring {} paper(s) for citation updates.", papers)
        }
        MonitorEvent::PaperChecked { paper, citations } if citations.is_empty() => {
            format!("No new citations found for {}.", paper.title)
        }
        MonitorEvent::PaperChecked { paper, citations } => {
            let mut out = format!("*New \"{}\" citations found:*\n\n", paper.title);
            write_citations(&mut out, citations);
            out.trim_end().to_string()
        }
        MonitorEvent::PaperFailed { paper, kind, .. } => {
            let reason = match kind {
                ErrorKind::Network => "INSPIRE could not be reached",
                ErrorKind::Upstream => "INSPIRE returned an error",
                ErrorKind::NotFound => "the record no longer exists on INSPIRE",
                ErrorKind::Storage => "local citation data could not be read or written",
                ErrorKind::InvalidArgument | ErrorKind::Config => "the request was invalid",
            };
            format!(
                "Could not check citations for {} (ID: {}): {}.",
                paper.title, paper.paper_id, reason
            )
        }
        MonitorEvent::SweepFinished { checked, failed } => {
            format!("Checked {} paper(s), {} failed.", checked, failed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaperId;

    fn paper(id: &str, title: &str) -> TrackedPaper {
        TrackedPaper {
            paper_id: PaperId::parse(id).expect("valid id"),
            title: title.to_string(),
        }
    }

    #[test]
    fn test_check_report_formatting() {
        let mut report = CheckReport {
            paper_id: PaperId::parse("100").expect("valid id"),
            title: Some("Tracked".to_string()),
            citations: vec![],
        };
        assert_eq!(check_report(&report), "No new citations found.");

        report.citations.push(Citation {
            title: "A".to_string(),
            abstract_text: "Abs".to_string(),
            source: "arXiv".to_string(),
            identifier: "2401.1".to_string(),
        });
        assert_eq!(check_report(&report), "*New \"Tracked\" citations found:*\n*A*\n_Abs_\n(arXiv: 2401.1)");

        report.title = None;
        assert!(check_report(&report).starts_with("*New \"100\""));
    }

    #[test]
    fn test_error_messages_are_distinct() {
        let errors = [
            CiteError::InvalidArgument("x".into()),
            CiteError::NotFound("x".into()),
            CiteError::Api {
                code: 500,
                message: "x".into(),
            },
            CiteError::storage("/tmp/x", "x"),
            CiteError::Config("x".into()),
        ];
        let messages: std::collections::HashSet<String> = errors.iter().map(error_message).collect();
        assert_eq!(messages.len(), errors.len());
    }

    #[test]
    fn test_paper_failed_names_the_cause() {
        let failed = |kind| MonitorEvent::PaperFailed {
            paper: paper("7", "Seven"),
            kind,
            error: "boom".to_string(),
        };

        let network = monitor_event(&failed(ErrorKind::Network));
        let upstream = monitor_event(&failed(ErrorKind::Upstream));
        let storage = monitor_event(&failed(ErrorKind::Storage));

        assert!(network.starts_with("Could not check citations for Seven (ID: 7):"));
        assert!(network.contains("could not be reached"));
        assert!(upstream.contains("returned an error"));
        assert!(storage.contains("local citation data"));
    }

    #[test]
    fn test_start_outcome_interval() {
        assert_eq!(
            start_outcome(StartOutcome::Started, Duration::from_secs(24 * 3600)),
            "Monitoring started. Updates will occur every 24 hours."
        );
        assert!(start_outcome(StartOutcome::Started, Duration::from_secs(90)).ends_with("every 90 seconds."));
        assert_eq!(start_outcome(StartOutcome::AlreadyRunning, Duration::ZERO), "Monitoring is already running.");
    }

    #[test]
    fn test_tracked_list() {
        assert_eq!(tracked_list(&[]), "No tracked papers found.");
        assert_eq!(
            tracked_list(&[paper("1", "One"), paper("2", "Two")]),
            "Currently tracking the papers:\nOne (ID: 1)\nTwo (ID: 2)"
        );
    }
}
