//! Core data types: paper identifiers, tracked papers and citations.

use crate::error::{CiteError, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static PAPER_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("paper id pattern is valid"));

/// INSPIRE record id (`recid`). Always a non-empty string of ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PaperId(String);

impl PaperId {
    /// Validate and wrap a raw identifier. Whitespace is not stripped here.
    pub fn parse(raw: &str) -> Result<Self> {
        if !PAPER_ID_RE.is_match(raw) {
            return Err(CiteError::InvalidArgument(format!(
                "paper id must be numeric, got {:?}",
                raw
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PaperId {
    type Err = CiteError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PaperId {
    type Error = CiteError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PaperId> for String {
    fn from(id: PaperId) -> Self {
        id.0
    }
}

/// A paper being monitored for new citing works.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedPaper {
    #[serde(rename = "paperId")]
    pub paper_id: PaperId,
    pub title: String,
}

/// A normalized record describing a work that cites a tracked paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub source: String,
    pub identifier: String,
}

/// One line of a paper's append-only citation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationLogEntry {
    pub checked_at: DateTime<Utc>,
    pub paper_id: PaperId,
    pub citations: Vec<Citation>,
}
