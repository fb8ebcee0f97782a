//! INSPIRE-HEP API client.
//!
//! Two endpoints are used:
//! - `GET /literature?q=refersto:recid:N` - most recent works citing record N
//! - `GET /literature/N` - a single record, for its display title
//!
//! Both are requested with the UI-flavored JSON representation, whose `metadata`
//! object carries `titles[]`, `abstracts[]`, `external_system_identifiers[]` and `dois[]`.

use crate::error::{CiteError, OptionExt, Result};
use crate::models::PaperId;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// INSPIRE API base URL
pub const DEFAULT_API_BASE: &str = "https://inspirehep.net/api/";

/// Media type of the record representation the UI uses
const RECORD_UI_JSON: &str = "application/vnd+inspire.record.ui+json";

/// Most recent citing works fetched per synchronization
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Title used when a record has none
pub const UNTITLED: &str = "Untitled";

const USER_AGENT: &str = concat!("rustcitewatch/", env!("CARGO_PKG_VERSION"));

/// Source of citing records for a paper.
///
/// Implemented by [`InspireClient`]; tests substitute in-memory stubs.
#[async_trait]
pub trait LiteratureSource: Send + Sync {
    /// Most recent records citing `paper_id`. Zero matches is `Ok(vec![])`.
    async fn search_citing_records(&self, paper_id: &PaperId) -> Result<Vec<RawRecord>>;

    /// Primary title of record `paper_id`, or [`UNTITLED`] when it has none.
    async fn fetch_record_title(&self, paper_id: &PaperId) -> Result<String>;
}

// === INSPIRE API Response Types ===

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<RawRecord>,
}

#[derive(Debug, Deserialize)]
struct RecordResponse {
    #[serde(default)]
    metadata: Option<RawMetadata>,
}

/// A single search hit as returned by INSPIRE.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub metadata: RawMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMetadata {
    #[serde(default)]
    pub titles: Vec<RawTitle>,
    #[serde(default)]
    pub abstracts: Vec<RawAbstract>,
    #[serde(default)]
    pub external_system_identifiers: Vec<RawExternalId>,
    #[serde(default)]
    pub dois: Vec<RawDoi>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTitle {
    pub title: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAbstract {
    pub value: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawExternalId {
    pub url_name: Option<String>,
    pub url_link: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDoi {
    pub value: Option<String>,
}

/// Client options
#[derive(Debug, Clone)]
pub struct InspireOptions {
    /// API root, e.g. `https://inspirehep.net/api/`
    pub base_url: String,
    /// Records per search request
    pub page_size: usize,
    /// Per-request timeout
    pub timeout: Duration,
    /// Honor `HTTP(S)_PROXY` environment variables
    pub use_system_proxy: bool,
}

impl Default for InspireOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(30),
            use_system_proxy: true,
        }
    }
}

/// INSPIRE-HEP literature client
pub struct InspireClient {
    client: Client,
    base_url: Url,
    page_size: usize,
}

impl InspireClient {
    /// Create a new InspireClient
    pub fn new(options: &InspireOptions) -> Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT).timeout(options.timeout);
        if !options.use_system_proxy {
            builder = builder.no_proxy();
        }

        let client = builder
            .build()
            .map_err(|e| CiteError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: parse_base_url(&options.base_url)?,
            page_size: options.page_size,
        })
    }

    fn literature_url(&self, paper_id: Option<&PaperId>) -> Result<Url> {
        let path = match paper_id {
            Some(id) => format!("literature/{}", id),
            None => "literature".to_string(),
        };
        self.base_url
            .join(&path)
            .map_err(|e| CiteError::Config(format!("Invalid INSPIRE URL: {}", e)))
    }

    /// Build the citing-records search URL
    fn search_url(&self, paper_id: &PaperId) -> Result<Url> {
        let mut url = self.literature_url(None)?;
        url.query_pairs_mut()
            .append_pair("sort", "mostrecent")
            .append_pair("size", &self.page_size.to_string())
            .append_pair("page", "1")
            .append_pair("q", &format!("refersto:recid:{}", paper_id));
        Ok(url)
    }

    async fn get_body(&self, url: Url, paper_id: &PaperId) -> Result<String> {
        debug!(url = %url, paper_id = %paper_id, "Querying INSPIRE");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, RECORD_UI_JSON)
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(CiteError::NotFound(format!("INSPIRE record {}", paper_id)));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(paper_id = %paper_id, status = status.as_u16(), "INSPIRE API error");
            return Err(CiteError::Api {
                code: status.as_u16(),
                message: format!("INSPIRE API error: {} - {}", status, error_text),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl LiteratureSource for InspireClient {
    async fn search_citing_records(&self, paper_id: &PaperId) -> Result<Vec<RawRecord>> {
        let url = self.search_url(paper_id)?;
        let body = self.get_body(url, paper_id).await?;
        let records = parse_search_response(&body)?;

        info!(paper_id = %paper_id, count = records.len(), "Fetched citing records");
        Ok(records)
    }

    async fn fetch_record_title(&self, paper_id: &PaperId) -> Result<String> {
        let url = self.literature_url(Some(paper_id))?;
        let body = self.get_body(url, paper_id).await?;
        parse_record_title(&body)
    }
}

/// Validate the API root and make sure relative joins keep its last path segment.
fn parse_base_url(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized).map_err(|e| CiteError::Config(format!("Invalid base URL {:?}: {}", raw, e)))
}

fn parse_search_response(json_str: &str) -> Result<Vec<RawRecord>> {
    let response: SearchResponse = serde_json::from_str(json_str)
        .map_err(|e| CiteError::Parse(format!("Failed to parse INSPIRE search response: {}", e)))?;
    Ok(response.hits.hits)
}

fn parse_record_title(json_str: &str) -> Result<String> {
    let response: RecordResponse = serde_json::from_str(json_str)
        .map_err(|e| CiteError::Parse(format!("Failed to parse INSPIRE record: {}", e)))?;
    let metadata = response.metadata.ok_or_parse("INSPIRE record has no metadata")?;

    Ok(metadata
        .titles
        .into_iter()
        .next()
        .and_then(|t| t.title)
        .unwrap_or_else(|| UNTITLED.to_string()))
}
