//! # rustcitewatch
//!
//! INSPIRE-HEP citation monitor: tracks papers and reports newly citing works.
//!
//! ## Modules
//!
//! - [`inspire`] - INSPIRE-HEP API client
//! - [`normalize`] - Raw record to citation normalization policy
//! - [`sync`] - Citation diffing against already reported titles
//! - [`papers`] - Tracked-paper store
//! - [`storage`] - Persistence port with JSON-file and in-memory backends
//! - [`monitor`] - Cancellable periodic sweep over tracked papers
//! - [`service`] - Command surface used by the CLI and HTTP server
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rustcitewatch::{config::Config, service::CitationService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = CitationService::from_config(&Config::default())?;
//!     let report = service.check_citations("2670073").await?;
//!     println!("Found {} new citations", report.citations.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod inspire;
pub mod messages;
pub mod models;
pub mod monitor;
pub mod normalize;
pub mod papers;
pub mod service;
pub mod storage;
pub mod sync;
pub mod tracker;

pub use error::{CiteError, ErrorKind, Result};
