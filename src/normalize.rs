//! Raw INSPIRE record -> [`Citation`] normalization.
//!
//! INSPIRE aggregates records from several feeders and the same work often carries
//! multiple titles and abstracts. The preferred feeders and the external identifier
//! system are kept in [`NormalizationPolicy`] so they can be tuned without code changes
//! when the upstream data drifts.

use crate::inspire::RawRecord;
use crate::models::Citation;
use serde::{Deserialize, Serialize};

/// Placeholder for missing title/abstract/identifier.
pub const NOT_AVAILABLE: &str = "N/A";

/// Placeholder for a missing source tag.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Policy for choosing among the many title/abstract/identifier entries of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationPolicy {
    /// Feeder sources whose title/abstract entries win over the rest
    pub preferred_sources: Vec<String>,
    /// `url_name` of the external system whose link supplies the identifier
    pub identifier_system: String,
}

impl Default for NormalizationPolicy {
    fn default() -> Self {
        Self {
            preferred_sources: vec!["arXiv".to_string(), "IOP".to_string(), "APS".to_string()],
            identifier_system: "ADS Abstract Service".to_string(),
        }
    }
}

/// Missing and empty strings both fall back to the placeholder.
fn non_empty(value: Option<&String>, fallback: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

impl NormalizationPolicy {
    fn is_preferred(&self, source: Option<&str>) -> bool {
        source
            .map(|s| self.preferred_sources.iter().any(|p| p == s))
            .unwrap_or(false)
    }

    /// Pick the first entry from a preferred source, else the first entry.
    fn pick<'a, T>(&self, entries: &'a [T], source_of: impl Fn(&T) -> Option<&str>) -> Option<&'a T> {
        entries
            .iter()
            .find(|e| self.is_preferred(source_of(e)))
            .or_else(|| entries.first())
    }

    /// Normalize one raw search hit.
    pub fn normalize(&self, record: &RawRecord) -> Citation {
        let metadata = &record.metadata;

        let title_entry = self.pick(&metadata.titles, |t| t.source.as_deref());
        let title = non_empty(title_entry.and_then(|t| t.title.as_ref()), NOT_AVAILABLE);
        let source = non_empty(title_entry.and_then(|t| t.source.as_ref()), UNKNOWN_SOURCE);

        let abstract_entry = self.pick(&metadata.abstracts, |a| a.source.as_deref());
        let abstract_text = non_empty(abstract_entry.and_then(|a| a.value.as_ref()), NOT_AVAILABLE);

        Citation {
            title,
            abstract_text,
            source,
            identifier: self.identifier(record),
        }
    }

    fn identifier(&self, record: &RawRecord) -> String {
        let metadata = &record.metadata;

        let from_system = metadata
            .external_system_identifiers
            .iter()
            .find(|id| id.url_name.as_deref() == Some(self.identifier_system.as_str()))
            .map(|id| {
                let link = id.url_link.as_deref().unwrap_or_default();
                // bibcode/arXiv id is whatever follows the last colon of the link
                link.rsplit(':').next().unwrap_or(link).to_string()
            });

        from_system.unwrap_or_else(|| {
            non_empty(metadata.dois.first().and_then(|d| d.value.as_ref()), NOT_AVAILABLE)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspire::{RawAbstract, RawDoi, RawExternalId, RawMetadata, RawTitle};

    fn title(t: &str, source: Option<&str>) -> RawTitle {
        RawTitle {
            title: Some(t.to_string()),
            source: source.map(str::to_string),
        }
    }

    fn record(metadata: RawMetadata) -> RawRecord {
        RawRecord { metadata }
    }

    #[test]
    fn test_preferred_source_wins() {
        let rec = record(RawMetadata {
            titles: vec![title("Crossref title", Some("Crossref")), title("arXiv title", Some("arXiv"))],
            abstracts: vec![
                RawAbstract {
                    value: Some("Elsevier abstract".to_string()),
                    source: Some("Elsevier".to_string()),
                },
                RawAbstract {
                    value: Some("APS abstract".to_string()),
                    source: Some("APS".to_string()),
                },
            ],
            ..Default::default()
        });

        let c = NormalizationPolicy::default().normalize(&rec);
        assert_eq!(c.title, "arXiv title");
        assert_eq!(c.source, "arXiv");
        assert_eq!(c.abstract_text, "APS abstract");
    }

    #[test]
    fn test_falls_back_to_first_entry() {
        let rec = record(RawMetadata {
            titles: vec![title("First", None), title("Second", Some("Crossref"))],
            ..Default::default()
        });

        let c = NormalizationPolicy::default().normalize(&rec);
        assert_eq!(c.title, "First");
        assert_eq!(c.source, UNKNOWN_SOURCE);
        assert_eq!(c.abstract_text, NOT_AVAILABLE);
        assert_eq!(c.identifier, NOT_AVAILABLE);
    }

    #[test]
    fn test_empty_record_defaults() {
        let c = NormalizationPolicy::default().normalize(&RawRecord::default());
        assert_eq!(c.title, NOT_AVAILABLE);
        assert_eq!(c.abstract_text, NOT_AVAILABLE);
        assert_eq!(c.source, UNKNOWN_SOURCE);
        assert_eq!(c.identifier, NOT_AVAILABLE);
    }

    #[test]
    fn test_empty_strings_use_placeholders() {
        let rec = record(RawMetadata {
            titles: vec![title("", Some(""))],
            abstracts: vec![RawAbstract {
                value: Some(String::new()),
                source: Some("arXiv".to_string()),
            }],
            dois: vec![RawDoi {
                value: Some(String::new()),
            }],
            ..Default::default()
        });

        let c = NormalizationPolicy::default().normalize(&rec);
        assert_eq!(c.title, NOT_AVAILABLE);
        assert_eq!(c.source, UNKNOWN_SOURCE);
        assert_eq!(c.abstract_text, NOT_AVAILABLE);
        assert_eq!(c.identifier, NOT_AVAILABLE);
    }

    #[test]
    fn test_identifier_prefers_external_system() {
        let rec = record(RawMetadata {
            external_system_identifiers: vec![
                RawExternalId {
                    url_name: Some("KEKSCAN".to_string()),
                    url_link: Some("https://example.org/kek:999".to_string()),
                },
                RawExternalId {
                    url_name: Some("ADS Abstract Service".to_string()),
                    url_link: Some("https://ui.adsabs.harvard.edu/abs/arXiv:2401.01234".to_string()),
                },
            ],
            dois: vec![RawDoi {
                value: Some("10.1103/PhysRevLett.1".to_string()),
            }],
            ..Default::default()
        });

        let c = NormalizationPolicy::default().normalize(&rec);
        assert_eq!(c.identifier, "2401.01234");
    }

    #[test]
    fn test_identifier_falls_back_to_doi() {
        let rec = record(RawMetadata {
            dois: vec![
                RawDoi {
                    value: Some("10.1103/PhysRevLett.1".to_string()),
                },
                RawDoi {
                    value: Some("10.1088/other".to_string()),
                },
            ],
            ..Default::default()
        });

        let c = NormalizationPolicy::default().normalize(&rec);
        assert_eq!(c.identifier, "10.1103/PhysRevLett.1");
    }

    #[test]
    fn test_custom_policy() {
        let policy = NormalizationPolicy {
            preferred_sources: vec!["Crossref".to_string()],
            identifier_system: "KEKSCAN".to_string(),
        };
        let rec = record(RawMetadata {
            titles: vec![title("arXiv title", Some("arXiv")), title("Crossref title", Some("Crossref"))],
            external_system_identifiers: vec![RawExternalId {
                url_name: Some("KEKSCAN".to_string()),
                url_link: Some("kek:scan:42".to_string()),
            }],
            ..Default::default()
        });

        let c = policy.normalize(&rec);
        assert_eq!(c.title, "Crossref title");
        assert_eq!(c.identifier, "42");
    }
}
