use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Field name → declared field type, sorted by field name
pub type Mapping = BTreeMap<String, String>;

/// Aggregation bucket key → document count
pub type TermCounts = BTreeMap<String, u64>;

/// SearchResults holds the parsed outcome of a search or count request
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    /// Total number of matching documents, not the number of hits returned
    pub total: u64,
    /// Highest score; unset for count requests and empty results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
    pub hits: Vec<SearchHit>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// SearchHit is one matched document with its relevance score
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
    #[serde(rename = "source")]
    source_document: serde_json::Value,
    #[serde(skip)]
    source_text: OnceLock<String>,
}

impl SearchHit {
    pub fn new(id: impl Into<String>, score: f64, source_document: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            score,
            source_document,
            source_text: OnceLock::new(),
        }
    }

    /// The stored document as a JSON tree
    pub fn source_document(&self) -> &serde_json::Value {
        &self.source_document
    }

    /// The stored document as compact JSON text, rendered on first use
    pub fn source(&self) -> &str {
        self.source_text
            .get_or_init(|| self.source_document.to_string())
    }

    /// Deserialize the stored document into a caller type
    pub fn deserialize_source<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.source_document.clone())
    }
}

/// Optimistic concurrency token for conditional document writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyToken {
    pub seq_no: u64,
    pub primary_term: u64,
}

impl ConcurrencyToken {
    pub fn new(seq_no: u64, primary_term: u64) -> Self {
        Self {
            seq_no,
            primary_term,
        }
    }
}
