//! Response parsing: decodes response bodies into the result model.
//!
//! Search responses come in three shapes: the current one where `hits.total`
//! is an object with a `value`, the older one where `hits.total` is a plain
//! integer, and the count-only shape with a top-level `count`. Each shape has
//! its own matcher and the matchers are tried in order.

use serde_json::Value;
use thiserror::Error;

use crate::models::{Mapping, SearchHit, SearchResults, TermCounts};
use crate::request::AGGREGATION_NAME;

/// A response body that did not match any recognized shape
#[derive(Debug, Error)]
pub enum ParseAnomaly {
    #[error("response body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected response shape: {0}")]
    Shape(String),
}

impl ParseAnomaly {
    fn shape(msg: impl Into<String>) -> Self {
        ParseAnomaly::Shape(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ParseAnomaly>;

/// Reads a total from the `hits` object, `None` when the shape doesn't match
type TotalMatcher = fn(&Value) -> Option<u64>;

/// Tried in order; the first match wins
const TOTAL_MATCHERS: &[(&str, TotalMatcher)] = &[
    ("hits.total.value", total_as_object),
    ("hits.total", total_as_integer),
];

fn total_as_object(hits: &Value) -> Option<u64> {
    hits.get("total")?.get("value")?.as_u64()
}

fn total_as_integer(hits: &Value) -> Option<u64> {
    hits.get("total")?.as_u64()
}

fn count_only(root: &Value) -> Option<u64> {
    root.get("count")?.as_u64()
}

fn parse_object(body: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(body)?;
    if !value.is_object() {
        return Err(ParseAnomaly::shape("expected a JSON object"));
    }
    Ok(value)
}

/// Parse a search or count response, failing on any unrecognized shape.
///
/// Hits are only read when the total is positive and hits were requested
/// (`max_hits` of `None` means the server default). At most `max_hits` hits
/// are kept.
pub fn try_parse_search_response(body: &str, max_hits: Option<u32>) -> Result<SearchResults> {
    let root = parse_object(body)?;
    let mut results = SearchResults::default();

    let Some(hits) = root.get("hits") else {
        results.total =
            count_only(&root).ok_or_else(|| ParseAnomaly::shape("neither hits nor count present"))?;
        return Ok(results);
    };

    results.total = TOTAL_MATCHERS
        .iter()
        .find_map(|(name, matcher)| {
            let total = matcher(hits)?;
            tracing::trace!(shape = *name, total, "Matched total shape");
            Some(total)
        })
        .ok_or_else(|| ParseAnomaly::shape("hits.total is neither an object nor an integer"))?;

    let wants_hits = max_hits.map_or(true, |n| n > 0);
    if results.total == 0 || !wants_hits {
        return Ok(results);
    }

    results.max_score = hits.get("max_score").and_then(Value::as_f64);

    let entries = hits
        .get("hits")
        .and_then(Value::as_array)
        .ok_or_else(|| ParseAnomaly::shape("hits.hits is not an array"))?;

    let limit = max_hits.map_or(usize::MAX, |n| n as usize);
    results.hits = entries
        .iter()
        .take(limit)
        .map(parse_hit)
        .collect::<Result<Vec<_>>>()?;

    Ok(results)
}

/// Lenient form of [`try_parse_search_response`]: anomalies are logged and an
/// empty result (total 0, no hits) is returned instead.
pub fn parse_search_response(body: &str, max_hits: Option<u32>) -> SearchResults {
    match try_parse_search_response(body, max_hits) {
        Ok(results) => results,
        Err(e) => {
            tracing::warn!(error = %e, "Error parsing search results");
            SearchResults::default()
        }
    }
}

fn parse_hit(entry: &Value) -> Result<SearchHit> {
    let id = entry
        .get("_id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ParseAnomaly::shape("hit without _id"))?;

    // Sorted searches report a null score
    let score = entry.get("_score").and_then(Value::as_f64).unwrap_or(0.0);
    let source = entry.get("_source").cloned().unwrap_or(Value::Null);

    Ok(SearchHit::new(id, score, source))
}

/// Index names from a `_cat/indices?format=json` response
pub fn parse_index_names(body: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(body)?;
    let entries = value
        .as_array()
        .ok_or_else(|| ParseAnomaly::shape("expected an array of indices"))?;

    entries
        .iter()
        .map(|entry| {
            entry
                .get("index")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ParseAnomaly::shape("index entry without a name"))
        })
        .collect()
}

/// Field types from a `GET {index}/` response.
///
/// Fields that declare sub-`properties` but no `type` are reported as
/// `object`. When `index` is an alias the response is keyed by the concrete
/// index name, so a single-entry response is accepted under any key.
pub fn parse_mapping(body: &str, index: &str) -> Result<Mapping> {
    let root = parse_object(body)?;
    let index_obj = root
        .get(index)
        .or_else(|| match root.as_object() {
            Some(map) if map.len() == 1 => map.values().next(),
            _ => None,
        })
        .ok_or_else(|| ParseAnomaly::shape(format!("no entry for index {}", index)))?;

    let mappings = index_obj
        .get("mappings")
        .ok_or_else(|| ParseAnomaly::shape("index entry without mappings"))?;

    let Some(properties) = mappings.get("properties") else {
        // Index with no fields yet
        return Ok(Mapping::new());
    };

    let properties = properties
        .as_object()
        .ok_or_else(|| ParseAnomaly::shape("mappings.properties is not an object"))?;

    let mut mapping = Mapping::new();
    for (field, decl) in properties {
        let field_type = match decl.get("type").and_then(Value::as_str) {
            Some(t) => t.to_string(),
            None if decl.get("properties").is_some() => "object".to_string(),
            None => {
                return Err(ParseAnomaly::shape(format!("field {} has no type", field)));
            }
        };
        mapping.insert(field.clone(), field_type);
    }

    Ok(mapping)
}

/// Bucket counts from a terms aggregation response
pub fn parse_term_buckets(body: &str) -> Result<TermCounts> {
    let root = parse_object(body)?;

    let buckets = root
        .get("aggregations")
        .and_then(|a| a.get(AGGREGATION_NAME))
        .and_then(|a| a.get("buckets"))
        .and_then(Value::as_array)
        .ok_or_else(|| ParseAnomaly::shape("aggregations.keyagg.buckets is not an array"))?;

    let mut counts = TermCounts::new();
    for bucket in buckets {
        let key = bucket_key(bucket).ok_or_else(|| ParseAnomaly::shape("bucket without key"))?;
        let count = bucket
            .get("doc_count")
            .and_then(Value::as_u64)
            .ok_or_else(|| ParseAnomaly::shape("bucket without doc_count"))?;
        counts.insert(key, count);
    }

    Ok(counts)
}

/// Numeric and date keys come with a `key_as_string` rendering
fn bucket_key(bucket: &Value) -> Option<String> {
    if let Some(key) = bucket.get("key_as_string").and_then(Value::as_str) {
        return Some(key.to_string());
    }

    match bucket.get("key")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// The `_id` echoed by a single-document write
pub fn parse_document_id(body: &str) -> Result<String> {
    let root = parse_object(body)?;
    root.get("_id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ParseAnomaly::shape("write response without _id"))
}

/// `deleted` from a delete-by-query response, when readable
pub fn parse_deleted_count(body: &str) -> Option<u64> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("deleted")?
        .as_u64()
}
