//! Bulk batch planning, NDJSON encoding and per-item result extraction.

use serde_json::Value;
use std::borrow::Cow;
use std::num::NonZeroUsize;

use crate::escape::escape_json;
use crate::response::ParseAnomaly;

/// A consecutive slice of the caller's input, sent as one `_bulk` request
#[derive(Debug, Clone, Copy)]
pub struct BulkBatch<'a, T> {
    /// Position of the first item within the full input
    pub offset: usize,
    pub items: &'a [T],
}

impl<T> BulkBatch<'_, T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Split `items` into batches of at most `batch_size`, in input order.
/// An empty input yields no batches.
pub fn plan_batches<T>(items: &[T], batch_size: NonZeroUsize) -> impl Iterator<Item = BulkBatch<'_, T>> {
    let size = batch_size.get();
    items
        .chunks(size)
        .enumerate()
        .map(move |(n, chunk)| BulkBatch {
            offset: n * size,
            items: chunk,
        })
}

/// Command line for a create: the server assigns the id
pub fn create_command(index: &str) -> String {
    format!(r#"{{"index":{{"_index":"{}"}}}}"#, escape_json(index))
}

/// Command line for a save under a caller-supplied id
pub fn save_command(index: &str, id: &str) -> String {
    format!(
        r#"{{"index":{{"_index":"{}","_id":"{}"}}}}"#,
        escape_json(index),
        escape_json(id)
    )
}

/// NDJSON needs each document on one line; pretty-printed input is compacted
pub fn document_line(document: &str) -> serde_json::Result<Cow<'_, str>> {
    if document.contains(['\n', '\r']) {
        let value: Value = serde_json::from_str(document)?;
        Ok(Cow::Owned(value.to_string()))
    } else {
        Ok(Cow::Borrowed(document))
    }
}

/// Body of a create batch: one command line and one document line per item
pub fn encode_create<S: AsRef<str>>(index: &str, documents: &[S]) -> serde_json::Result<String> {
    let command = create_command(index);
    let mut body = String::with_capacity(documents.len() * 100);

    for doc in documents {
        body.push_str(&command);
        body.push('\n');
        body.push_str(&document_line(doc.as_ref())?);
        body.push('\n');
    }

    Ok(body)
}

/// Body of a save batch; `ids` pairs positionally with `documents`
pub fn encode_save<S: AsRef<str>, I: AsRef<str>>(
    index: &str,
    documents: &[S],
    ids: &[I],
) -> serde_json::Result<String> {
    let mut body = String::with_capacity(documents.len() * 100);

    for (doc, id) in documents.iter().zip(ids) {
        body.push_str(&save_command(index, id.as_ref()));
        body.push('\n');
        body.push_str(&document_line(doc.as_ref())?);
        body.push('\n');
    }

    Ok(body)
}

/// Outcome of one bulk item as echoed by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItem {
    pub id: String,
    pub status: u16,
    pub error: Option<String>,
}

impl BulkItem {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Read the first `expected` items of a `_bulk` response, in echo order.
pub fn parse_bulk_items(body: &str, expected: usize) -> Result<Vec<BulkItem>, ParseAnomaly> {
    let root: Value = serde_json::from_str(body)?;
    let items = root
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| ParseAnomaly::Shape("bulk response without items".to_string()))?;

    if items.len() < expected {
        return Err(ParseAnomaly::Shape(format!(
            "bulk response has {} items, expected {}",
            items.len(),
            expected
        )));
    }

    items.iter().take(expected).map(parse_bulk_item).collect()
}

/// Each item is keyed by its action name (`index`, `create`, ...)
fn parse_bulk_item(item: &Value) -> Result<BulkItem, ParseAnomaly> {
    let result = item
        .as_object()
        .and_then(|obj| obj.values().next())
        .ok_or_else(|| ParseAnomaly::Shape("empty bulk item".to_string()))?;

    let id = result
        .get("_id")
        .and_then(Value::as_str)
        .ok_or_else(|| ParseAnomaly::Shape("bulk item without _id".to_string()))?;

    let status = result
        .get("status")
        .and_then(Value::as_u64)
        .and_then(|s| u16::try_from(s).ok())
        .unwrap_or(0);

    let error = result.get("error").map(|e| match e.get("reason").and_then(Value::as_str) {
        Some(reason) => reason.to_string(),
        None => e.to_string(),
    });

    Ok(BulkItem {
        id: id.to_string(),
        status,
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_plan_batches_boundaries() {
        let items: Vec<u32> = (0..25).collect();
        let batches: Vec<_> = plan_batches(&items, size(10)).collect();

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].offset, 0);
        assert_eq!(batches[1].offset, 10);
        assert_eq!(batches[2].offset, 20);
        assert_eq!(batches[2].len(), 5);
        assert_eq!(batches[2].items, &[20, 21, 22, 23, 24]);
    }

    #[test]
    fn test_plan_batches_counts() {
        for (len, batch, expected) in [(0, 3, 0), (1, 3, 1), (3, 3, 1), (4, 3, 2), (9, 1, 9), (10, 10_000, 1)] {
            let items = vec![0u8; len];
            let count = plan_batches(&items, size(batch)).count();
            assert_eq!(count, expected, "len={} batch={}", len, batch);
            assert_eq!(count, len.div_ceil(batch));
        }
    }

    #[test]
    fn test_encode_create() {
        let body = encode_create("books", &[r#"{"t":1}"#, r#"{"t":2}"#]).unwrap();
        assert_eq!(
            body,
            "{\"index\":{\"_index\":\"books\"}}\n{\"t\":1}\n{\"index\":{\"_index\":\"books\"}}\n{\"t\":2}\n"
        );
    }

    #[test]
    fn test_encode_save_pairs_ids() {
        let body = encode_save("books", &["{}", "{}"], &["a", "b\"c"]).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], r#"{"index":{"_index":"books","_id":"a"}}"#);
        assert_eq!(lines[2], r#"{"index":{"_index":"books","_id":"b\"c"}}"#);
    }

    #[test]
    fn test_multiline_documents_are_compacted() {
        let body = encode_create("books", &["{\n  \"t\": 1\n}"]).unwrap();
        assert_eq!(body.lines().count(), 2);
        assert_eq!(body.lines().nth(1), Some(r#"{"t":1}"#));

        assert!(encode_create("books", &["{\n broken"]).is_err());
    }

    #[test]
    fn test_parse_bulk_items() {
        let body = json!({
            "took": 5,
            "errors": true,
            "items": [
                {"index": {"_index": "books", "_id": "x1", "status": 201, "result": "created"}},
                {"index": {"_index": "books", "_id": "x2", "status": 400,
                           "error": {"type": "mapper_parsing_exception", "reason": "failed to parse"}}}
            ]
        })
        .to_string();

        let items = parse_bulk_items(&body, 2).unwrap();
        assert_eq!(items[0].id, "x1");
        assert!(items[0].is_success());
        assert_eq!(items[1].id, "x2");
        assert!(!items[1].is_success());
        assert_eq!(items[1].error.as_deref(), Some("failed to parse"));
    }

    #[test]
    fn test_parse_bulk_items_too_few() {
        let body = json!({"items": [{"index": {"_id": "x1", "status": 201}}]}).to_string();
        assert!(parse_bulk_items(&body, 2).is_err());
        assert!(parse_bulk_items("{}", 0).is_err());
    }
}
