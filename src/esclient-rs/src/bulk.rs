//! Bulk writes: split the input into bounded batches, send one `_bulk` request
//! per batch in input order, and stitch the per-item results back together.
//!
//! A failing batch stops the operation. Batches sent before it are not rolled
//! back, so a failed bulk call may have written some of its documents.

use esclient_core::bulk::{encode_create, encode_save, parse_bulk_items, plan_batches, BulkItem};
use esclient_core::request;

use crate::client::ElasticClient;
use crate::{ClientError, Result};

fn invalid_documents(offset: usize, e: serde_json::Error) -> ClientError {
    ClientError::InvalidArgument(format!(
        "batch starting at document {} contains invalid JSON: {}",
        offset, e
    ))
}

fn log_item_failures(index: &str, offset: usize, items: &[BulkItem]) {
    for (pos, item) in items.iter().enumerate().filter(|(_, i)| !i.is_success()) {
        tracing::warn!(
            index,
            position = offset + pos,
            id = %item.id,
            status = item.status,
            error = item.error.as_deref().unwrap_or(""),
            "Bulk item failed"
        );
    }
}

impl ElasticClient {
    /// Index new documents through `_bulk`, letting the server assign ids.
    ///
    /// Returns one id per input document, in input order. Documents are sent
    /// in batches of [`ElasticClient::bulk_batch_size`]; on error, earlier
    /// batches stay written.
    pub async fn bulk_create<S>(&self, index: &str, documents: &[S]) -> Result<Vec<String>>
    where
        S: AsRef<str> + Sync,
    {
        let mut ids = Vec::with_capacity(documents.len());

        for batch in plan_batches(documents, self.config.bulk_batch_size) {
            tracing::debug!(index, offset = batch.offset, size = batch.len(), "Sending bulk create batch");

            let body = encode_create(index, batch.items).map_err(|e| invalid_documents(batch.offset, e))?;
            let response = self.call("bulk response", request::bulk(index, body)).await?;

            let items = parse_bulk_items(&response.body, batch.len())?;
            log_item_failures(index, batch.offset, &items);
            ids.extend(items.into_iter().map(|item| item.id));
        }

        Ok(ids)
    }

    /// Index documents under caller-supplied ids through `_bulk`, overwriting
    /// existing documents. `ids[i]` is used for `documents[i]`.
    ///
    /// Same batching and partial-completion behavior as
    /// [`ElasticClient::bulk_create`].
    pub async fn bulk_save<S, I>(&self, index: &str, documents: &[S], ids: &[I]) -> Result<()>
    where
        S: AsRef<str> + Sync,
        I: AsRef<str> + Sync,
    {
        if documents.len() != ids.len() {
            return Err(ClientError::InvalidArgument(format!(
                "{} documents but {} ids",
                documents.len(),
                ids.len()
            )));
        }

        for batch in plan_batches(documents, self.config.bulk_batch_size) {
            tracing::debug!(index, offset = batch.offset, size = batch.len(), "Sending bulk save batch");

            let batch_ids = &ids[batch.offset..batch.offset + batch.len()];
            let body =
                encode_save(index, batch.items, batch_ids).map_err(|e| invalid_documents(batch.offset, e))?;
            let response = self.call("bulk response", request::bulk(index, body)).await?;

            match parse_bulk_items(&response.body, batch.len()) {
                Ok(items) => log_item_failures(index, batch.offset, &items),
                Err(e) => tracing::warn!(error = %e, "Could not read bulk save items"),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{response, RecordingTransport};
    use crate::transport::HttpRequest;
    use crate::{ClientError, ElasticClient};
    use esclient_core::{ClientConfig, ContentType};
    use serde_json::{json, Value};
    use std::sync::Arc;

    /// Echo one created item per document line pair, ids `gen-<n>` numbered
    /// across the whole call so ordering across batches can be checked.
    fn echo_bulk(request: &HttpRequest, _call: usize, first_id: usize) -> String {
        let lines = request.body.as_ref().unwrap().content.lines().count();
        let items: Vec<Value> = (0..lines / 2)
            .map(|n| json!({"index": {"_id": format!("gen-{}", first_id + n), "status": 201}}))
            .collect();
        json!({"took": 1, "errors": false, "items": items}).to_string()
    }

    fn counting_transport() -> Arc<RecordingTransport> {
        let seen = std::sync::atomic::AtomicUsize::new(0);
        RecordingTransport::with_responder(move |req, call| {
            let lines = req.body.as_ref().unwrap().content.lines().count() / 2;
            let first = seen.fetch_add(lines, std::sync::atomic::Ordering::SeqCst);
            response(200, &echo_bulk(req, call, first))
        })
    }

    fn client_with_batch(transport: &Arc<RecordingTransport>, batch: usize) -> ElasticClient {
        let mut client = ElasticClient::with_transport(ClientConfig::default(), transport.clone());
        client.set_bulk_batch_size(batch).unwrap();
        client
    }

    fn docs(n: usize) -> Vec<String> {
        (0..n).map(|i| format!(r#"{{"n":{}}}"#, i)).collect()
    }

    #[tokio::test]
    async fn test_bulk_create_request_count_and_order() {
        for (len, batch) in [(1, 1), (7, 3), (9, 3), (10, 4), (5, 10_000)] {
            let transport = counting_transport();
            let client = client_with_batch(&transport, batch);

            let ids = client.bulk_create("books", &docs(len)).await.unwrap();

            assert_eq!(transport.requests().len(), len.div_ceil(batch), "len={} batch={}", len, batch);
            let expected: Vec<String> = (0..len).map(|n| format!("gen-{}", n)).collect();
            assert_eq!(ids, expected);
        }
    }

    #[tokio::test]
    async fn test_bulk_create_batches_preserve_document_order() {
        let transport = counting_transport();
        let client = client_with_batch(&transport, 2);

        client.bulk_create("books", &docs(5)).await.unwrap();

        let requests = transport.requests();
        let sizes: Vec<usize> = requests
            .iter()
            .map(|r| r.body.as_ref().unwrap().content.lines().count() / 2)
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);

        let body = &requests[1].body.as_ref().unwrap();
        assert_eq!(body.content_type, ContentType::NdJson);
        assert_eq!(
            body.content,
            "{\"index\":{\"_index\":\"books\"}}\n{\"n\":2}\n{\"index\":{\"_index\":\"books\"}}\n{\"n\":3}\n"
        );
        assert_eq!(requests[0].url, "http://localhost:9200/books/_bulk");
    }

    #[tokio::test]
    async fn test_bulk_create_empty_sends_nothing() {
        let transport = counting_transport();
        let ids = client_with_batch(&transport, 3)
            .bulk_create::<String>("books", &[])
            .await
            .unwrap();

        assert!(ids.is_empty());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_create_stops_at_failing_batch() {
        let transport = RecordingTransport::with_responder(|req, call| {
            if call == 1 {
                response(429, r#"{"error":"too many requests"}"#)
            } else {
                response(200, &echo_bulk(req, call, call * 2))
            }
        });
        let client = client_with_batch(&transport, 2);

        let err = client.bulk_create("books", &docs(6)).await.unwrap_err();

        assert_eq!(err.status(), 429);
        assert_eq!(err.response_body(), Some(r#"{"error":"too many requests"}"#));
        // Third batch never sent
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_bulk_create_short_item_list_is_parse_error() {
        let transport = RecordingTransport::ok(r#"{"items":[{"index":{"_id":"only-one","status":201}}]}"#);
        let client = client_with_batch(&transport, 10);

        let err = client.bulk_create("books", &docs(2)).await.unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));
    }

    #[tokio::test]
    async fn test_bulk_create_keeps_ids_of_failed_items() {
        let body = json!({"errors": true, "items": [
            {"index": {"_id": "a", "status": 201}},
            {"index": {"_id": "b", "status": 400, "error": {"reason": "bad field"}}}
        ]})
        .to_string();
        let transport = RecordingTransport::ok(&body);

        let ids = client_with_batch(&transport, 10)
            .bulk_create("books", &docs(2))
            .await
            .unwrap();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_bulk_create_rejects_invalid_multiline_document() {
        let transport = counting_transport();
        let err = client_with_batch(&transport, 10)
            .bulk_create("books", &["{\n not json"])
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::InvalidArgument(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_save_pairs_ids_across_batches() {
        let transport = counting_transport();
        let client = client_with_batch(&transport, 2);
        let ids = ["a", "b", "c"];

        client.bulk_save("books", &docs(3), &ids).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        let second = &requests[1].body.as_ref().unwrap().content;
        assert_eq!(second, "{\"index\":{\"_index\":\"books\",\"_id\":\"c\"}}\n{\"n\":2}\n");
    }

    #[tokio::test]
    async fn test_bulk_save_length_mismatch() {
        let transport = counting_transport();
        let err = client_with_batch(&transport, 2)
            .bulk_save("books", &docs(3), &["a"])
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::InvalidArgument(_)));
        assert!(transport.requests().is_empty());
    }
}
