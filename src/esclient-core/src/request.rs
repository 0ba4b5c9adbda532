//! Request builders: one function per endpoint, each producing a method, a path
//! relative to the base URL, and an optional body.

use crate::escape::escape_json;
use crate::models::ConcurrencyToken;

/// Name of the terms aggregation issued by [`term_aggregate`]
pub const AGGREGATION_NAME: &str = "keyagg";

const KEYWORD_SUFFIX: &str = ".keyword";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    NdJson,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::NdJson => "application/x-ndjson",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub content: String,
    pub content_type: ContentType,
}

impl Body {
    pub fn json(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: ContentType::Json,
        }
    }

    pub fn ndjson(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: ContentType::NdJson,
        }
    }
}

/// A request ready to be resolved against a base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub body: Option<Body>,
}

impl RequestSpec {
    fn new(method: Method, path: String) -> Self {
        Self {
            method,
            path,
            body: None,
        }
    }

    fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// `base_url` is expected to end with `/`
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url, self.path)
    }

    pub fn body_text(&self) -> Option<&str> {
        self.body.as_ref().map(|b| b.content.as_str())
    }
}

pub fn list_indices() -> RequestSpec {
    RequestSpec::new(Method::Get, "_cat/indices?format=json".to_string())
}

pub fn get_mapping(index: &str) -> RequestSpec {
    RequestSpec::new(Method::Get, format!("{}/", index))
}

pub fn get_doc(index: &str, id: &str) -> RequestSpec {
    RequestSpec::new(Method::Get, format!("{}/_doc/{}", index, id))
}

/// PUT to `{index}/_doc/{id}` when an id is given, otherwise POST to let the
/// server assign one. The concurrency token only applies to the PUT form.
pub fn save_doc(
    index: &str,
    id: Option<&str>,
    document: &str,
    token: Option<ConcurrencyToken>,
) -> RequestSpec {
    let spec = match id {
        Some(id) => {
            let mut path = format!("{}/_doc/{}", index, id);
            if let Some(token) = token {
                path.push_str(&format!(
                    "?if_seq_no={}&if_primary_term={}",
                    token.seq_no, token.primary_term
                ));
            }
            RequestSpec::new(Method::Put, path)
        }
        None => RequestSpec::new(Method::Post, format!("{}/_doc/", index)),
    };

    spec.with_body(Body::json(document))
}

pub fn bulk(index: &str, ndjson: String) -> RequestSpec {
    RequestSpec::new(Method::Post, format!("{}/_bulk", index)).with_body(Body::ndjson(ndjson))
}

pub fn delete_doc(index: &str, id: &str) -> RequestSpec {
    RequestSpec::new(Method::Delete, format!("{}/_doc/{}", index, id))
}

pub fn delete_all(index: &str) -> RequestSpec {
    RequestSpec::new(
        Method::Post,
        format!("{}/_delete_by_query?conflicts=proceed", index),
    )
    .with_body(Body::json(r#"{"query":{"match_all":{}}}"#))
}

/// A `max_hits` of zero is a count request and goes to `_count`
fn search_path(index: &str, max_hits: Option<u32>) -> String {
    if max_hits == Some(0) {
        format!("{}/_count", index)
    } else {
        format!("{}/_search", index)
    }
}

/// Wrap a query clause, adding `size` only for positive hit limits
fn query_body(clause: &str, max_hits: Option<u32>) -> String {
    match max_hits {
        Some(n) if n > 0 => format!(r#"{{"size":{},"query":{}}}"#, n, clause),
        _ => format!(r#"{{"query":{}}}"#, clause),
    }
}

/// Body for requests without a query clause
fn size_only_body(max_hits: Option<u32>) -> Option<Body> {
    match max_hits {
        Some(n) if n > 0 => Some(Body::json(format!(r#"{{"size":{}}}"#, n))),
        _ => None,
    }
}

/// Match query on one field. Without a field every document matches; without a
/// value the match is against JSON `null`.
pub fn match_query(
    index: &str,
    field: Option<&str>,
    value: Option<&str>,
    max_hits: Option<u32>,
) -> RequestSpec {
    let spec = RequestSpec::new(Method::Get, search_path(index, max_hits));

    let body = match field {
        Some(field) => {
            let value = value
                .map(|v| format!("\"{}\"", escape_json(v)))
                .unwrap_or_else(|| "null".to_string());
            let clause = format!(r#"{{"match":{{"{}":{}}}}}"#, escape_json(field), value);
            Some(Body::json(query_body(&clause, max_hits)))
        }
        None => size_only_body(max_hits),
    };

    match body {
        Some(body) => spec.with_body(body),
        None => spec,
    }
}

/// Lucene query-string query
pub fn query_string_query(index: &str, query: Option<&str>, max_hits: Option<u32>) -> RequestSpec {
    let spec = RequestSpec::new(Method::Get, search_path(index, max_hits));

    let body = match query {
        Some(query) => {
            let clause = format!(r#"{{"query_string":{{"query":"{}"}}}}"#, escape_json(query));
            Some(Body::json(query_body(&clause, max_hits)))
        }
        None => size_only_body(max_hits),
    };

    match body {
        Some(body) => spec.with_body(body),
        None => spec,
    }
}

/// Append `.keyword` unless the field already ends with it
pub fn keyword_field(field: &str) -> String {
    if field.ends_with(KEYWORD_SUFFIX) {
        field.to_string()
    } else {
        format!("{}{}", field, KEYWORD_SUFFIX)
    }
}

/// Zero-hit search with a terms aggregation on the keyword form of `field`
pub fn term_aggregate(index: &str, field: &str) -> RequestSpec {
    let body = format!(
        r#"{{"size":"0","aggs":{{"{}":{{"terms":{{"field":"{}"}}}}}}}}"#,
        AGGREGATION_NAME,
        escape_json(&keyword_field(field))
    );

    RequestSpec::new(Method::Get, format!("{}/_search", index)).with_body(Body::json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_paths() {
        assert_eq!(list_indices().path, "_cat/indices?format=json");
        assert_eq!(get_mapping("books").path, "books/");
        assert_eq!(get_doc("books", "42").path, "books/_doc/42");

        let delete = delete_doc("books", "42");
        assert_eq!(delete.method, Method::Delete);
        assert!(delete.body.is_none());
    }

    #[test]
    fn test_url_joins_base() {
        assert_eq!(
            get_doc("books", "1").url("http://localhost:9200/"),
            "http://localhost:9200/books/_doc/1"
        );
    }

    #[test]
    fn test_save_doc_with_and_without_id() {
        let put = save_doc("books", Some("7"), r#"{"a":1}"#, None);
        assert_eq!(put.method, Method::Put);
        assert_eq!(put.path, "books/_doc/7");
        assert_eq!(put.body_text(), Some(r#"{"a":1}"#));

        let post = save_doc("books", None, r#"{"a":1}"#, Some(ConcurrencyToken::new(3, 1)));
        assert_eq!(post.method, Method::Post);
        assert_eq!(post.path, "books/_doc/");
    }

    #[test]
    fn test_save_doc_with_concurrency_token() {
        let spec = save_doc("books", Some("7"), "{}", Some(ConcurrencyToken::new(12, 2)));
        assert_eq!(spec.path, "books/_doc/7?if_seq_no=12&if_primary_term=2");
    }

    #[test]
    fn test_match_query_body() {
        let spec = match_query("books", Some("title"), Some("rust \"lang\""), Some(5));
        assert_eq!(spec.method, Method::Get);
        assert_eq!(spec.path, "books/_search");
        assert_eq!(
            spec.body_text(),
            Some(r#"{"size":5,"query":{"match":{"title":"rust \"lang\""}}}"#)
        );
        assert_eq!(spec.body.unwrap().content_type, ContentType::Json);
    }

    #[test]
    fn test_match_query_count_routes_to_count_without_size() {
        let spec = match_query("books", Some("title"), Some("rust"), Some(0));
        assert_eq!(spec.path, "books/_count");
        assert_eq!(spec.body_text(), Some(r#"{"query":{"match":{"title":"rust"}}}"#));
    }

    #[test]
    fn test_match_query_null_value() {
        let spec = match_query("books", Some("title"), None, None);
        assert_eq!(spec.body_text(), Some(r#"{"query":{"match":{"title":null}}}"#));
    }

    #[test]
    fn test_match_query_without_field() {
        assert_eq!(
            match_query("books", None, None, Some(3)).body_text(),
            Some(r#"{"size":3}"#)
        );
        assert!(match_query("books", None, None, Some(0)).body.is_none());
        assert!(match_query("books", None, None, None).body.is_none());
    }

    #[test]
    fn test_query_string_query_escapes_text() {
        let spec = query_string_query("logs", Some("path:\"/var\tlog\""), Some(10));
        assert_eq!(
            spec.body_text(),
            Some(r#"{"size":10,"query":{"query_string":{"query":"path:\"/var\tlog\""}}}"#)
        );

        let count = query_string_query("logs", Some("error"), Some(0));
        assert_eq!(count.path, "logs/_count");
        assert_eq!(
            count.body_text(),
            Some(r#"{"query":{"query_string":{"query":"error"}}}"#)
        );
    }

    #[test]
    fn test_keyword_suffix_is_idempotent() {
        assert_eq!(keyword_field("genre"), "genre.keyword");
        assert_eq!(keyword_field("genre.keyword"), "genre.keyword");
        assert_eq!(keyword_field(&keyword_field("genre")), "genre.keyword");
    }

    #[test]
    fn test_term_aggregate_body() {
        let spec = term_aggregate("books", "genre");
        assert_eq!(spec.path, "books/_search");
        assert_eq!(
            spec.body_text(),
            Some(r#"{"size":"0","aggs":{"keyagg":{"terms":{"field":"genre.keyword"}}}}"#)
        );
    }

    #[test]
    fn test_delete_all_and_bulk() {
        let spec = delete_all("books");
        assert_eq!(spec.method, Method::Post);
        assert_eq!(spec.path, "books/_delete_by_query?conflicts=proceed");
        assert_eq!(spec.body_text(), Some(r#"{"query":{"match_all":{}}}"#));

        let spec = bulk("books", "line\n".to_string());
        assert_eq!(spec.path, "books/_bulk");
        assert_eq!(spec.body.unwrap().content_type, ContentType::NdJson);
    }
}
