//! esclient Client Library
//!
//! HTTP client for the REST API of Elasticsearch-compatible search servers:
//! index discovery, mappings, single and bulk document writes, deletes,
//! match/query-string searches and term aggregations.
//!
//! ```rust,no_run
//! use esclient_rs::{ClientConfig, ElasticClient, DEFAULT_MAX_HITS};
//!
//! #[tokio::main]
//! async fn main() -> esclient_rs::Result<()> {
//!     let client = ElasticClient::new(ClientConfig::new("http://localhost:9200"))?;
//!
//!     let ids = client
//!         .bulk_create("books", &[r#"{"title":"Dune"}"#, r#"{"title":"Emma"}"#])
//!         .await?;
//!     println!("created {:?}", ids);
//!
//!     let results = client
//!         .match_query("books", Some("title"), Some("dune"), Some(DEFAULT_MAX_HITS))
//!         .await?;
//!     for hit in &results.hits {
//!         println!("{} {:.3} {}", hit.id, hit.score, hit.source());
//!     }
//!     Ok(())
//! }
//! ```

mod bulk;
mod client;
mod error;
mod transport;

#[cfg(test)]
mod testing;

pub use client::{ElasticClient, DEFAULT_MAX_HITS};
pub use error::{check_status, ClientError, Result};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

pub use esclient_core::{
    AuthType, ClientConfig, ConcurrencyToken, Credentials, Mapping, ParseAnomaly, SearchHit,
    SearchResults, TermCounts,
};
