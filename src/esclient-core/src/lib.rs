//! esclient Core Library
//!
//! This crate provides the transport-free half of esclient, including:
//! - Client configuration
//! - Basic-auth credential header derivation
//! - JSON string escaping for hand-built request bodies
//! - Request builders for every supported endpoint
//! - Bulk batch planning and NDJSON encoding
//! - Response parsing into the search result model

pub mod auth;
pub mod bulk;
pub mod config;
pub mod escape;
pub mod models;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use auth::{AuthType, Credentials};
pub use bulk::{BulkBatch, BulkItem};
pub use config::ClientConfig;
pub use escape::escape_json;
pub use models::*;
pub use request::{Body, ContentType, Method, RequestSpec};
pub use response::{parse_search_response, try_parse_search_response, ParseAnomaly};
