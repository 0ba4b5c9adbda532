use esclient_core::config::normalize_base_url;
use esclient_core::response::{self, parse_search_response};
use esclient_core::{request, AuthType, ClientConfig, ConcurrencyToken, Credentials, Mapping};
use esclient_core::{RequestSpec, SearchResults, TermCounts};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use crate::error::check_status;
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::{ClientError, Result};

/// Hit limit used when callers don't pick one
pub const DEFAULT_MAX_HITS: u32 = 10;

/// Client for a search engine's REST API.
///
/// Every operation awaits its requests one after another; nothing runs
/// concurrently inside the client. The `Authorization` header is derived once
/// from the configured credentials and only recomputed by
/// [`ElasticClient::set_credentials`].
pub struct ElasticClient {
    pub(crate) config: ClientConfig,
    transport: Arc<dyn Transport>,
    auth_header: Option<String>,
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

impl ElasticClient {
    /// Create a client that talks HTTP through reqwest
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(
            config.timeout_secs.map(Duration::from_secs),
            config.insecure_skip_verify,
        )?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client on top of any transport
    pub fn with_transport(mut config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        config.base_url = normalize_base_url(&config.base_url);
        let auth_header = config.credentials().map(|c| c.header_value());

        Self {
            config,
            transport,
            auth_header,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Blank URLs reset to the local default; a trailing `/` is added if missing
    pub fn set_base_url(&mut self, url: &str) {
        self.config.base_url = normalize_base_url(url);
    }

    pub fn bulk_batch_size(&self) -> usize {
        self.config.bulk_batch_size.get()
    }

    pub fn set_bulk_batch_size(&mut self, size: usize) -> Result<()> {
        self.config.bulk_batch_size = NonZeroUsize::new(size)
            .ok_or_else(|| ClientError::InvalidArgument("bulk batch size must be positive".to_string()))?;
        Ok(())
    }

    pub fn delete_batch_size(&self) -> usize {
        self.config.delete_batch_size.get()
    }

    pub fn set_delete_batch_size(&mut self, size: usize) -> Result<()> {
        self.config.delete_batch_size = NonZeroUsize::new(size)
            .ok_or_else(|| ClientError::InvalidArgument("delete batch size must be positive".to_string()))?;
        Ok(())
    }

    pub fn auth_type(&self) -> AuthType {
        self.config.auth_type
    }

    pub fn username(&self) -> &str {
        &self.config.username
    }

    /// Replace the credentials and recompute the cached auth header
    pub fn set_credentials(&mut self, auth_type: AuthType, username: &str, password: Option<&str>) {
        self.config.auth_type = auth_type;
        self.config.username = username.to_string();
        self.config.password = password.map(str::to_string);
        self.auth_header = self.config.credentials().map(|c| c.header_value());
    }

    /// Shortcut for basic auth
    pub fn set_basic_auth(&mut self, credentials: &Credentials) {
        self.set_credentials(AuthType::Basic, credentials.username(), Some(credentials.password()));
    }

    async fn send(&self, spec: RequestSpec) -> Result<HttpResponse> {
        let url = spec.url(&self.config.base_url);
        tracing::debug!(method = spec.method.as_str(), url = %url, "Sending request");

        if let Some(body) = &spec.body {
            if body.content.len() <= 4096 {
                tracing::debug!(body = %body.content, "Request body");
            } else {
                tracing::debug!(bytes = body.content.len(), "Request body");
            }
        }

        let mut headers = Vec::new();
        if let Some(auth) = &self.auth_header {
            headers.push(("Authorization".to_string(), auth.clone()));
        }

        self.transport
            .execute(HttpRequest {
                method: spec.method,
                url,
                headers,
                body: spec.body,
            })
            .await
    }

    /// Send and classify; non-2xx responses become [`ClientError::Status`]
    pub(crate) async fn call(&self, context: &str, spec: RequestSpec) -> Result<HttpResponse> {
        let response = self.send(spec).await?;
        check_status(context, response)
    }

    /// Names of all indices
    pub async fn index_names(&self) -> Result<Vec<String>> {
        let response = self.call("Index name", request::list_indices()).await?;
        Ok(response::parse_index_names(&response.body)?)
    }

    /// Field name → field type for an index, sorted by field name
    pub async fn mappings(&self, index: &str) -> Result<Mapping> {
        let response = self.call("mappings", request::get_mapping(index)).await?;
        Ok(response::parse_mapping(&response.body, index)?)
    }

    /// Run a match query and return the raw response body.
    ///
    /// `max_hits` of `Some(0)` turns this into a count request; `None` leaves
    /// the hit limit to the server.
    pub async fn match_query_raw(
        &self,
        index: &str,
        field: Option<&str>,
        value: Option<&str>,
        max_hits: Option<u32>,
    ) -> Result<String> {
        let spec = request::match_query(index, field, value, max_hits);
        let response = self.call("Query response", spec).await?;
        Ok(response.body)
    }

    /// Run a match query and parse the results.
    ///
    /// Unrecognized response shapes are logged and produce an empty result,
    /// so a total of 0 means "nothing parseable", not necessarily "no matches".
    pub async fn match_query(
        &self,
        index: &str,
        field: Option<&str>,
        value: Option<&str>,
        max_hits: Option<u32>,
    ) -> Result<SearchResults> {
        let body = self.match_query_raw(index, field, value, max_hits).await?;
        Ok(parse_search_response(&body, max_hits))
    }

    /// Run a query-string query and return the raw response body
    pub async fn query_string_query_raw(
        &self,
        index: &str,
        query: Option<&str>,
        max_hits: Option<u32>,
    ) -> Result<String> {
        let spec = request::query_string_query(index, query, max_hits);
        let response = self.call("Query response", spec).await?;
        Ok(response.body)
    }

    /// Run a query-string query and parse the results leniently
    pub async fn query_string_query(
        &self,
        index: &str,
        query: Option<&str>,
        max_hits: Option<u32>,
    ) -> Result<SearchResults> {
        let body = self.query_string_query_raw(index, query, max_hits).await?;
        Ok(parse_search_response(&body, max_hits))
    }

    /// Number of documents matching `field == value`, or all documents when no field is given
    pub async fn count(&self, index: &str, field: Option<&str>, value: Option<&str>) -> Result<u64> {
        let body = self.match_query_raw(index, field, value, Some(0)).await?;
        Ok(parse_search_response(&body, Some(0)).total)
    }

    /// Fetch a document's raw JSON response. A blank id sends nothing.
    pub async fn get_doc(&self, index: &str, id: &str) -> Result<Option<String>> {
        if is_blank(id) {
            return Ok(None);
        }

        let response = self.call("get response", request::get_doc(index, id)).await?;
        Ok(Some(response.body))
    }

    /// Store a document and return its id.
    ///
    /// With an id the document is written with PUT, overwriting any existing
    /// document; the optional token makes the write conditional on the stored
    /// sequence number and primary term. Without an id the server assigns one.
    /// A blank document sends nothing.
    pub async fn save_doc(
        &self,
        index: &str,
        document: &str,
        id: Option<&str>,
        token: Option<ConcurrencyToken>,
    ) -> Result<Option<String>> {
        if is_blank(document) {
            return Ok(None);
        }

        let id = id.map(str::trim).filter(|id| !id.is_empty());
        let spec = request::save_doc(index, id, document, token);
        let response = self.call("save response", spec).await?;

        match response::parse_document_id(&response.body) {
            Ok(saved) => Ok(Some(saved)),
            Err(e) => match id {
                Some(id) => {
                    tracing::warn!(error = %e, id, "Could not read saved id, using requested id");
                    Ok(Some(id.to_string()))
                }
                None => Err(e.into()),
            },
        }
    }

    /// Delete one document. A blank index or id sends nothing.
    pub async fn delete_doc(&self, index: &str, id: &str) -> Result<()> {
        if is_blank(id) || is_blank(index) {
            return Ok(());
        }

        self.call("delete response", request::delete_doc(index, id))
            .await?;
        Ok(())
    }

    /// Delete every document in an index, proceeding past version conflicts.
    /// Returns the server's deleted count when it reports one.
    pub async fn delete_all_docs(&self, index: &str) -> Result<Option<u64>> {
        if is_blank(index) {
            return Ok(None);
        }

        let response = self
            .call("delete all response", request::delete_all(index))
            .await?;

        let deleted = response::parse_deleted_count(&response.body);
        tracing::debug!(index, ?deleted, "Deleted all documents");
        Ok(deleted)
    }

    /// Document counts per distinct value of `field`.
    ///
    /// The field is aggregated in its `.keyword` form. Unlike search parsing, an
    /// unreadable aggregation response is an error.
    pub async fn simple_aggregate(&self, index: &str, field: &str) -> Result<TermCounts> {
        let response = self
            .call("Query response", request::term_aggregate(index, field))
            .await?;

        response::parse_term_buckets(&response.body).map_err(|e| {
            tracing::warn!(error = %e, index, field, "Error getting aggregation");
            ClientError::from(e)
        })
    }
}

impl std::fmt::Debug for ElasticClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticClient")
            .field("base_url", &self.config.base_url)
            .field("auth_type", &self.config.auth_type)
            .finish()
    }
}
