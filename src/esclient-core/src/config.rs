use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

use crate::auth::{AuthType, Credentials};

/// Default server location used when no base URL is configured
pub const LOCAL_HOST: &str = "http://localhost:9200/";

#[derive(Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Max number of documents in a single `_bulk` request
    #[serde(default = "default_bulk_batch_size")]
    pub bulk_batch_size: NonZeroUsize,

    /// Max number of ids in a single delete request
    #[serde(default = "default_delete_batch_size")]
    pub delete_batch_size: NonZeroUsize,

    #[serde(default)]
    pub auth_type: AuthType,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// Request timeout handed to the transport, none by default
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

fn default_base_url() -> String {
    LOCAL_HOST.to_string()
}

fn default_bulk_batch_size() -> NonZeroUsize {
    NonZeroUsize::new(10_000).unwrap_or(NonZeroUsize::MIN)
}

fn default_delete_batch_size() -> NonZeroUsize {
    NonZeroUsize::new(500).unwrap_or(NonZeroUsize::MIN)
}

fn default_username() -> String {
    "elastic".to_string()
}

/// Blank URLs fall back to [`LOCAL_HOST`]; every URL ends with `/`.
pub fn normalize_base_url(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return LOCAL_HOST.to_string();
    }

    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            ..Self::default()
        }
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: ClientConfig = serde_json::from_str(&contents)?;
        config.base_url = normalize_base_url(&config.base_url);
        Ok(config)
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth_type = AuthType::Basic;
        self.username = username.into();
        self.password = Some(password.into());
        self
    }

    /// Credentials to authenticate with, if the auth type asks for any
    pub fn credentials(&self) -> Option<Credentials> {
        match self.auth_type {
            AuthType::None => None,
            AuthType::Basic => Some(Credentials::new(
                self.username.clone(),
                self.password.clone().unwrap_or_default(),
            )),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            bulk_batch_size: default_bulk_batch_size(),
            delete_batch_size: default_delete_batch_size(),
            auth_type: AuthType::None,
            username: default_username(),
            password: None,
            timeout_secs: None,
            insecure_skip_verify: false,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("bulk_batch_size", &self.bulk_batch_size)
            .field("delete_batch_size", &self.delete_batch_size)
            .field("auth_type", &self.auth_type)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .finish()
    }
}
