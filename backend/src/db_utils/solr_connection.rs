//! Solr endpoints, HTTP connections and the connection cache.

use std::{
    collections::HashMap,
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    config::Configuration,
    error::{ConfigError, NoConnectionError},
};

/// Where a Solr core lives and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SolrEndpoint {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Read timeout in seconds.
    pub timeout: u64,
    /// Connect timeout in seconds.
    pub connect_timeout: u64,
}

impl Default for SolrEndpoint {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "localhost".to_string(),
            port: 8983,
            path: "/solr/".to_string(),
            username: None,
            password: None,
            timeout: 30,
            connect_timeout: 5,
        }
    }
}

impl SolrEndpoint {
    /// Reads the `solr` block. `SOLR_URL`, when set, replaces scheme, host, port and path.
    pub fn from_configuration(configuration: &Configuration) -> Result<Self, ConfigError> {
        let endpoint = configuration.deserialize::<SolrEndpoint>("solr")?.unwrap_or_default();
        match std::env::var("SOLR_URL") {
            Ok(url) if !url.trim().is_empty() => endpoint.with_url(url.trim()),
            _ => endpoint.validated(),
        }
    }

    /// Parses `scheme://[user:password@]host[:port]/path`.
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        Self::default().with_url(url)
    }

    fn with_url(self, url: &str) -> Result<Self, ConfigError> {
        let parsed = reqwest::Url::parse(url).map_err(|source| ConfigError::InvalidUrl {
            url: url.to_string(),
            message: source.to_string(),
        })?;
        let host = parsed.host_str().ok_or_else(|| ConfigError::InvalidUrl {
            url: url.to_string(),
            message: "missing host".to_string(),
        })?;
        let username = Some(parsed.username()).filter(|username| !username.is_empty());
        Self {
            scheme: parsed.scheme().to_string(),
            host: host.to_string(),
            port: parsed.port_or_known_default().unwrap_or(self.port),
            path: parsed.path().to_string(),
            username: username.map(str::to_string).or(self.username),
            password: parsed.password().map(str::to_string).or(self.password),
            ..self
        }
        .validated()
    }

    /// Checks the scheme and normalizes the path to `/core/path/`.
    fn validated(mut self) -> Result<Self, ConfigError> {
        self.scheme = self.scheme.to_ascii_lowercase();
        if !matches!(self.scheme.as_str(), "http" | "https") {
            return Err(ConfigError::InvalidScheme { scheme: self.scheme });
        }
        if self.host.is_empty() {
            return Err(ConfigError::InvalidUrl {
                url: self.base_url(),
                message: "missing host".to_string(),
            });
        }
        let path = self.path.trim_matches('/');
        self.path = if path.is_empty() { "/".to_string() } else { format!("/{path}/") };
        Ok(self)
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}:{}{}", self.scheme, self.host, self.port, self.path)
    }

    /// URL of a request handler below the core path, e.g. `select` or `admin/ping`.
    pub fn handler_url(&self, handler: &str) -> String {
        format!("{}{}", self.base_url(), handler.trim_start_matches('/'))
    }

    /// Digest of everything that identifies the endpoint, credentials included.
    pub fn cache_key(&self) -> String {
        sha256::digest(format!(
            "{}|{}|{}|{}|{}|{}",
            self.scheme,
            self.host,
            self.port,
            self.path,
            self.username.as_deref().unwrap_or_default(),
            self.password.as_deref().unwrap_or_default(),
        ))
    }
}

/// An HTTP client bound to one endpoint. Connections are stateless apart from the ping cache,
/// which only ever remembers a successful ping.
#[derive(Debug)]
pub struct SolrConnection {
    endpoint: SolrEndpoint,
    client: reqwest::Client,
    ping_succeeded: AtomicBool,
}

impl SolrConnection {
    pub fn new(endpoint: SolrEndpoint) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(endpoint.timeout))
            .connect_timeout(Duration::from_secs(endpoint.connect_timeout))
            .build()
            .map_err(|source| ConfigError::InvalidUrl {
                url: endpoint.base_url(),
                message: source.to_string(),
            })?;
        Ok(Self {
            endpoint,
            client,
            ping_succeeded: AtomicBool::new(false),
        })
    }

    pub fn endpoint(&self) -> &SolrEndpoint {
        &self.endpoint
    }

    /// A POST to `handler` carrying the endpoint's credentials.
    pub(crate) fn post(&self, handler: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.post(self.endpoint.handler_url(handler)))
    }

    pub(crate) fn get(&self, handler: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.get(self.endpoint.handler_url(handler)))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.endpoint.username {
            Some(username) => request.basic_auth(username, self.endpoint.password.as_deref()),
            None => request,
        }
    }

    /// Whether the last uncached ping succeeded.
    pub(crate) fn cached_ping(&self) -> bool {
        self.ping_succeeded.load(Ordering::Acquire)
    }

    /// A failed ping clears the cache so the next cached ping asks Solr again.
    pub(crate) fn cache_ping(&self, available: bool) {
        self.ping_succeeded.store(available, Ordering::Release);
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisteredConnection {
    root_page_id: u64,
    #[serde(default)]
    language: u64,
    #[serde(default)]
    solr: SolrEndpoint,
}

/// Owns the process-wide connection cache and the site/language registry.
///
/// Lookups take a read lock; a miss builds the connection outside the lock and inserts it. Two
/// requests missing at once may both build one, and the first insert wins.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    connections: RwLock<HashMap<String, Arc<SolrConnection>>>,
    registry: Vec<RegisteredConnection>,
}

impl ConnectionManager {
    /// Reads the `connections` list of `{rootPageId, language, solr}` entries.
    pub fn from_configuration(configuration: &Configuration) -> Result<Self, ConfigError> {
        let mut registry: Vec<RegisteredConnection> =
            configuration.deserialize("connections")?.unwrap_or_default();
        for entry in &mut registry {
            entry.solr = std::mem::take(&mut entry.solr).validated()?;
        }
        info!(connections = registry.len(), "Solr connection registry loaded");
        Ok(Self {
            connections: RwLock::new(HashMap::new()),
            registry,
        })
    }

    pub fn connection(&self, endpoint: &SolrEndpoint) -> Result<Arc<SolrConnection>, ConfigError> {
        let key = endpoint.cache_key();
        if let Some(connection) = self
            .connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(connection.clone());
        }
        debug!(url = %endpoint.base_url(), "creating Solr connection");
        let connection = Arc::new(SolrConnection::new(endpoint.clone())?);
        let mut connections = self.connections.write().unwrap_or_else(PoisonError::into_inner);
        Ok(connections.entry(key).or_insert(connection).clone())
    }

    /// The connection registered for a site root and language.
    pub fn connection_for(
        &self,
        root_page_id: u64,
        language: u64,
    ) -> Result<Arc<SolrConnection>, crate::error::SearchError> {
        let entry = self
            .registry
            .iter()
            .find(|entry| entry.root_page_id == root_page_id && entry.language == language)
            .ok_or(NoConnectionError { root_page_id, language })?;
        Ok(self.connection(&entry.solr)?)
    }

    pub fn cached_connections(&self) -> usize {
        self.connections.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
