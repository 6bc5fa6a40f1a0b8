//! Search orchestration on top of the query builders, the Solr client and the facet parsers.

pub mod search;

use std::sync::Arc;

use common::search_query::SearchRequest;

use crate::{
    config::Configuration,
    db_utils::{
        solr_connection::{ConnectionManager, SolrEndpoint},
        solr_utils::{QueryLogging, SolrSearch},
    },
    error::{ConfigError, SearchError},
    facets::LabelRenderer,
};

/// Configuration, endpoint and connection cache shared by every request of one service.
#[derive(Clone)]
pub struct SearchBackend {
    configuration: Arc<Configuration>,
    connections: Arc<ConnectionManager>,
    endpoint: SolrEndpoint,
    label_renderer: Option<Arc<dyn LabelRenderer>>,
}

impl SearchBackend {
    /// Resolves the Solr endpoint (honouring `SOLR_URL`) and the connection registry.
    pub fn new(configuration: Configuration) -> Result<Self, ConfigError> {
        let endpoint = SolrEndpoint::from_configuration(&configuration)?;
        Self::with_endpoint(configuration, endpoint)
    }

    pub fn with_endpoint(configuration: Configuration, endpoint: SolrEndpoint) -> Result<Self, ConfigError> {
        let connections = ConnectionManager::from_configuration(&configuration)?;
        Ok(Self {
            configuration: Arc::new(configuration),
            connections: Arc::new(connections),
            endpoint,
            label_renderer: None,
        })
    }

    pub fn with_label_renderer(mut self, renderer: Arc<dyn LabelRenderer>) -> Self {
        self.label_renderer = Some(renderer);
        self
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn endpoint(&self) -> &SolrEndpoint {
        &self.endpoint
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    pub fn label_renderer(&self) -> Option<&dyn LabelRenderer> {
        self.label_renderer.as_deref()
    }

    /// A client for the default endpoint, reusing its cached connection.
    pub fn client(&self) -> Result<SolrSearch, ConfigError> {
        let connection = self.connections.connection(&self.endpoint)?;
        Ok(SolrSearch::new(connection, QueryLogging::from_configuration(&self.configuration)))
    }

    /// A client for the site of `request`: the registered connection when the request names a
    /// root page, the default endpoint otherwise.
    pub fn client_for(&self, request: &SearchRequest) -> Result<SolrSearch, SearchError> {
        let connection = match request.root_page_id {
            Some(root_page_id) => self.connections.connection_for(root_page_id, request.language)?,
            None => self.connections.connection(&self.endpoint)?,
        };
        Ok(SolrSearch::new(connection, QueryLogging::from_configuration(&self.configuration)))
    }
}
