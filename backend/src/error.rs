//! Error types for configuration, Solr communication and connection resolution.

use std::path::PathBuf;

use crate::query::QueryParameters;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration path {path:?}")]
    InvalidPath { path: String },

    #[error("invalid value at {path}: {message}")]
    InvalidValue { path: String, message: String },

    #[error("invalid sort direction {direction:?} in {sorting:?}, expected asc or desc")]
    InvalidSortDirection { sorting: String, direction: String },

    #[error("invalid scheme {scheme:?}, expected http or https")]
    InvalidScheme { scheme: String },

    #[error("invalid Solr URL {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("failed to read configuration file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// A request to Solr failed, carrying what is needed to log and replay it.
#[derive(Debug, thiserror::Error)]
#[error("Solr request failed ({reason}) for query {query_string:?} offset {offset} limit {limit}")]
pub struct CommunicationFailure {
    pub query_string: String,
    pub parameters: QueryParameters,
    pub offset: u64,
    pub limit: u64,
    pub status: Option<u16>,
    pub reason: String,
}

/// No Solr connection is configured for the requested site and language.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no Solr connection configured for root page {root_page_id}, language {language}")]
pub struct NoConnectionError {
    pub root_page_id: u64,
    pub language: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Communication(#[from] Box<CommunicationFailure>),

    #[error("failed to decode Solr response: {message}")]
    Decode { message: String, body_excerpt: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    NoConnection(#[from] NoConnectionError),
}

impl From<CommunicationFailure> for SearchError {
    fn from(failure: CommunicationFailure) -> Self {
        SearchError::Communication(Box::new(failure))
    }
}
