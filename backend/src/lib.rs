//! Solr search backend: query construction, the Solr client and facet decoding.

pub mod api;
pub mod config;
pub mod db_utils;
pub mod error;
pub mod facets;
pub mod query;
pub mod server_extra;
