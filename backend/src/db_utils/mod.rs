pub mod decompose_spans;
pub mod solr_connection;
pub mod solr_response;
pub mod solr_utils;
