//! Common library exports shared between the search backend and its callers.

extern crate serde;


pub mod escape;
pub mod hierarchy_facet;
pub mod search_query;
pub mod search_result;
pub mod text_highlight;
