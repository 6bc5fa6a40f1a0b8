//! Search API operations.

mod search_for_results;
pub use search_for_results::{build_query, search_for_results};

mod search_for_results_hit_count;
pub use search_for_results_hit_count::search_for_results_hit_count;

mod search_facets;
pub use search_facets::search_facets;

mod search_suggestions;
pub use search_suggestions::search_suggestions;

pub mod search_filters;
