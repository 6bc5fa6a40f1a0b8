//! Highlighted text spans decoded from Solr highlighting snippets.

use serde::{Deserialize, Serialize};


/// A run of snippet text. Highlighted runs carry a running `index`, starting at 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightTextSpan {
    pub text: String,
    pub is_highlighted: bool,
    pub index: u64,
}
