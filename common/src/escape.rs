//! Escaping of free-text query terms and encoding of hierarchical facet paths.
//!
//! Hierarchical facet values are stored in the index as `<depth>-<path>/`, for example
//! `1-Products/Books/`. The depth is the zero-based number of separators between segments. A
//! segment may contain a literal slash, which the indexer escapes as `\/`; such slashes are hidden
//! behind a placeholder while a path is split so they survive as part of their segment.

use std::{error::Error, fmt};

/// Separator between the levels of a hierarchical facet path.
pub const PATH_SEPARATOR: char = '/';

/// Escaped form of a slash that is part of a segment rather than a separator.
pub const ESCAPED_SLASH: &str = "\\/";

/// Placeholder that stands in for [`ESCAPED_SLASH`] while a path is split.
pub const SLASH_PLACEHOLDER: &str = "@@@slash@@@";

/// Escaped form of `@` used so that the placeholder can never occur in substituted text.
const AT_ESCAPE: &str = "@a@";

/// Escapes a free-text term for the Lucene/Solr standard query syntax.
///
/// Numeric terms are returned unchanged. Inside a quoted phrase only `"` and `\` are escaped;
/// outside of quotes the characters `( ) { } [ ] ^ " ~ : \` are escaped. The operators
/// `* & | ? - ! +` keep their query meaning and are never escaped. An unbalanced trailing quote is
/// escaped so the resulting query still parses.
pub fn escape_query_term(raw: &str) -> String {
    if is_numeric(raw) {
        return raw.to_string();
    }
    if !raw.contains('"') {
        return escape_special_characters(raw);
    }
    escape_by_quote_context(raw)
}

fn escape_by_quote_context(raw: &str) -> String {
    let quote_count = raw.matches('"').count();
    let even_quotes = quote_count % 2 == 0;

    let mut result = String::with_capacity(raw.len() + 8);
    for (index, segment) in raw.split('"').enumerate() {
        let in_quote = index % 2 != 0;
        let after_last_quote = index == quote_count;
        if after_last_quote && !even_quotes {
            result.push_str("\\\"");
        }
        if in_quote && !after_last_quote {
            result.push_str(&escape_phrase(segment));
        } else {
            result.push_str(&escape_special_characters(segment));
        }
    }
    result
}

fn escape_phrase(phrase: &str) -> String {
    let mut escaped = String::with_capacity(phrase.len() + 2);
    escaped.push('"');
    for c in phrase.chars() {
        if c == '"' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('"');
    escaped
}

fn escape_special_characters(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '(' | ')' | '{' | '}' | '[' | ']' | '^' | '"' | '~' | ':' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Returns `true` for decimal numbers such as `42`, `-1.5` or `3e10`.
fn is_numeric(value: &str) -> bool {
    let value = value.trim_start();
    let bytes = value.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }
    if digits == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+') | Some(b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == bytes.len()
}

/// Hides every escaped slash (`\/`) behind [`SLASH_PLACEHOLDER`].
///
/// `@` characters already present are escaped first, so the substitution is reversible for every
/// input: `unsubstitute_slashes(&substitute_slashes(s)) == s`.
pub fn substitute_slashes(path: &str) -> String {
    path.replace('@', AT_ESCAPE).replace(ESCAPED_SLASH, SLASH_PLACEHOLDER)
}

/// Reverses [`substitute_slashes`].
pub fn unsubstitute_slashes(token: &str) -> String {
    token.replace(SLASH_PLACEHOLDER, ESCAPED_SLASH).replace(AT_ESCAPE, "@")
}

/// Splits a `/`-separated path into its segments, keeping escaped slashes inside their segment.
///
/// Leading and trailing separators are ignored; an empty path has no segments.
pub fn split_path(path: &str) -> Vec<String> {
    let substituted = substitute_slashes(path);
    substituted
        .trim_matches(PATH_SEPARATOR)
        .split(PATH_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .map(unsubstitute_slashes)
        .collect()
}

/// Reason a hierarchical facet value could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchyPathError {
    /// The value has no `<depth>-` prefix.
    MissingDepth(String),
    /// The declared depth does not match the number of path segments.
    DepthMismatch {
        /// The raw value.
        value: String,
        /// Depth declared by the prefix.
        declared: usize,
        /// Depth implied by the segments.
        actual: usize,
    },
    /// The value contains no path segment.
    EmptyPath(String),
}

impl fmt::Display for HierarchyPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDepth(value) => write!(f, "missing depth prefix in {value:?}"),
            Self::DepthMismatch { value, declared, actual } => write!(
                f,
                "depth {declared} of {value:?} does not match its {actual} separators"
            ),
            Self::EmptyPath(value) => write!(f, "no path segments in {value:?}"),
        }
    }
}

impl Error for HierarchyPathError {}

/// A decoded hierarchical facet value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HierarchyPath {
    segments: Vec<String>,
}

impl HierarchyPath {
    /// Creates a path from its segments. Segments keep any `\/` escapes.
    pub fn from_segments(segments: Vec<String>) -> Result<Self, HierarchyPathError> {
        if segments.is_empty() {
            return Err(HierarchyPathError::EmptyPath(String::new()));
        }
        Ok(Self { segments })
    }

    /// Decodes the `<depth>-<path>/` form used in the index.
    pub fn parse_encoded(value: &str) -> Result<Self, HierarchyPathError> {
        let Some((depth, path)) = value.split_once('-') else {
            return Err(HierarchyPathError::MissingDepth(value.to_string()));
        };
        if depth.is_empty() || !depth.bytes().all(|b| b.is_ascii_digit()) {
            return Err(HierarchyPathError::MissingDepth(value.to_string()));
        }
        let declared: usize = depth
            .parse()
            .map_err(|_| HierarchyPathError::MissingDepth(value.to_string()))?;
        let segments = split_path(path);
        if segments.is_empty() {
            return Err(HierarchyPathError::EmptyPath(value.to_string()));
        }
        let actual = segments.len() - 1;
        if declared != actual {
            return Err(HierarchyPathError::DepthMismatch {
                value: value.to_string(),
                declared,
                actual,
            });
        }
        Ok(Self { segments })
    }

    /// Decodes a value taken from a search request.
    ///
    /// Requests may carry the full encoded form or only the path (`a/b`, `/a/b/`); in the latter
    /// case the depth is derived from the number of segments.
    pub fn from_request_value(value: &str) -> Result<Self, HierarchyPathError> {
        if let Ok(path) = Self::parse_encoded(value) {
            return Ok(path);
        }
        let segments = split_path(value);
        if segments.is_empty() {
            return Err(HierarchyPathError::EmptyPath(value.to_string()));
        }
        Ok(Self { segments })
    }

    /// Zero-based depth of the last segment.
    pub fn depth(&self) -> usize {
        self.segments.len() - 1
    }

    /// All segments, root first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The last segment.
    pub fn key(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// The segment above [`Self::key`], if any.
    pub fn parent_key(&self) -> Option<&str> {
        let len = self.segments.len();
        (len > 1).then(|| self.segments[len - 2].as_str())
    }

    /// The parent path, if this is not a root path.
    pub fn parent(&self) -> Option<Self> {
        (self.segments.len() > 1).then(|| Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// The `<depth>-<path>/` form used in the index and in filter queries.
    pub fn encode(&self) -> String {
        format!("{}-{}/", self.depth(), self.segments.join("/"))
    }

    /// The node value: `/` followed by the `/`-joined segments.
    pub fn node_value(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}
