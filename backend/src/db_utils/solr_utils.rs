//! The Solr search client: search, suggest and ping.

use std::{sync::Arc, time::Duration};

use common::search_result::SearchSuggestion;
use tracing::{debug, error, info, warn};

use crate::{
    config::Configuration,
    db_utils::{solr_connection::SolrConnection, solr_response::SolrResponse},
    error::{CommunicationFailure, SearchError},
    query::{Query, QueryParameters, SuggestQuery, to_form_pairs},
};

const BODY_EXCERPT_LENGTH: usize = 200;

/// Logging switches read once from `logging.*`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryLogging {
    pub query_string: bool,
    pub raw_response: bool,
    pub exceptions: bool,
}

impl QueryLogging {
    pub fn from_configuration(configuration: &Configuration) -> Self {
        Self {
            query_string: configuration.is_query_string_logging_enabled(),
            raw_response: configuration.is_raw_response_logging_enabled(),
            exceptions: configuration.is_exception_logging_enabled(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolrSearch {
    connection: Arc<SolrConnection>,
    logging: QueryLogging,
}

impl SolrSearch {
    pub fn new(connection: Arc<SolrConnection>, logging: QueryLogging) -> Self {
        Self { connection, logging }
    }

    pub fn connection(&self) -> &SolrConnection {
        &self.connection
    }

    /// Runs `query` against the `select` handler.
    ///
    /// Without an explicit `limit` the query's own row count applies. The query itself is never
    /// modified, so it stays reusable after a failed request.
    pub async fn search(&self, query: &Query, offset: u64, limit: Option<u64>) -> Result<SolrResponse, SearchError> {
        let limit = limit.unwrap_or_else(|| query.rows());
        self.select(query.query_string(), query.query_parameters(), offset, limit).await
    }

    /// Prefix suggestions for the last typed term, most frequent first.
    pub async fn suggest(&self, query: &SuggestQuery) -> Result<Vec<SearchSuggestion>, SearchError> {
        let response = self.select(query.query_string(), query.query_parameters(), 0, 0).await?;
        Ok(response
            .facet_field(query.suggest_field())
            .map(|counts| {
                counts
                    .iter()
                    .map(|(text, count)| SearchSuggestion { text: text.to_string(), count })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn select(
        &self,
        query_string: &str,
        mut parameters: QueryParameters,
        offset: u64,
        limit: u64,
    ) -> Result<SolrResponse, SearchError> {
        if !query_string.is_empty() {
            parameters.insert("q".into(), query_string.into());
        }
        parameters.insert("start".into(), offset.into());
        parameters.insert("rows".into(), limit.into());
        parameters.insert("wt".into(), "json".into());

        if self.logging.query_string {
            info!(query_string, offset, limit, ?parameters, "querying Solr");
        }
        let t0 = std::time::Instant::now();
        let failure = |status: Option<u16>, reason: String, parameters: QueryParameters| CommunicationFailure {
            query_string: query_string.to_string(),
            parameters,
            offset,
            limit,
            status,
            reason,
        };

        let request = self.connection.post("select").form(&to_form_pairs(&parameters));
        let response = match request.send().await {
            Ok(response) => response,
            Err(source) => return Err(self.report(failure(None, describe(&source), parameters))),
        };
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(source) => return Err(self.report(failure(Some(status.as_u16()), describe(&source), parameters))),
        };
        if !status.is_success() {
            let reason = format!("{status}: {}", excerpt(&body));
            return Err(self.report(failure(Some(status.as_u16()), reason, parameters)));
        }

        let decoded: SolrResponse = match serde_json::from_str(&body) {
            Ok(decoded) => decoded,
            Err(source) => return Err(self.report_decode(query_string, &source, &body)),
        };
        let dt_ms = t0.elapsed().as_millis() as u64;
        if self.logging.raw_response {
            info!(len = body.len(), q_time = decoded.response_header.q_time, dt_ms, ?decoded, "Solr response");
        } else {
            debug!(len = body.len(), dt_ms, "Solr response");
        }
        Ok(decoded)
    }

    fn report(&self, failure: CommunicationFailure) -> SearchError {
        if self.logging.exceptions {
            error!(
                query_string = %failure.query_string,
                offset = failure.offset,
                limit = failure.limit,
                status = ?failure.status,
                reason = %failure.reason,
                "Solr request failed"
            );
        }
        failure.into()
    }

    fn report_decode(&self, query_string: &str, source: &serde_json::Error, body: &str) -> SearchError {
        let error = SearchError::Decode {
            message: source.to_string(),
            body_excerpt: excerpt(body).to_string(),
        };
        if self.logging.exceptions {
            error!(query_string, error = %error, "Solr response could not be decoded");
        }
        error
    }

    /// Checks that the core answers its ping handler within `timeout`. Never fails: any error
    /// counts as unavailable. With `use_cache`, an earlier successful answer is reused.
    pub async fn ping(&self, timeout: Duration, use_cache: bool) -> bool {
        if use_cache && self.connection.cached_ping() {
            return true;
        }
        let request = self
            .connection
            .get("admin/ping")
            .query(&[("wt", "json")])
            .timeout(timeout)
            .send();
        let available = match tokio::time::timeout(timeout, request).await {
            Ok(Ok(response)) if response.status().is_success() => true,
            Ok(Ok(response)) => {
                self.log_ping_failure(&format!("status {}", response.status()));
                false
            }
            Ok(Err(source)) => {
                self.log_ping_failure(&describe(&source));
                false
            }
            Err(_) => {
                self.log_ping_failure(&format!("no answer within {timeout:?}"));
                false
            }
        };
        self.connection.cache_ping(available);
        available
    }

    fn log_ping_failure(&self, reason: &str) {
        if self.logging.exceptions {
            warn!(url = %self.connection.endpoint().base_url(), reason, "Solr ping failed");
        }
    }
}

fn describe(source: &reqwest::Error) -> String {
    if source.is_timeout() {
        format!("timeout: {source}")
    } else {
        source.to_string()
    }
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(BODY_EXCERPT_LENGTH) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_respects_char_boundaries() {
        let body = "ä".repeat(300);
        assert_eq!(excerpt(&body).chars().count(), BODY_EXCERPT_LENGTH);
        assert_eq!(excerpt("short"), "short");
    }
}
