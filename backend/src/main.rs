//! `solr-search-server`: serves the search API over HTTP.

use anyhow::Context;
use backend::{api::SearchBackend, config::Configuration, server_extra};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let configuration = match std::env::var("SOLR_SEARCH_CONFIG") {
        Ok(path) => Configuration::from_file(&path).with_context(|| format!("loading {path}"))?,
        Err(_) => Configuration::default(),
    };
    let backend = SearchBackend::new(configuration).context("invalid Solr configuration")?;
    info!(solr = %backend.endpoint().base_url(), "using Solr");

    let listen = std::env::var("SOLR_SEARCH_LISTEN").unwrap_or("127.0.0.1:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("binding {listen}"))?;
    info!(%listen, "serving search API");
    axum::serve(listener, server_extra::router(backend))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
