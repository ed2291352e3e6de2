use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use recap_core::{
    Analyzer, ChatSummarizer, GoogleTranslateClient, Provider, SummarizerConfig,
    YoutubeTranscriptClient,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

mod config;
mod server;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = Config::parse();
    let provider: Provider = config.provider.into();

    let api_key = provider.resolve_api_key(config.api_key.clone())?;
    let summarizer_config = SummarizerConfig::new(provider, config.model.clone(), api_key);
    info!(
        provider = provider.name(),
        model = %summarizer_config.model,
        max_words = config.max_words,
        timeout_secs = config.timeout_secs,
        "starting recap"
    );

    let client = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let analyzer = Analyzer::new(
        Arc::new(YoutubeTranscriptClient::new(client.clone())),
        Arc::new(GoogleTranslateClient::new(client.clone())),
        Arc::new(ChatSummarizer::new(client, summarizer_config)),
        config.analyzer_config(),
    );

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, server::router(Arc::new(analyzer)))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")?;

    Ok(())
}
