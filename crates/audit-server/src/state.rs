use std::sync::Arc;

use audit_core::PipelineError;
use audit_llm::OpenAIProvider;
use audit_pipeline::{HttpFetcher, StepPipeline};
use audit_store::{AuditStore, SqliteAuditStore};

use crate::config::ServerConfig;
use crate::error::AppError;

pub struct AppState {
    pub pipeline: StepPipeline,
    pub debug: bool,
}

impl AppState {
    pub fn new(pipeline: StepPipeline, debug: bool) -> Self {
        Self { pipeline, debug }
    }

    /// Wire the SQLite store, completion provider and fetcher from `config`.
    pub async fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let db_path = config.database_path();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        log::info!("Initializing storage at: {:?}", db_path);
        let store = Arc::new(SqliteAuditStore::new(&db_path));
        store.init().await?;
        log::info!("Storage initialized successfully at: {:?}", db_path);

        if config.api_key.trim().is_empty() {
            log::warn!("OPENAI_API_KEY is not set; step runs will fail until it is configured");
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        log::info!(
            "Creating completion provider with base URL: {} and model: {}",
            config.llm_base_url,
            config.model
        );
        let completions = Arc::new(
            OpenAIProvider::new(config.api_key.clone())
                .with_base_url(config.llm_base_url.clone())
                .with_model(config.model.clone())
                .with_client(client.clone()),
        );
        let fetcher = Arc::new(HttpFetcher::with_client(client));

        Ok(Self::new(
            StepPipeline::new(store, completions, fetcher),
            config.debug,
        ))
    }

    pub fn error(&self, error: impl Into<PipelineError>) -> AppError {
        AppError::new(error.into(), self.debug)
    }
}
