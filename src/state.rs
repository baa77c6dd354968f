use std::sync::Arc;
use std::time::Duration;

use crate::backend::{ApiVariant, DocumentFetcher, FallbackBackend, HttpDocumentApi, SearchClient};
use crate::clarify::{Clarifier, ClarifyTable};
use crate::config::Config;
use crate::llm::{ChatCompletionClient, CompletionBackend};
use crate::models::{HealthResponse, Visibility};
use crate::responder::Responder;

/// Shared application state. Everything in here is immutable after start-up.
#[derive(Clone)]
pub struct AppState {
    pub responder: Arc<Responder>,
    pub http_client: reqwest::Client,
    pub health: Arc<HealthResponse>,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(800))
            .timeout(Duration::from_secs(10))
            .build()?;

        if !config.has_search_key() {
            tracing::warn!("SEARCH_API_KEY is not set; every search will come back empty");
        }
        if !config.has_model_key() && config.llm.provider == "openai" {
            tracing::warn!("LLM_API_KEY is not set; clarifications use the static option list");
        }

        let table = Arc::new(config.clarify_table()?);
        let responder = build_responder(config, http_client.clone(), table);

        Ok(Self::from_parts(responder, http_client, config))
    }

    /// Assemble state around an already-built responder (used by tests to
    /// inject fake backends).
    pub fn from_parts(responder: Responder, http_client: reqwest::Client, config: &Config) -> Self {
        Self {
            responder: Arc::new(responder),
            http_client,
            health: Arc::new(HealthResponse {
                has_model_key: config.has_model_key(),
                has_search_key: config.has_search_key(),
                environment_name: config.environment.clone(),
            }),
        }
    }
}

/// Wire the production responder: current API variant first, legacy second.
pub fn build_responder(
    config: &Config,
    http_client: reqwest::Client,
    table: Arc<ClarifyTable>,
) -> Responder {
    let api = |variant| {
        HttpDocumentApi::new(
            http_client.clone(),
            config.search.base_url.clone(),
            config.search.api_key.clone(),
            variant,
        )
    };
    let backend = Arc::new(FallbackBackend::new(
        api(ApiVariant::Current),
        api(ApiVariant::Legacy),
    ));

    let llm: Option<Arc<dyn CompletionBackend>> =
        if config.llm.provider == "ollama" || config.has_model_key() {
            Some(Arc::new(ChatCompletionClient::new(
                http_client.clone(),
                config.llm.clone(),
            )))
        } else {
            None
        };

    let budgets = config.budgets;
    Responder::new(
        SearchClient::new(backend.clone(), config.search.limit, budgets.search()),
        DocumentFetcher::new(backend, budgets.document()),
        Clarifier::new(llm, table, budgets.clarify()),
        budgets.deadline(),
    )
    .with_answer_visibility(if config.share_answers {
        Visibility::Channel
    } else {
        Visibility::Private
    })
}
