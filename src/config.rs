use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::clarify::ClarifyTable;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// Environment name reported by the health check
    pub environment: String,
    /// Document-search backend configuration
    pub search: SearchConfig,
    /// Language-model configuration
    pub llm: LlmConfig,
    /// Response-time budgets
    pub budgets: Budgets,
    /// Optional JSON file overriding the built-in clarify table
    pub clarify_table_path: Option<PathBuf>,
    /// Post "top match" answers to the whole channel instead of the requester only
    pub share_answers: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the document API
    pub base_url: String,
    /// Bearer credential for the document API
    pub api_key: Option<String>,
    /// Number of hits requested per search
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for clarification prompts
    pub chat_model: String,
    /// API key (required for the openai provider)
    pub api_key: Option<String>,
    /// Completion length cap in tokens
    pub max_tokens: u32,
}

/// Millisecond budgets. `deadline_ms` covers the whole request and must stay
/// below the platform's 3 s response window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Budgets {
    pub deadline_ms: u64,
    pub search_ms: u64,
    pub document_ms: u64,
    pub clarify_ms: u64,
}

impl Budgets {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn search(&self) -> Duration {
        Duration::from_millis(self.search_ms)
    }

    pub fn document(&self) -> Duration {
        Duration::from_millis(self.document_ms)
    }

    pub fn clarify(&self) -> Duration {
        Duration::from_millis(self.clarify_ms)
    }
}

impl Default for Budgets {
    fn default() -> Self {
        Self {
            deadline_ms: 2500,
            search_ms: 1200,
            document_ms: 1200,
            clarify_ms: 1400,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: None,
            limit: 3,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            api_key: None,
            max_tokens: 160,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:9000".to_string(),
            environment: "development".to_string(),
            search: SearchConfig::default(),
            llm: LlmConfig::default(),
            budgets: Budgets::default(),
            clarify_table_path: None,
            share_answers: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("ASK_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(env) = lookup("ASK_ENVIRONMENT") {
            config.environment = env;
        }

        if let Some(url) = lookup("SEARCH_BASE_URL") {
            config.search.base_url = url;
        }
        if let Some(key) = non_empty(lookup("SEARCH_API_KEY")) {
            config.search.api_key = Some(key);
        }
        if let Some(v) = parse(lookup("ASK_SEARCH_LIMIT")) {
            config.search.limit = v;
        }

        if let Some(provider) = lookup("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Some(url) = lookup("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Some(model) = lookup("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Some(key) = non_empty(lookup("LLM_API_KEY")) {
            config.llm.api_key = Some(key);
        }
        if let Some(v) = parse(lookup("LLM_MAX_TOKENS")) {
            config.llm.max_tokens = v;
        }

        if let Some(v) = parse(lookup("ASK_DEADLINE_MS")) {
            config.budgets.deadline_ms = v;
        }
        if let Some(v) = parse(lookup("ASK_SEARCH_BUDGET_MS")) {
            config.budgets.search_ms = v;
        }
        if let Some(v) = parse(lookup("ASK_DOCUMENT_BUDGET_MS")) {
            config.budgets.document_ms = v;
        }
        if let Some(v) = parse(lookup("ASK_CLARIFY_BUDGET_MS")) {
            config.budgets.clarify_ms = v;
        }

        if let Some(path) = non_empty(lookup("ASK_CLARIFY_TABLE")) {
            config.clarify_table_path = Some(PathBuf::from(path));
        }

        if let Some(v) = parse(lookup("ASK_SHARE_ANSWERS")) {
            config.share_answers = v;
        }

        config
    }

    pub fn has_search_key(&self) -> bool {
        self.search.api_key.is_some()
    }

    pub fn has_model_key(&self) -> bool {
        self.llm.api_key.is_some()
    }

    /// Load the clarify table from `clarify_table_path`, or the built-in one.
    pub fn clarify_table(&self) -> anyhow::Result<ClarifyTable> {
        let Some(path) = &self.clarify_table_path else {
            return Ok(ClarifyTable::default());
        };
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read clarify table {}", path.display()))?;
        let table: ClarifyTable = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse clarify table {}", path.display()))?;
        table
            .validate()
            .with_context(|| format!("Invalid clarify table {}", path.display()))?;
        Ok(table)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}
