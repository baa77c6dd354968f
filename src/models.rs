use serde::{Deserialize, Serialize};

/// Inbound slash-command payload. The platform sends it form-encoded; test
/// harnesses and proxies may send the same fields as JSON.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlashCommand {
    #[serde(default)]
    pub text: String,
    /// One-time callback reference for deferred delivery
    pub response_url: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub command: Option<String>,
}

/// Free-text question, trimmed. Construction fails on empty input so no
/// backend ever sees an empty query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Generic,
    Specific,
}

/// A candidate document reference, in backend rank order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "noteId", alias = "id", alias = "note_id")]
    pub note_id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// A fetched document. Lives only for the request that fetched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    /// Visible only to the requester
    #[serde(rename = "ephemeral")]
    Private,
    /// Visible to the whole channel
    #[serde(rename = "in_channel")]
    Channel,
}

/// The single outbound payload for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(rename = "response_type")]
    pub visibility: Visibility,
    pub text: String,
}

impl Reply {
    pub fn private(text: impl Into<String>) -> Self {
        Self {
            visibility: Visibility::Private,
            text: text.into(),
        }
    }
}

/// Health check response: reports which secrets are present, never their values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub has_model_key: bool,
    pub has_search_key: bool,
    pub environment_name: String,
}
