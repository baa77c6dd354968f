//! The decision core: one query in, exactly one [`Reply`] out.
//!
//! ```text
//!   text ──▶ validate ──empty──▶ usage reply
//!               │
//!               ▼
//!            classify ──generic──────────────┐
//!               │ specific                   │
//!               ▼                            ▼
//!            search ──no hits/failure──▶ clarify ──▶ clarifier reply
//!               │ hits
//!               ▼
//!          fetch top hit ──▶ "top match" reply with excerpt
//! ```
//!
//! Backend failures fold into "no data" inside the clients. Anything that
//! still escapes (a panic in a backend implementation) is caught here and
//! turned into the error reply, so the transport always gets an answer.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::FutureExt;

use crate::backend::{DocumentFetcher, SearchClient};
use crate::clarify::Clarifier;
use crate::deadline::RequestDeadline;
use crate::models::{Classification, Document, Query, Reply, Visibility};

pub const USAGE_TEXT: &str = "Usage: /ask your question";
/// Maximum excerpt length in characters, before the ellipsis.
pub const EXCERPT_CHARS: usize = 280;
pub const ELLIPSIS: &str = "…";
const DEFAULT_TITLE: &str = "Document";
const NARROW_PROMPT: &str = "Not quite it? Ask again with more detail to narrow it down.";

/// Which branch produced a reply. Logged per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Path {
    Usage,
    Clarify,
    Answer,
    Error,
}

impl Path {
    pub fn as_str(self) -> &'static str {
        match self {
            Path::Usage => "usage",
            Path::Clarify => "clarify",
            Path::Answer => "answer",
            Path::Error => "error",
        }
    }
}

/// Stateless across requests; every collaborator is injected.
#[derive(Clone)]
pub struct Responder {
    search: SearchClient,
    documents: DocumentFetcher,
    clarifier: Clarifier,
    deadline: Duration,
    answer_visibility: Visibility,
}

impl Responder {
    pub fn new(
        search: SearchClient,
        documents: DocumentFetcher,
        clarifier: Clarifier,
        deadline: Duration,
    ) -> Self {
        Self {
            search,
            documents,
            clarifier,
            deadline,
            answer_visibility: Visibility::Private,
        }
    }

    /// Scope for "top match" replies. Usage, clarification and error replies
    /// always stay private.
    pub fn with_answer_visibility(mut self, visibility: Visibility) -> Self {
        self.answer_visibility = visibility;
        self
    }

    pub async fn respond(&self, text: &str) -> Reply {
        self.respond_with_path(text).await.0
    }

    pub async fn respond_with_path(&self, text: &str) -> (Reply, Path) {
        match AssertUnwindSafe(self.run(text)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let description = panic_description(panic.as_ref());
                tracing::error!("Responder failed: {description}");
                (error_reply(&description), Path::Error)
            }
        }
    }

    async fn run(&self, text: &str) -> (Reply, Path) {
        let Some(query) = Query::parse(text) else {
            return (Reply::private(USAGE_TEXT), Path::Usage);
        };
        let deadline = RequestDeadline::starting_now(self.deadline);

        if self.clarifier.table().classify(&query) == Classification::Generic {
            tracing::info!("Generic query, asking for clarification");
            return (self.clarify(&query, &deadline).await, Path::Clarify);
        }

        let hits = self.search.search(&query, &deadline).await;
        let Some(top) = hits.first() else {
            tracing::info!("No search hits, asking for clarification");
            return (self.clarify(&query, &deadline).await, Path::Clarify);
        };

        tracing::info!(hits = hits.len(), top = %top.note_id, "Answering from top hit");
        let document = self.documents.get(&top.note_id, &deadline).await;
        let fallback_title = top.title.as_deref();
        let mut reply = answer_reply(document.as_ref(), fallback_title);
        reply.visibility = self.answer_visibility;
        (reply, Path::Answer)
    }

    async fn clarify(&self, query: &Query, deadline: &RequestDeadline) -> Reply {
        Reply::private(self.clarifier.clarify(query, deadline).await)
    }
}

/// Format the "top match" reply. The title comes from the document, then the
/// search hit, then [`DEFAULT_TITLE`].
pub fn answer_reply(document: Option<&Document>, hit_title: Option<&str>) -> Reply {
    let title = document
        .and_then(|d| d.title.as_deref())
        .or(hit_title)
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let excerpt = document
        .and_then(|d| d.body.as_deref())
        .map(excerpt)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| "(No preview available.)".to_string());

    Reply::private(format!("*Top match:* {title}\n{excerpt}\n\n{NARROW_PROMPT}"))
}

pub fn error_reply(description: &str) -> Reply {
    Reply::private(format!("Something went wrong: {description}"))
}

/// Collapse whitespace runs to single spaces and cut to [`EXCERPT_CHARS`],
/// appending [`ELLIPSIS`] when anything was cut.
pub fn excerpt(body: &str) -> String {
    let collapsed = collapse_whitespace(body);
    if collapsed.chars().count() <= EXCERPT_CHARS {
        return collapsed;
    }
    let cut: String = collapsed.chars().take(EXCERPT_CHARS).collect();
    format!("{}{ELLIPSIS}", cut.trim_end())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn panic_description(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected internal failure".to_string()
    }
}
