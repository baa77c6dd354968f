use std::sync::Arc;
use std::time::Duration;

use super::DocumentBackend;
use crate::deadline::{Bounded, RequestDeadline};
use crate::models::{Document, Query, SearchHit};

/// Search facade used by the responder. Never fails: timeouts and backend
/// errors read as "no hits".
#[derive(Clone)]
pub struct SearchClient {
    backend: Arc<dyn DocumentBackend>,
    limit: usize,
    budget: Duration,
}

impl SearchClient {
    pub fn new(backend: Arc<dyn DocumentBackend>, limit: usize, budget: Duration) -> Self {
        Self {
            backend,
            limit: limit.max(1),
            budget,
        }
    }

    pub async fn search(&self, query: &Query, deadline: &RequestDeadline) -> Vec<SearchHit> {
        let call = self.backend.search(query.as_str(), self.limit);
        match deadline.run(self.budget, call).await {
            Bounded::Completed(Ok(mut hits)) => {
                hits.truncate(self.limit);
                hits
            }
            Bounded::Completed(Err(e)) => {
                tracing::warn!("Search failed, treating as no hits: {e}");
                Vec::new()
            }
            Bounded::TimedOut => {
                tracing::warn!("Search timed out, treating as no hits");
                Vec::new()
            }
        }
    }
}

/// Single-document facade. `None` covers not-found, timeout and error alike.
#[derive(Clone)]
pub struct DocumentFetcher {
    backend: Arc<dyn DocumentBackend>,
    budget: Duration,
}

impl DocumentFetcher {
    pub fn new(backend: Arc<dyn DocumentBackend>, budget: Duration) -> Self {
        Self { backend, budget }
    }

    pub async fn get(&self, id: &str, deadline: &RequestDeadline) -> Option<Document> {
        match deadline.run(self.budget, self.backend.get(id)).await {
            Bounded::Completed(Ok(doc)) => doc,
            Bounded::Completed(Err(e)) => {
                tracing::warn!("Fetching document {id} failed: {e}");
                None
            }
            Bounded::TimedOut => {
                tracing::warn!("Fetching document {id} timed out");
                None
            }
        }
    }
}
