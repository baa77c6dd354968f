//! Document-search backend: the trait the responder depends on, the HTTP
//! implementation for each endpoint variant, and the failure-absorbing
//! clients the responder actually calls.

pub mod client;
pub mod fallback;
pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Document, SearchHit};

pub use client::{DocumentFetcher, SearchClient};
pub use fallback::FallbackBackend;
pub use http::{ApiVariant, HttpDocumentApi};

#[derive(Debug, Error)]
pub enum BackendError {
    /// The endpoint variant is not served by this backend version.
    #[error("endpoint not implemented: {0}")]
    NotImplemented(String),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("search credential is not configured")]
    MissingCredential,

    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
}

impl BackendError {
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, BackendError::NotImplemented(_))
    }
}

/// Raw document API. Implementations report every failure; the absorbing
/// policy lives in [`SearchClient`] and [`DocumentFetcher`].
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, BackendError>;

    /// `Ok(None)` means the backend answered and has no such document.
    async fn get(&self, id: &str) -> Result<Option<Document>, BackendError>;
}
