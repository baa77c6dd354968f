use async_trait::async_trait;

use super::{BackendError, DocumentBackend};
use crate::models::{Document, SearchHit};

/// Tries `primary`, and only when it reports the variant as not implemented,
/// repeats the call against `secondary`. Every other outcome of the primary,
/// success or failure, is returned as is.
pub struct FallbackBackend<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> FallbackBackend<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl<P, S> DocumentBackend for FallbackBackend<P, S>
where
    P: DocumentBackend,
    S: DocumentBackend,
{
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, BackendError> {
        match self.primary.search(query, limit).await {
            Err(e) if e.is_not_implemented() => {
                tracing::debug!("Primary search variant unsupported ({e}), trying secondary");
                self.secondary.search(query, limit).await
            }
            other => other,
        }
    }

    async fn get(&self, id: &str) -> Result<Option<Document>, BackendError> {
        match self.primary.get(id).await {
            Err(e) if e.is_not_implemented() => {
                tracing::debug!("Primary document variant unsupported ({e}), trying secondary");
                self.secondary.get(id).await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Copy)]
    enum Behaviour {
        Hits,
        NotImplemented,
        ServerError,
    }

    struct Scripted {
        behaviour: Behaviour,
        calls: Arc<AtomicUsize>,
        label: &'static str,
    }

    impl Scripted {
        fn new(behaviour: Behaviour, label: &'static str) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    behaviour,
                    calls: calls.clone(),
                    label,
                },
                calls,
            )
        }

        fn outcome<T>(&self, ok: T) -> Result<T, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Hits => Ok(ok),
                Behaviour::NotImplemented => Err(BackendError::NotImplemented(self.label.into())),
                Behaviour::ServerError => Err(BackendError::Status {
                    status: 500,
                    body: "down".into(),
                }),
            }
        }
    }

    #[async_trait]
    impl DocumentBackend for Scripted {
        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchHit>, BackendError> {
            self.outcome(vec![SearchHit {
                note_id: self.label.to_string(),
                title: None,
            }])
        }

        async fn get(&self, id: &str) -> Result<Option<Document>, BackendError> {
            self.outcome(Some(Document {
                id: id.to_string(),
                title: Some(self.label.to_string()),
                body: None,
            }))
        }
    }

    #[tokio::test]
    async fn test_primary_success_skips_secondary() {
        let (primary, _) = Scripted::new(Behaviour::Hits, "v2");
        let (secondary, secondary_calls) = Scripted::new(Behaviour::Hits, "v1");
        let backend = FallbackBackend::new(primary, secondary);

        let hits = backend.search("q", 3).await.unwrap();
        assert_eq!(hits[0].note_id, "v2");
        assert_eq!(secondary_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_not_implemented_falls_back() {
        let (primary, _) = Scripted::new(Behaviour::NotImplemented, "v2");
        let (secondary, _) = Scripted::new(Behaviour::Hits, "v1");
        let backend = FallbackBackend::new(primary, secondary);

        let hits = backend.search("q", 3).await.unwrap();
        assert_eq!(hits[0].note_id, "v1");
        let doc = backend.get("abc").await.unwrap().unwrap();
        assert_eq!(doc.title.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_other_errors_do_not_fall_back() {
        let (primary, _) = Scripted::new(Behaviour::ServerError, "v2");
        let (secondary, secondary_calls) = Scripted::new(Behaviour::Hits, "v1");
        let backend = FallbackBackend::new(primary, secondary);

        let err = backend.search("q", 3).await.unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 500, .. }));
        assert_eq!(secondary_calls.load(Ordering::SeqCst), 0);
    }
}
