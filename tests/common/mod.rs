#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;

use ask_responder::backend::{BackendError, DocumentBackend, DocumentFetcher, SearchClient};
use ask_responder::clarify::{Clarifier, ClarifyTable};
use ask_responder::config::Budgets;
use ask_responder::llm::CompletionBackend;
use ask_responder::models::{Document, SearchHit};
use ask_responder::responder::Responder;

/// What the fake document backend does on `search`.
#[derive(Clone)]
pub enum SearchBehaviour {
    Hits(Vec<SearchHit>),
    Fail,
    Hang,
}

/// In-memory document backend that records every call.
pub struct FakeBackend {
    pub search: SearchBehaviour,
    pub document: Option<Document>,
    pub panic_on_get: bool,
    pub search_calls: AtomicUsize,
    pub get_calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new(search: SearchBehaviour, document: Option<Document>) -> Arc<Self> {
        Arc::new(Self {
            search,
            document,
            panic_on_get: false,
            search_calls: AtomicUsize::new(0),
            get_calls: Mutex::new(Vec::new()),
        })
    }

    pub fn panicking(hits: Vec<SearchHit>) -> Arc<Self> {
        Arc::new(Self {
            search: SearchBehaviour::Hits(hits),
            document: None,
            panic_on_get: true,
            search_calls: AtomicUsize::new(0),
            get_calls: Mutex::new(Vec::new()),
        })
    }

    pub fn search_count(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn fetched_ids(&self) -> Vec<String> {
        self.get_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentBackend for FakeBackend {
    async fn search(&self, _query: &str, limit: usize) -> Result<Vec<SearchHit>, BackendError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        match &self.search {
            SearchBehaviour::Hits(hits) => Ok(hits.iter().take(limit).cloned().collect()),
            SearchBehaviour::Fail => Err(BackendError::Status {
                status: 503,
                body: "unavailable".into(),
            }),
            SearchBehaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn get(&self, id: &str) -> Result<Option<Document>, BackendError> {
        self.get_calls.lock().unwrap().push(id.to_string());
        if self.panic_on_get {
            panic!("document store exploded");
        }
        Ok(self.document.clone())
    }
}

/// Model fake returning a fixed reply and counting calls.
pub struct FakeLlm {
    pub reply: String,
    pub calls: AtomicUsize,
}

impl FakeLlm {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionBackend for FakeLlm {
    async fn complete(&self, _system: &str, _user: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// Model fake that answers only after `delay`, counting calls.
pub struct SleepyLlm {
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl SleepyLlm {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionBackend for SleepyLlm {
    async fn complete(&self, _system: &str, _user: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(GROUNDED_CLARIFICATION.to_string())
    }
}

/// A model reply that passes the clarifier's grounding check for the default table.
pub const GROUNDED_CLARIFICATION: &str = "Which lead source do you mean?\n\
    1. Zillow Premier Agent leads\n\
    2. Realtor.com leads\n\
    3. Open house sign-ins\n\
    4. Expired and FSBO listings";

pub fn hit(id: &str) -> SearchHit {
    SearchHit {
        note_id: id.to_string(),
        title: None,
    }
}

pub fn sop_document() -> Document {
    Document {
        id: "abc".into(),
        title: Some("SOP: Leads".into()),
        body: Some("Step one...   Step two".into()),
    }
}

pub fn responder(
    backend: Arc<FakeBackend>,
    llm: Option<Arc<dyn CompletionBackend>>,
) -> Responder {
    let budgets = Budgets::default();
    Responder::new(
        SearchClient::new(backend.clone(), 3, budgets.search()),
        DocumentFetcher::new(backend, budgets.document()),
        Clarifier::new(llm, Arc::new(ClarifyTable::default()), budgets.clarify()),
        budgets.deadline(),
    )
}

/// Serve `app` on an ephemeral loopback port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}
