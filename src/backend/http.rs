use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

use super::{BackendError, DocumentBackend};
use crate::models::{Document, SearchHit};

/// Which generation of the document API a client speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVariant {
    /// `POST /v2/notes/search`, `GET /v2/notes/{id}`
    Current,
    /// `GET /v1/search?query=&limit=`, `GET /v1/notes/{id}`
    Legacy,
}

impl ApiVariant {
    fn version(self) -> &'static str {
        match self {
            ApiVariant::Current => "v2",
            ApiVariant::Legacy => "v1",
        }
    }
}

/// HTTP client for one [`ApiVariant`] of the document API.
#[derive(Clone)]
pub struct HttpDocumentApi {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    variant: ApiVariant,
}

impl HttpDocumentApi {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        variant: ApiVariant,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
            variant,
        }
    }

    fn api_key(&self) -> Result<&str, BackendError> {
        self.api_key
            .as_deref()
            .ok_or(BackendError::MissingCredential)
    }

    fn url(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| BackendError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push(self.variant.version())
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let resp = req.bearer_auth(self.api_key()?).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        if is_unsupported(status) {
            return Err(BackendError::NotImplemented(format!(
                "{} answered {status}",
                self.variant.version()
            )));
        }
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Statuses a backend uses to say "this endpoint generation doesn't exist here".
fn is_unsupported(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
    )
}

#[async_trait]
impl DocumentBackend for HttpDocumentApi {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, BackendError> {
        let req = match self.variant {
            ApiVariant::Current => self
                .client
                .post(self.url(&["notes", "search"])?)
                .json(&SearchRequest { query, limit }),
            ApiVariant::Legacy => self
                .client
                .get(self.url(&["search"])?)
                .query(&[("query", query.to_string()), ("limit", limit.to_string())]),
        };

        let resp = self.send(req).await?;
        let envelope: SearchEnvelope = resp
            .json()
            .await
            .map_err(|e| BackendError::Decode(format!("search response: {e}")))?;
        let mut hits = envelope.into_hits();
        hits.retain(|h| !h.note_id.is_empty());
        hits.truncate(limit);
        Ok(hits)
    }

    async fn get(&self, id: &str) -> Result<Option<Document>, BackendError> {
        let req = self.client.get(self.url(&["notes", id])?);
        let resp = self.send(req).await?;
        let envelope: NoteEnvelope = resp
            .json()
            .await
            .map_err(|e| BackendError::Decode(format!("note response: {e}")))?;
        let note = envelope.into_note();

        Ok(Some(Document {
            id: note.id.unwrap_or_else(|| id.to_string()),
            title: note.title.filter(|t| !t.trim().is_empty()),
            body: note.content.and_then(NoteContent::into_text),
        }))
    }
}

// ─── Wire types ──────────────────────────────────────────

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    limit: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SearchEnvelope {
    Wrapped {
        #[serde(alias = "items", alias = "notes")]
        results: Vec<SearchHit>,
    },
    Bare(Vec<SearchHit>),
}

impl SearchEnvelope {
    fn into_hits(self) -> Vec<SearchHit> {
        match self {
            SearchEnvelope::Wrapped { results } => results,
            SearchEnvelope::Bare(hits) => hits,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NoteEnvelope {
    Wrapped { note: Note },
    Bare(Note),
}

impl NoteEnvelope {
    fn into_note(self) -> Note {
        match self {
            NoteEnvelope::Wrapped { note } => note,
            NoteEnvelope::Bare(note) => note,
        }
    }
}

#[derive(Deserialize)]
struct Note {
    #[serde(default, alias = "noteId")]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<NoteContent>,
}

/// Note bodies arrive as plain text, as `{ "text": ... }`, or as rich-text
/// blocks. Only the text is kept.
#[derive(Deserialize)]
#[serde(untagged)]
enum NoteContent {
    Plain(String),
    Structured {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        blocks: Vec<Block>,
    },
}

#[derive(Deserialize)]
struct Block {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    children: Vec<Block>,
}

impl Block {
    fn collect_text(&self, out: &mut Vec<String>) {
        if let Some(text) = &self.text {
            out.push(text.clone());
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

impl NoteContent {
    fn into_text(self) -> Option<String> {
        let text = match self {
            NoteContent::Plain(text) => text,
            NoteContent::Structured { text: Some(text), .. } if !text.trim().is_empty() => text,
            NoteContent::Structured { blocks, .. } => {
                let mut parts = Vec::new();
                for block in &blocks {
                    block.collect_text(&mut parts);
                }
                parts.join(" ")
            }
        };
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(json: &str) -> Option<String> {
        serde_json::from_str::<NoteContent>(json).unwrap().into_text()
    }

    #[test]
    fn test_plain_content() {
        assert_eq!(content(r#""hello""#).as_deref(), Some("hello"));
    }

    #[test]
    fn test_text_content() {
        assert_eq!(
            content(r#"{"text": "Step one...   Step two"}"#).as_deref(),
            Some("Step one...   Step two")
        );
    }

    #[test]
    fn test_rich_text_blocks_are_flattened() {
        let json = r#"{"blocks": [
            {"type": "heading", "text": "Intro"},
            {"type": "list", "children": [{"text": "one"}, {"text": "two"}]},
            {"type": "image", "url": "x.png"}
        ]}"#;
        assert_eq!(content(json).as_deref(), Some("Intro one two"));
    }

    #[test]
    fn test_empty_content_is_absent() {
        assert_eq!(content(r#""   ""#), None);
        assert_eq!(content(r#"{"blocks": []}"#), None);
    }

    #[test]
    fn test_search_envelopes() {
        let wrapped: SearchEnvelope =
            serde_json::from_str(r#"{"results": [{"noteId": "a"}, {"noteId": "b"}]}"#).unwrap();
        assert_eq!(wrapped.into_hits().len(), 2);

        let items: SearchEnvelope = serde_json::from_str(r#"{"items": [{"id": "a"}]}"#).unwrap();
        assert_eq!(items.into_hits()[0].note_id, "a");

        let bare: SearchEnvelope = serde_json::from_str(r#"[{"noteId": "c"}]"#).unwrap();
        assert_eq!(bare.into_hits()[0].note_id, "c");
    }

    #[test]
    fn test_note_envelopes() {
        let wrapped: NoteEnvelope =
            serde_json::from_str(r#"{"note": {"title": "SOP", "content": "x"}}"#).unwrap();
        assert_eq!(wrapped.into_note().title.as_deref(), Some("SOP"));

        let bare: NoteEnvelope = serde_json::from_str(r#"{"noteId": "n1"}"#).unwrap();
        assert_eq!(bare.into_note().id.as_deref(), Some("n1"));
    }

    #[test]
    fn test_url_building_encodes_ids() {
        let api = HttpDocumentApi::new(
            reqwest::Client::new(),
            "http://docs.local/api/",
            Some("k".into()),
            ApiVariant::Current,
        );
        let url = api.url(&["notes", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://docs.local/api/v2/notes/a%20b%2Fc");
    }

    #[test]
    fn test_unsupported_statuses() {
        assert!(is_unsupported(StatusCode::NOT_FOUND));
        assert!(is_unsupported(StatusCode::NOT_IMPLEMENTED));
        assert!(!is_unsupported(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_unsupported(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_sending() {
        let api = HttpDocumentApi::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9",
            None,
            ApiVariant::Legacy,
        );
        let err = api.search("q", 3).await.unwrap_err();
        assert!(matches!(err, BackendError::MissingCredential));
    }
}
