use axum::extract::{FromRequest, Request, State};
use axum::http::{header, StatusCode};
use axum::{Form, Json};
use tracing::Instrument;
use uuid::Uuid;

use crate::delivery::deliver;
use crate::models::{Query, Reply, SlashCommand};
use crate::responder::USAGE_TEXT;
use crate::state::AppState;

/// Immediate acknowledgment for the deferred route.
pub const ACK_TEXT: &str = "Searching…";

/// Slash-command body, form-encoded (platform default) or JSON.
pub struct SlashPayload(pub SlashCommand);

impl<S> FromRequest<S> for SlashPayload
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"));

        if is_json {
            let Json(cmd) = Json::<SlashCommand>::from_request(req, state)
                .await
                .map_err(|e| (e.status(), e.body_text()))?;
            Ok(Self(cmd))
        } else {
            let Form(cmd) = Form::<SlashCommand>::from_request(req, state)
                .await
                .map_err(|e| (e.status(), e.body_text()))?;
            Ok(Self(cmd))
        }
    }
}

fn request_span(cmd: &SlashCommand) -> tracing::Span {
    tracing::info_span!(
        "ask",
        request_id = %Uuid::new_v4(),
        user = cmd.user_id.as_deref().unwrap_or("-")
    )
}

/// POST /slack/ask - Answer inside the platform's response window.
pub async fn ask(State(state): State<AppState>, SlashPayload(cmd): SlashPayload) -> Json<Reply> {
    let span = request_span(&cmd);
    let (reply, path) = state
        .responder
        .respond_with_path(&cmd.text)
        .instrument(span.clone())
        .await;
    span.in_scope(|| tracing::info!(path = path.as_str(), "Replied inline"));
    Json(reply)
}

/// POST /slack/ask/deferred - Acknowledge now, deliver the answer to
/// `response_url` when it is ready.
pub async fn ask_deferred(
    State(state): State<AppState>,
    SlashPayload(cmd): SlashPayload,
) -> Json<Reply> {
    if Query::parse(&cmd.text).is_none() {
        return Json(Reply::private(USAGE_TEXT));
    }

    let span = request_span(&cmd);
    tokio::spawn(
        async move {
            let (reply, path) = state.responder.respond_with_path(&cmd.text).await;
            let Some(url) = cmd.response_url.as_deref() else {
                tracing::info!(path = path.as_str(), "No response_url; skipping delivery");
                return;
            };
            match deliver(&state.http_client, url, &reply).await {
                Ok(()) => tracing::info!(path = path.as_str(), "Delivered deferred reply"),
                Err(e) => tracing::error!("Failed to deliver deferred reply: {e:#}"),
            }
        }
        .instrument(span),
    );

    Json(Reply::private(ACK_TEXT))
}
