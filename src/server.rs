//! The webhook handler: authenticate, deduplicate, and fulfill one
//! inbound Slack event per request.

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::dedup::DedupOutcome;
use crate::slack::{blocks, event, signature};
use crate::state::AppState;
use crate::{AppError, Result};

/// User-facing degraded-mode reply used in place of an image URL.
pub const APOLOGY_REPLY: &str = "Sorry, I'm having trouble processing your request right now.";

const SIGNATURE_HEADER: &str = "x-slack-signature";
const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Outcome of processing one webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookReply {
    /// Handshake: echo the challenge token verbatim.
    Challenge(String),
    /// Message fulfilled and reply posted.
    Handled,
    /// Duplicate delivery acknowledged without side effects.
    Duplicate,
    /// Authentic but unusable traffic acknowledged without side effects.
    Ignored,
    /// Signature or timestamp verification failed.
    Unauthorized,
    /// Hard failure surfaced to the caller.
    Failed(String),
}

impl WebhookReply {
    /// HTTP status code for this outcome.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Challenge(_) | Self::Handled | Self::Duplicate | Self::Ignored => StatusCode::OK,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Response body for this outcome.
    #[must_use]
    pub fn body(&self) -> String {
        match self {
            Self::Challenge(challenge) => challenge.clone(),
            Self::Handled => json!({"msg": "message received"}).to_string(),
            Self::Duplicate => json!("Event already processed").to_string(),
            Self::Ignored => json!({"msg": "event ignored"}).to_string(),
            Self::Unauthorized => json!({"error": "Invalid Slack signature"}).to_string(),
            Self::Failed(msg) => json!({"error": msg}).to_string(),
        }
    }
}

impl IntoResponse for WebhookReply {
    fn into_response(self) -> Response {
        (self.status(), self.body()).into_response()
    }
}

/// Build the application router.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/slack/events", post(handle_events))
        .route("/health", get(health))
        .with_state(state)
}

/// Handler for `GET /health` — returns 200 OK with a plain-text body.
async fn health() -> &'static str {
    "ok"
}

async fn handle_events(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> WebhookReply {
    process_event(&state, &headers, &body, Utc::now().timestamp()).await
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

/// Process one webhook delivery against server time `now`.
///
/// Steps, in order: timestamp freshness + signature verification,
/// handshake short-circuit, dedup reserve, fulfillment. Each request is
/// independent; the dedup store's conditional write is the only shared
/// state touched.
pub async fn process_event(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
    now: i64,
) -> WebhookReply {
    let timestamp = header_str(headers, TIMESTAMP_HEADER);
    let sig = header_str(headers, SIGNATURE_HEADER);

    if !signature::timestamp_fresh(timestamp, now, state.config.signature_tolerance_seconds) {
        warn!(timestamp, "rejected request: stale or missing timestamp");
        return WebhookReply::Unauthorized;
    }
    if !signature::verify(&state.config.signing_secret, timestamp, sig, body) {
        warn!("rejected request: invalid slack signature");
        return WebhookReply::Unauthorized;
    }

    match event::InboundEvent::from_slice(body) {
        event::InboundEvent::Handshake { challenge } => {
            info!("answering url_verification handshake");
            WebhookReply::Challenge(challenge)
        }
        event::InboundEvent::Message(message) => handle_message(state, message).await,
        event::InboundEvent::Other => {
            warn!("authentic event without a usable message payload; acknowledged");
            WebhookReply::Ignored
        }
    }
}

async fn handle_message(state: &AppState, message: event::InboundMessage) -> WebhookReply {
    match state.dedup.reserve(&message.client_msg_id).await {
        Ok(DedupOutcome::AlreadyExists) => {
            info!(
                client_msg_id = %message.client_msg_id,
                "duplicate delivery acknowledged"
            );
            WebhookReply::Duplicate
        }
        Err(err) => {
            // No record was written; the platform redelivers on 5xx.
            error!(%err, "dedup reserve failed");
            WebhookReply::Failed("Deduplication store unavailable".into())
        }
        Ok(DedupOutcome::Inserted) => fulfill(state, &message).await,
    }
}

async fn fulfill(state: &AppState, message: &event::InboundMessage) -> WebhookReply {
    let prompt = event::extract_prompt(&message.text);
    info!(
        channel = %message.channel,
        user = %message.user,
        "fulfilling image request"
    );

    let image_url = generate_and_store(state, prompt).await;
    let reply = blocks::reply_body(&message.channel, &message.user, &image_url);

    match state.slack.post_reply(reply).await {
        Ok(()) => WebhookReply::Handled,
        Err(err) => {
            error!(%err, "failed to post reply");
            WebhookReply::Failed("Error sending message to Slack".into())
        }
    }
}

/// Generate an image for `prompt` and persist it, returning the public URL.
///
/// Soft-degrades: any model or upload failure yields [`APOLOGY_REPLY`] in
/// place of a URL so the reply is still posted. No retry.
pub async fn generate_and_store(state: &AppState, prompt: &str) -> String {
    let image = match state.model.generate(prompt).await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(%err, "image generation failed");
            return APOLOGY_REPLY.to_owned();
        }
    };

    match state.store.store_png(image).await {
        Ok(url) => url,
        Err(err) => {
            error!(%err, "image upload failed");
            APOLOGY_REPLY.to_owned()
        }
    }
}

/// Serve the webhook until `shutdown` resolves.
///
/// # Errors
///
/// Returns `AppError::Config` if the listener fails to bind, or
/// `AppError::Config` wrapping the server error on abnormal exit.
pub async fn serve<F>(state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!(
        "{}:{}",
        state.config.bind_address, state.config.http_port
    );
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind on {addr}: {err}")))?;

    info!(%addr, "slack events webhook listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|err| AppError::Config(format!("server error: {err}")))?;

    info!("webhook server shut down");
    Ok(())
}
