//! Fake service ports and fixtures shared by the handler flow tests.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::http::HeaderMap;
use brushbot::config::{GlobalConfig, ModelConfig};
use brushbot::dedup::{DedupOutcome, DedupStore};
use brushbot::model::ImageModel;
use brushbot::slack::client::ReplyPoster;
use brushbot::slack::signature;
use brushbot::state::AppState;
use brushbot::storage::ImageStore;
use brushbot::{AppError, Result};

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const NOW: i64 = 1_700_000_000;
pub const FAKE_IMAGE_URL: &str = "https://images.example.com/images/fixed.png";

pub fn test_config() -> GlobalConfig {
    GlobalConfig {
        http_port: 3000,
        bind_address: "127.0.0.1".into(),
        dedup_table: "brushbot-dedup".into(),
        image_bucket: "brushbot-images".into(),
        cdn_domain: "images.example.com".into(),
        slack_token_secret_id: "brushbot/slack-token".into(),
        signing_secret_id: "brushbot/signing-secret".into(),
        signature_tolerance_seconds: 300,
        dedup_retention_days: 30,
        model: ModelConfig::default(),
        bot_token: "xoxb-test".into(),
        signing_secret: SIGNING_SECRET.into(),
    }
}

#[derive(Default)]
pub struct FakeDedup {
    pub seen: Mutex<HashSet<String>>,
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl DedupStore for FakeDedup {
    fn reserve(
        &self,
        client_msg_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<DedupOutcome>> + Send + '_>> {
        let id = client_msg_id.to_owned();
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::Dedup("table unavailable".into()));
            }
            let mut seen = self.seen.lock().unwrap();
            if seen.insert(id) {
                Ok(DedupOutcome::Inserted)
            } else {
                Ok(DedupOutcome::AlreadyExists)
            }
        })
    }
}

#[derive(Default)]
pub struct FakeModel {
    pub prompts: Mutex<Vec<String>>,
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl ImageModel for FakeModel {
    fn generate(&self, prompt: &str) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + '_>> {
        let prompt = prompt.to_owned();
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::Model("model unavailable".into()));
            }
            self.prompts.lock().unwrap().push(prompt);
            Ok(vec![0x89, b'P', b'N', b'G'])
        })
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl ImageStore for FakeStore {
    fn store_png(
        &self,
        _data: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::Storage("bucket unavailable".into()));
            }
            Ok(FAKE_IMAGE_URL.to_owned())
        })
    }
}

#[derive(Default)]
pub struct FakePoster {
    pub bodies: Mutex<Vec<serde_json::Value>>,
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl ReplyPoster for FakePoster {
    fn post_reply(
        &self,
        body: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::Slack("connection reset".into()));
            }
            self.bodies.lock().unwrap().push(body);
            Ok(())
        })
    }
}

/// Flags controlling which fake ports fail.
#[derive(Default, Clone, Copy)]
pub struct Failures {
    pub dedup: bool,
    pub model: bool,
    pub store: bool,
    pub post: bool,
}

pub struct Fixture {
    pub state: AppState,
    pub dedup: Arc<FakeDedup>,
    pub model: Arc<FakeModel>,
    pub store: Arc<FakeStore>,
    pub poster: Arc<FakePoster>,
}

pub fn fixture() -> Fixture {
    fixture_with(Failures::default())
}

pub fn fixture_with(failures: Failures) -> Fixture {
    let dedup = Arc::new(FakeDedup {
        fail: failures.dedup,
        ..FakeDedup::default()
    });
    let model = Arc::new(FakeModel {
        fail: failures.model,
        ..FakeModel::default()
    });
    let store = Arc::new(FakeStore {
        fail: failures.store,
        ..FakeStore::default()
    });
    let poster = Arc::new(FakePoster {
        fail: failures.post,
        ..FakePoster::default()
    });

    let state = AppState {
        config: Arc::new(test_config()),
        dedup: Arc::clone(&dedup) as Arc<dyn DedupStore>,
        model: Arc::clone(&model) as Arc<dyn ImageModel>,
        store: Arc::clone(&store) as Arc<dyn ImageStore>,
        slack: Arc::clone(&poster) as Arc<dyn ReplyPoster>,
    };

    Fixture {
        state,
        dedup,
        model,
        store,
        poster,
    }
}

/// Headers carrying a valid signature for `body` at [`NOW`].
pub fn signed_headers(body: &[u8]) -> HeaderMap {
    headers_at(body, NOW)
}

/// Headers carrying a signature computed over `body` at time `ts`.
pub fn headers_at(body: &[u8], ts: i64) -> HeaderMap {
    let timestamp = ts.to_string();
    let sig = signature::sign(SIGNING_SECRET, &timestamp, body);

    let mut headers = HeaderMap::new();
    headers.insert("x-slack-request-timestamp", timestamp.parse().unwrap());
    headers.insert("x-slack-signature", sig.parse().unwrap());
    headers
}

/// A message event body with the given text and dedup key.
pub fn message_body(text: &str, client_msg_id: &str) -> Vec<u8> {
    serde_json::json!({
        "type": "event_callback",
        "event": {
            "type": "app_mention",
            "text": text,
            "user": "U123",
            "channel": "C456",
            "client_msg_id": client_msg_id,
        }
    })
    .to_string()
    .into_bytes()
}
