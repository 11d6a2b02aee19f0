//! Outbound Slack API client for posting replies.

use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::{AppError, Result};

/// Slack message-post endpoint.
pub const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Port for delivering a reply to the chat platform.
///
/// Only transport failure is an error; the platform's own HTTP status in
/// the response is not inspected.
pub trait ReplyPoster: Send + Sync {
    /// Post a `chat.postMessage` body.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Slack`](crate::AppError::Slack) when the request
    /// cannot be delivered.
    fn post_reply(
        &self,
        body: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Bearer-token-authenticated HTTP implementation of [`ReplyPoster`].
pub struct SlackHttpClient {
    http: reqwest::Client,
    bot_token: String,
    api_url: String,
}

impl SlackHttpClient {
    /// Create a client posting to the real Slack API.
    #[must_use]
    pub fn new(bot_token: String) -> Self {
        Self::with_api_url(bot_token, POST_MESSAGE_URL.to_owned())
    }

    /// Create a client posting to an alternate endpoint (tests).
    #[must_use]
    pub fn with_api_url(bot_token: String, api_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token,
            api_url,
        }
    }
}

impl ReplyPoster for SlackHttpClient {
    fn post_reply(
        &self,
        body: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.http
                .post(&self.api_url)
                .bearer_auth(&self.bot_token)
                .json(&body)
                .send()
                .await
                .map_err(|err| {
                    AppError::Slack(format!("chat.postMessage delivery failed: {err}"))
                })?;
            debug!("reply posted");
            Ok(())
        })
    }
}
